use rand::Rng;

/// Random decimal code of `digits` digits, zero-padded
#[must_use]
pub fn generate_numeric_code(digits: u32) -> String {
    let upper = 10u64.pow(digits);
    let value = rand::thread_rng().gen_range(0..upper);
    format!("{value:0width$}", width = digits as usize)
}
