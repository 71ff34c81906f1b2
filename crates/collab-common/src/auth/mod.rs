//! Authentication utilities

mod code;
mod jwt;
mod password;

pub use code::generate_numeric_code;
pub use jwt::{Claims, TokenKind, TokenSigner};
pub use password::{hash_password, verify_password};
