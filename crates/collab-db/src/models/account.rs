use sqlx::FromRow;

/// Login-relevant columns of the accounts table
#[derive(Debug, Clone, FromRow)]
pub struct AccountCredentialsModel {
    pub id: i64,
    pub password_hash: String,
    pub email_verified: bool,
}
