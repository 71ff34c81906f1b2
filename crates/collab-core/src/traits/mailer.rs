use async_trait::async_trait;

use super::repositories::RepoResult;

/// Outbound email delivery
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a confirmation code to `email`
    async fn send_confirmation_code(&self, email: &str, code: &str) -> RepoResult<()>;
}
