//! Mailer used when no outbound email provider is configured

use async_trait::async_trait;
use collab_core::{Mailer, RepoResult};
use tracing::info;

/// Development mailer: delivery is a log line on the `mailer` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMailer;

#[async_trait]
impl Mailer for LoggingMailer {
    async fn send_confirmation_code(&self, email: &str, code: &str) -> RepoResult<()> {
        info!(target: "mailer", %email, %code, "Confirmation code");
        Ok(())
    }
}
