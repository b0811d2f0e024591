//! services/api/src/adapters/notifier.rs
//!
//! Password-reset delivery. No mail transport is configured, so the token is
//! written to the debug log for an operator to forward.

use async_trait::async_trait;
use study_assistant_core::ports::{PasswordResetNotifier, PortResult};
use tracing::{debug, info};

#[derive(Clone, Default)]
pub struct LogResetNotifier;

#[async_trait]
impl PasswordResetNotifier for LogResetNotifier {
    async fn send_reset(&self, email: &str, token: &str) -> PortResult<()> {
        info!(email, "Password reset requested");
        debug!(email, token, "Password reset token issued");
        Ok(())
    }
}
