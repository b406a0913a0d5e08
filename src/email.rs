//! Email capability. The console implementation logs instead of sending,
//! which is all the invite flow needs outside production.

use async_trait::async_trait;
use tracing::info;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct InviteEmail {
    pub to: String,
    pub pool_title: String,
    pub invite_url: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_invite_email(&self, email: InviteEmail) -> Result<(), AppError>;
}

pub struct ConsoleMailer;

#[async_trait]
impl EmailSender for ConsoleMailer {
    async fn send_invite_email(&self, email: InviteEmail) -> Result<(), AppError> {
        info!(
            to = %email.to,
            pool = %email.pool_title,
            url = %email.invite_url,
            "Mock invite email sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_mailer_never_fails() {
        let mailer = ConsoleMailer;
        let result = mailer
            .send_invite_email(InviteEmail {
                to: "demo@vaquita.local".into(),
                pool_title: "Asado fund".into(),
                invite_url: "token".into(),
            })
            .await;
        assert!(result.is_ok());
    }
}
