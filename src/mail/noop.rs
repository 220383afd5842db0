use super::{EmailMessage, MailError, Mailer};
use async_trait::async_trait;
use tracing::info;

/// 실제로 보내지 않고 로그만 남긴다
#[derive(Debug, Clone, Default)]
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        info!(
            "{:<12} --> Noop 메일 발송 생략: to={}, subject={}",
            "Mail", message.to, message.subject
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_send_always_succeeds() {
        let message = EmailMessage {
            from: "noreply@example.com".to_string(),
            to: "anyone@example.com".to_string(),
            subject: "subject".to_string(),
            body: "body".to_string(),
        };
        assert!(NoopMailer.send(&message).await.is_ok());
    }
}
