/// 메일 발송
/// `Mailer` 트레이트 하나로 SMTP / Noop 구현체를 교체한다.
/// 인스턴스는 main에서 한 번 만들어 Arc로 공유한다.
// region:    --- Imports
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

mod noop;
mod smtp;
pub mod templates;

pub use noop::NoopMailer;
pub use smtp::SmtpMailer;

// endregion: --- Imports

// region:    --- Mail Model
/// 발송할 텍스트 메일
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("transport error: {0}")]
    Transport(String),
}
// endregion: --- Mail Model

// region:    --- Mailer Trait
/// 메일 발송 트레이트
///
/// 호출마다 실패가 독립적이며, 동시에 여러 태스크에서 호출될 수 있다.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}
// endregion: --- Mailer Trait
