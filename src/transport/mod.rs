//! Outbound mail transports.
//!
//! - [`SmtpTransport`]: delivery through an SMTP relay
//! - [`LogTransport`]: logs each message and delivers nothing, for development

mod log;
mod message;
mod smtp;

pub use log::LogTransport;
pub use message::{split_addresses, Attachment, OutboundEmail, OutboundEmailBuilder};
pub use smtp::SmtpTransport;

use async_trait::async_trait;
use thiserror::Error;

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("Transport configuration error: {0}")]
    Config(String),
}

/// Delivers a composed email.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), TransportError>;

    /// Short name for logs and health reporting
    fn name(&self) -> &'static str;
}
