//! Transport that only logs outgoing mail.

use async_trait::async_trait;

use super::{MailTransport, OutboundEmail, TransportError};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

impl LogTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<(), TransportError> {
        tracing::info!(
            to = ?email.to,
            cc = ?email.cc,
            bcc = ?email.bcc,
            subject = %email.subject,
            attachments = email.attachments.len(),
            "Email not delivered (log transport)"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
