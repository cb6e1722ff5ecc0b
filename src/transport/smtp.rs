//! SMTP delivery using lettre.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{
    Attachment as MimeAttachment, Mailbox, MessageBuilder, MultiPart, SinglePart,
};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{MailTransport, OutboundEmail, TransportError};
use crate::config::{MailConfig, MailTlsMode};

/// SMTP transport with a default sender.
#[derive(Clone)]
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Address,
    from_name: Option<String>,
}

impl SmtpTransport {
    pub fn from_config(config: &MailConfig) -> Result<Self, TransportError> {
        if config.host.is_empty() {
            return Err(TransportError::Config("mail.host is required".to_string()));
        }

        let from = parse_address(&config.from)?;

        let mut builder = match config.tls {
            MailTlsMode::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            }
            MailTlsMode::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| TransportError::Config(e.to_string()))?,
            MailTlsMode::Starttls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(|e| TransportError::Config(e.to_string()))?
            }
        };

        builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_seconds)));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        tracing::info!(
            host = %config.host,
            port = config.port,
            tls = ?config.tls,
            "SMTP transport configured"
        );

        Ok(Self {
            transport: builder.build(),
            from,
            from_name: Some(config.from_name.clone()).filter(|n| !n.is_empty()),
        })
    }

    fn sender(&self, email: &OutboundEmail) -> Result<Mailbox, TransportError> {
        let address = match email.from.as_deref().filter(|f| !f.is_empty()) {
            Some(from) => parse_address(from)?,
            None => self.from.clone(),
        };
        let name = email
            .from_name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| self.from_name.clone());
        Ok(Mailbox::new(name, address))
    }

    fn build_message(&self, email: &OutboundEmail) -> Result<Message, TransportError> {
        let mut builder = Message::builder()
            .from(self.sender(email)?)
            .subject(email.subject.as_str());

        for to in &email.to {
            builder = builder.to(parse_mailbox(to)?);
        }
        for cc in &email.cc {
            builder = builder.cc(parse_mailbox(cc)?);
        }
        for bcc in &email.bcc {
            builder = builder.bcc(parse_mailbox(bcc)?);
        }
        if let Some(reply_to) = email.reply_to.as_deref().filter(|r| !r.is_empty()) {
            builder = builder.reply_to(parse_mailbox(reply_to)?);
        }

        compose_body(builder, email)
    }
}

/// html only: one html part; html + text: alternative; attachments: mixed around the body.
fn compose_body(builder: MessageBuilder, email: &OutboundEmail) -> Result<Message, TransportError> {
    let built = if email.attachments.is_empty() {
        match &email.text_body {
            Some(text) => builder.multipart(MultiPart::alternative_plain_html(
                text.clone(),
                email.html_body.clone(),
            )),
            None => builder.singlepart(SinglePart::html(email.html_body.clone())),
        }
    } else {
        let mut mixed = match &email.text_body {
            Some(text) => MultiPart::mixed().multipart(MultiPart::alternative_plain_html(
                text.clone(),
                email.html_body.clone(),
            )),
            None => MultiPart::mixed().singlepart(SinglePart::html(email.html_body.clone())),
        };

        for attachment in &email.attachments {
            let content_type = ContentType::parse(&attachment.content_type).map_err(|_| {
                TransportError::Build(format!(
                    "invalid content type for {}: {}",
                    attachment.filename, attachment.content_type
                ))
            })?;
            mixed = mixed.singlepart(
                MimeAttachment::new(attachment.filename.clone())
                    .body(attachment.content.clone(), content_type),
            );
        }

        builder.multipart(mixed)
    };

    built.map_err(|e| TransportError::Build(e.to_string()))
}

fn parse_address(address: &str) -> Result<Address, TransportError> {
    address
        .trim()
        .parse()
        .map_err(|_| TransportError::InvalidAddress(address.to_string()))
}

fn parse_mailbox(address: &str) -> Result<Mailbox, TransportError> {
    address
        .trim()
        .parse()
        .map_err(|_| TransportError::InvalidAddress(address.to_string()))
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<(), TransportError> {
        let message = self.build_message(email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| TransportError::Smtp(e.to_string()))?;

        tracing::debug!(recipients = email.to.len(), "Email handed to SMTP relay");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
