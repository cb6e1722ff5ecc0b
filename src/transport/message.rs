//! Outbound email message and its builder.

use super::TransportError;

/// Split a comma-separated address list, trimming entries and dropping empty ones.
pub fn split_addresses(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .map(str::to_string)
        .collect()
}

/// A file attached to an outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
    /// MIME type, e.g. `application/pdf`
    pub content_type: String,
}

impl Attachment {
    pub fn new(
        filename: impl Into<String>,
        content: Vec<u8>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content,
            content_type: content_type.into(),
        }
    }
}

/// A fully composed email handed to a [`MailTransport`](super::MailTransport).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub html_body: String,
    /// Plain-text alternative, if any
    pub text_body: Option<String>,
    /// Overrides the transport's default sender
    pub from: Option<String>,
    pub from_name: Option<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub reply_to: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl OutboundEmail {
    pub fn builder() -> OutboundEmailBuilder {
        OutboundEmailBuilder::default()
    }
}

/// Builder for [`OutboundEmail`].
///
/// `to`, `cc` and `bcc` may be called repeatedly and accept comma-separated lists.
#[derive(Debug, Default)]
pub struct OutboundEmailBuilder {
    email: OutboundEmail,
}

impl OutboundEmailBuilder {
    pub fn to(mut self, recipients: &str) -> Self {
        self.email.to.extend(split_addresses(recipients));
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.email.subject = subject.into();
        self
    }

    pub fn html_body(mut self, html: impl Into<String>) -> Self {
        self.email.html_body = html.into();
        self
    }

    pub fn text_body(mut self, text: impl Into<String>) -> Self {
        self.email.text_body = Some(text.into());
        self
    }

    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.email.from = Some(from.into());
        self
    }

    pub fn from_name(mut self, name: impl Into<String>) -> Self {
        self.email.from_name = Some(name.into());
        self
    }

    pub fn cc(mut self, addresses: &str) -> Self {
        self.email.cc.extend(split_addresses(addresses));
        self
    }

    pub fn bcc(mut self, addresses: &str) -> Self {
        self.email.bcc.extend(split_addresses(addresses));
        self
    }

    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.email.reply_to = Some(address.into());
        self
    }

    pub fn attach(
        mut self,
        filename: impl Into<String>,
        content: Vec<u8>,
        content_type: impl Into<String>,
    ) -> Self {
        self.email
            .attachments
            .push(Attachment::new(filename, content, content_type));
        self
    }

    pub fn build(self) -> Result<OutboundEmail, TransportError> {
        if self.email.to.is_empty() {
            return Err(TransportError::Build("message has no recipients".to_string()));
        }
        Ok(self.email)
    }
}
