//! Inputs of the send pipeline

use serde_json::Value;

use crate::template::Params;
use crate::transport::Attachment;

/// A request to email one trigger's template to a recipient.
///
/// Envelope fields override or extend what the template configures.
#[derive(Debug, Clone, Default)]
pub struct SendInput {
    pub trigger_code: String,
    /// One address or a comma-separated list
    pub recipient: String,
    /// Falls back to the service default when absent or empty
    pub language: Option<String>,
    pub params: Params,

    /// Appended after the template's cc list
    pub cc: Vec<String>,
    /// Appended after the template's bcc list
    pub bcc: Vec<String>,
    /// Replaces the template's reply-to
    pub reply_to: Option<String>,
    /// Replaces the transport's default sender
    pub from: Option<String>,
    pub from_name: Option<String>,
    /// Replaces the template subject; rendered like it
    pub subject: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl SendInput {
    pub fn new(trigger_code: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self {
            trigger_code: trigger_code.into(),
            recipient: recipient.into(),
            ..Default::default()
        }
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    pub fn cc(mut self, address: impl Into<String>) -> Self {
        self.cc.push(address.into());
        self
    }

    pub fn bcc(mut self, address: impl Into<String>) -> Self {
        self.bcc.push(address.into());
        self
    }

    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }

    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.from = Some(address.into());
        self
    }

    pub fn from_name(mut self, name: impl Into<String>) -> Self {
        self.from_name = Some(name.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub(crate) fn requested_language(&self) -> Option<&str> {
        self.language.as_deref().map(str::trim).filter(|l| !l.is_empty())
    }
}
