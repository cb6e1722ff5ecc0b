//! Email template entity and its inputs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::transport::split_addresses;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStatus {
    #[default]
    Draft,
    Enabled,
    Disabled,
}

impl TemplateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateStatus::Draft => "draft",
            TemplateStatus::Enabled => "enabled",
            TemplateStatus::Disabled => "disabled",
        }
    }
}

impl fmt::Display for TemplateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(TemplateStatus::Draft),
            "enabled" => Ok(TemplateStatus::Enabled),
            "disabled" => Ok(TemplateStatus::Disabled),
            other => Err(format!("unknown template status: {}", other)),
        }
    }
}

/// A language-specific email template bound to a trigger.
///
/// Identity is the `(trigger_code, language)` pair among live rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: i64,
    pub trigger_code: String,
    pub language: String,
    pub name: String,
    pub subject: String,
    pub body_html: String,
    /// Plain-text alternative; empty when the template has none
    #[serde(default)]
    pub body_text: String,
    pub status: TemplateStatus,
    /// Comma-separated address list
    #[serde(default)]
    pub cc: String,
    /// Comma-separated address list
    #[serde(default)]
    pub bcc: String,
    #[serde(default)]
    pub reply_to: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete tombstone
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Template {
    pub fn is_enabled(&self) -> bool {
        self.status == TemplateStatus::Enabled
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn has_text_body(&self) -> bool {
        !self.body_text.is_empty()
    }

    pub fn cc_list(&self) -> Vec<String> {
        split_addresses(&self.cc)
    }

    pub fn bcc_list(&self) -> Vec<String> {
        split_addresses(&self.bcc)
    }

    pub fn reply_to(&self) -> Option<&str> {
        Some(self.reply_to.as_str()).filter(|r| !r.is_empty())
    }
}

/// Request to create a template.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTemplateInput {
    pub trigger_code: String,

    /// Defaults to the service's default language
    #[serde(default)]
    pub language: String,

    pub name: String,
    pub subject: String,
    pub body_html: String,

    #[serde(default)]
    pub body_text: String,

    /// Defaults to `draft`
    #[serde(default)]
    pub status: Option<TemplateStatus>,

    #[serde(default)]
    pub cc: String,

    #[serde(default)]
    pub bcc: String,

    #[serde(default)]
    pub reply_to: String,
}

/// A validated template ready to be persisted; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTemplate {
    pub trigger_code: String,
    pub language: String,
    pub name: String,
    pub subject: String,
    pub body_html: String,
    pub body_text: String,
    pub status: TemplateStatus,
    pub cc: String,
    pub bcc: String,
    pub reply_to: String,
}

/// Partial update: absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTemplateInput {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub body_html: Option<String>,
    pub body_text: Option<String>,
    pub status: Option<TemplateStatus>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub reply_to: Option<String>,
}

impl UpdateTemplateInput {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.subject.is_none()
            && self.body_html.is_none()
            && self.body_text.is_none()
            && self.status.is_none()
            && self.cc.is_none()
            && self.bcc.is_none()
            && self.reply_to.is_none()
    }

    /// Copy every present field onto `template`.
    pub fn apply_to(self, template: &mut Template) {
        if let Some(name) = self.name {
            template.name = name;
        }
        if let Some(subject) = self.subject {
            template.subject = subject;
        }
        if let Some(body_html) = self.body_html {
            template.body_html = body_html;
        }
        if let Some(body_text) = self.body_text {
            template.body_text = body_text;
        }
        if let Some(status) = self.status {
            template.status = status;
        }
        if let Some(cc) = self.cc {
            template.cc = cc;
        }
        if let Some(bcc) = self.bcc {
            template.bcc = bcc;
        }
        if let Some(reply_to) = self.reply_to {
            template.reply_to = reply_to;
        }
    }
}

/// Filters for listing templates. Empty strings are treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateFilter {
    pub trigger_code: Option<String>,
    pub language: Option<String>,
    pub status: Option<TemplateStatus>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl TemplateFilter {
    pub fn trigger_code(&self) -> Option<&str> {
        self.trigger_code.as_deref().filter(|s| !s.is_empty())
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref().filter(|s| !s.is_empty())
    }

    /// Whether a live template passes every filter.
    pub fn matches(&self, template: &Template) -> bool {
        self.trigger_code().map_or(true, |c| template.trigger_code == c)
            && self.language().map_or(true, |l| template.language == l)
            && self.status.map_or(true, |s| template.status == s)
    }
}

/// Rendered subject and bodies, returned by previews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewResult {
    pub subject: String,
    pub body_html: String,
    pub body_text: String,
}
