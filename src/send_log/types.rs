//! Send log entity and query filter

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{NotificationError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    #[default]
    Pending,
    Sent,
    Failed,
}

impl SendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendStatus::Pending => "pending",
            SendStatus::Sent => "sent",
            SendStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SendStatus::Pending)
    }
}

impl fmt::Display for SendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SendStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SendStatus::Pending),
            "sent" => Ok(SendStatus::Sent),
            "failed" => Ok(SendStatus::Failed),
            other => Err(format!("unknown send status: {}", other)),
        }
    }
}

/// One delivery attempt.
///
/// Created `pending` before the transport call and moved to `sent` or `failed` once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendLog {
    pub id: i64,
    pub template_id: Option<i64>,
    pub trigger_code: String,
    pub language: String,
    pub recipient: String,
    /// Rendered subject
    pub subject: String,
    /// Snapshot of the merged parameters
    pub params: Value,
    pub status: SendStatus,
    #[serde(default)]
    pub error_message: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SendLog {
    pub fn mark_sent(&mut self) {
        self.status = SendStatus::Sent;
        self.sent_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = SendStatus::Failed;
        self.error_message = error.into();
    }
}

/// A pending log entry before persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSendLog {
    pub template_id: Option<i64>,
    pub trigger_code: String,
    pub language: String,
    pub recipient: String,
    pub subject: String,
    pub params: Value,
}

/// Filters for listing send logs.
///
/// `start_time` / `end_time` are RFC 3339 timestamps bounding `created_at` inclusively.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogFilter {
    pub trigger_code: Option<String>,
    pub status: Option<SendStatus>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Parsed time bounds of a [`LogFilter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| at >= s) && self.end.map_or(true, |e| at <= e)
    }
}

impl LogFilter {
    pub fn trigger_code(&self) -> Option<&str> {
        self.trigger_code.as_deref().filter(|s| !s.is_empty())
    }

    pub fn time_range(&self) -> Result<TimeRange> {
        Ok(TimeRange {
            start: parse_bound("start_time", self.start_time.as_deref())?,
            end: parse_bound("end_time", self.end_time.as_deref())?,
        })
    }

    pub fn matches(&self, log: &SendLog, range: &TimeRange) -> bool {
        self.trigger_code().map_or(true, |c| log.trigger_code == c)
            && self.status.map_or(true, |s| log.status == s)
            && range.contains(log.created_at)
    }
}

fn parse_bound(field: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| {
                NotificationError::InvalidInput(format!("{} must be RFC 3339: {}", field, e))
            }),
    }
}
