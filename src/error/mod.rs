use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::template::RenderError;
use crate::transport::TransportError;

/// Stable, machine-readable classification of a [`NotificationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TriggerNotFound,
    TemplateNotFound,
    SendLogNotFound,
    TemplateExists,
    TemplateDisabled,
    RenderFailed,
    NoRecipient,
    InvalidInput,
    SendFailed,
    Database,
    NotImplemented,
    ServiceUnavailable,
}

impl ErrorKind {
    /// Code relayed to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::TriggerNotFound => "TRIGGER_NOT_FOUND",
            ErrorKind::TemplateNotFound => "TEMPLATE_NOT_FOUND",
            ErrorKind::SendLogNotFound => "SEND_LOG_NOT_FOUND",
            ErrorKind::TemplateExists => "TEMPLATE_EXISTS",
            ErrorKind::TemplateDisabled => "TEMPLATE_DISABLED",
            ErrorKind::RenderFailed => "RENDER_FAILED",
            ErrorKind::NoRecipient => "NO_RECIPIENT",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::SendFailed => "SEND_FAILED",
            ErrorKind::Database => "DATABASE_ERROR",
            ErrorKind::NotImplemented => "NOT_IMPLEMENTED",
            ErrorKind::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }

    /// HTTP status hint for the API layer.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::TriggerNotFound
            | ErrorKind::TemplateNotFound
            | ErrorKind::SendLogNotFound => StatusCode::NOT_FOUND,
            ErrorKind::TemplateExists
            | ErrorKind::TemplateDisabled
            | ErrorKind::NoRecipient
            | ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::RenderFailed | ErrorKind::SendFailed | ErrorKind::Database => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ErrorKind::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Trigger not found: {0}")]
    TriggerNotFound(String),

    #[error("Email template not found: {0}")]
    TemplateNotFound(String),

    #[error("Send log not found: {0}")]
    SendLogNotFound(i64),

    #[error("Template already exists for trigger '{trigger_code}' and language '{language}'")]
    TemplateExists {
        trigger_code: String,
        language: String,
    },

    #[error("Email template {0} is disabled")]
    TemplateDisabled(i64),

    #[error("Template render failed: {0}")]
    RenderFailed(#[from] RenderError),

    #[error("Recipient must not be empty")]
    NoRecipient,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Email send failed: {0}")]
    SendFailed(#[source] TransportError),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Service not available: {0}")]
    ServiceUnavailable(String),
}

impl NotificationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NotificationError::TriggerNotFound(_) => ErrorKind::TriggerNotFound,
            NotificationError::TemplateNotFound(_) => ErrorKind::TemplateNotFound,
            NotificationError::SendLogNotFound(_) => ErrorKind::SendLogNotFound,
            NotificationError::TemplateExists { .. } => ErrorKind::TemplateExists,
            NotificationError::TemplateDisabled(_) => ErrorKind::TemplateDisabled,
            NotificationError::RenderFailed(_) => ErrorKind::RenderFailed,
            NotificationError::NoRecipient => ErrorKind::NoRecipient,
            NotificationError::InvalidInput(_) => ErrorKind::InvalidInput,
            NotificationError::SendFailed(_) => ErrorKind::SendFailed,
            NotificationError::Database(_) => ErrorKind::Database,
            NotificationError::NotImplemented(_) => ErrorKind::NotImplemented,
            NotificationError::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind().status() == StatusCode::NOT_FOUND
    }
}

impl From<sqlx::Error> for NotificationError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                NotificationError::ServiceUnavailable(err.to_string())
            }
            other => NotificationError::Database(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

impl IntoResponse for NotificationError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = kind.status();
        let log_message = self.to_string();

        let client_message = if status.is_server_error() && is_production() {
            match kind {
                ErrorKind::Database => "Database operation failed".to_string(),
                ErrorKind::SendFailed => "Email send failed".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            log_message.clone()
        };

        if status.is_server_error() {
            tracing::error!(
                code = %kind.code(),
                status = %status.as_u16(),
                message = %log_message,
                "API error"
            );
        } else {
            tracing::debug!(
                code = %kind.code(),
                status = %status.as_u16(),
                message = %log_message,
                "API request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: kind.code().to_string(),
                message: client_message,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, NotificationError>;
