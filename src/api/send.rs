//! Send endpoints.

use axum::{extract::State, Json};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::{NotificationError, Result};
use crate::server::AppState;
use crate::service::SendInput;
use crate::template::Params;
use crate::transport::Attachment;

/// JSON body of `POST /api/v1/send`.
#[derive(Debug, Default, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub trigger_code: String,
    /// One address or a comma-separated list
    #[serde(default)]
    pub recipient: String,
    pub language: Option<String>,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub bcc: Vec<String>,
    pub reply_to: Option<String>,
    pub from: Option<String>,
    pub from_name: Option<String>,
    pub subject: Option<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRequest>,
}

#[derive(Debug, Deserialize)]
pub struct AttachmentRequest {
    pub filename: String,
    /// Base64 (standard alphabet, padded)
    pub content: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_content_type() -> String {
    "application/octet-stream".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

impl TryFrom<SendRequest> for SendInput {
    type Error = NotificationError;

    fn try_from(request: SendRequest) -> Result<Self> {
        let attachments = request
            .attachments
            .into_iter()
            .map(|a| {
                let content = STANDARD.decode(a.content.as_bytes()).map_err(|e| {
                    NotificationError::InvalidInput(format!(
                        "attachment {} is not valid base64: {}",
                        a.filename, e
                    ))
                })?;
                Ok(Attachment::new(a.filename, content, a.content_type))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SendInput {
            trigger_code: request.trigger_code,
            recipient: request.recipient,
            language: request.language,
            params: request.params,
            cc: request.cc,
            bcc: request.bcc,
            reply_to: request.reply_to,
            from: request.from,
            from_name: request.from_name,
            subject: request.subject,
            attachments,
        })
    }
}

/// POST /api/v1/send - render and deliver synchronously
#[tracing::instrument(
    name = "http.send_email",
    skip(state, request),
    fields(trigger_code = %request.trigger_code)
)]
pub async fn send_email(
    State(state): State<AppState>,
    Json(request): Json<SendRequest>,
) -> Result<Json<SuccessResponse>> {
    let input = SendInput::try_from(request)?;
    state.service.send(input).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/v1/send/async - reserved
#[tracing::instrument(name = "http.send_email_async", skip(state, request))]
pub async fn send_email_async(
    State(state): State<AppState>,
    Json(request): Json<SendRequest>,
) -> Result<Json<SuccessResponse>> {
    let input = SendInput::try_from(request)?;
    state.service.send_async(input).await?;
    Ok(Json(SuccessResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_decodes_attachments() {
        let request: SendRequest = serde_json::from_value(serde_json::json!({
            "trigger_code": "user:registered",
            "recipient": "alice@example.com",
            "params": { "UserName": "Alice" },
            "attachments": [{ "filename": "a.txt", "content": "aGVsbG8=" }]
        }))
        .unwrap();

        let input = SendInput::try_from(request).unwrap();
        assert_eq!(input.attachments[0].content, b"hello");
        assert_eq!(input.attachments[0].content_type, "application/octet-stream");
        assert_eq!(input.params["UserName"], "Alice");
    }

    #[test]
    fn test_request_rejects_bad_base64() {
        let request = SendRequest {
            trigger_code: "user:registered".to_string(),
            recipient: "alice@example.com".to_string(),
            attachments: vec![AttachmentRequest {
                filename: "a.txt".to_string(),
                content: "%%%".to_string(),
                content_type: default_content_type(),
            }],
            ..Default::default()
        };

        assert!(matches!(
            SendInput::try_from(request),
            Err(NotificationError::InvalidInput(_))
        ));
    }
}
