//! PostgreSQL-backed send log storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};

use super::store::SendLogRepository;
use super::types::{LogFilter, NewSendLog, SendLog, SendStatus};
use crate::error::{NotificationError, Result};
use crate::pagination::{PageRequest, PageResult};

const LOG_COLUMNS: &str = "id, template_id, trigger_code, language, recipient, subject, params, \
     status, error_message, sent_at, created_at";

#[derive(Debug, FromRow)]
struct SendLogRow {
    id: i64,
    template_id: Option<i64>,
    trigger_code: String,
    language: String,
    recipient: String,
    subject: String,
    params: Value,
    status: String,
    error_message: String,
    sent_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SendLogRow> for SendLog {
    type Error = NotificationError;

    fn try_from(row: SendLogRow) -> Result<Self> {
        let status = row
            .status
            .parse::<SendStatus>()
            .map_err(|e| NotificationError::Database(sqlx::Error::Decode(e.into())))?;

        Ok(SendLog {
            id: row.id,
            template_id: row.template_id,
            trigger_code: row.trigger_code,
            language: row.language,
            recipient: row.recipient,
            subject: row.subject,
            params: row.params,
            status,
            error_message: row.error_message,
            sent_at: row.sent_at,
            created_at: row.created_at,
        })
    }
}

/// PostgreSQL send log repository.
pub struct PgSendLogRepository {
    pool: PgPool,
}

impl PgSendLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SendLogRepository for PgSendLogRepository {
    async fn create(&self, log: NewSendLog) -> Result<SendLog> {
        let row: SendLogRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO email_send_logs
                (template_id, trigger_code, language, recipient, subject, params, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            LOG_COLUMNS
        ))
        .bind(log.template_id)
        .bind(&log.trigger_code)
        .bind(&log.language)
        .bind(&log.recipient)
        .bind(&log.subject)
        .bind(&log.params)
        .bind(SendStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn update(&self, log: &SendLog) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE email_send_logs
            SET status = $2, error_message = $3, sent_at = $4
            WHERE id = $1
            "#,
        )
        .bind(log.id)
        .bind(log.status.as_str())
        .bind(&log.error_message)
        .bind(log.sent_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(NotificationError::SendLogNotFound(log.id));
        }
        Ok(())
    }

    async fn get_by_id(&self, id: i64) -> Result<SendLog> {
        let row: Option<SendLogRow> = sqlx::query_as(&format!(
            "SELECT {} FROM email_send_logs WHERE id = $1",
            LOG_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(NotificationError::SendLogNotFound(id))?
            .try_into()
    }

    async fn list(&self, filter: &LogFilter) -> Result<PageResult<SendLog>> {
        let range = filter.time_range()?;
        let request = PageRequest::new(filter.page, filter.page_size);
        let status = filter.status.map(|s| s.as_str());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM email_send_logs
            WHERE ($1::TEXT IS NULL OR trigger_code = $1)
              AND ($2::TEXT IS NULL OR status = $2)
              AND ($3::TIMESTAMPTZ IS NULL OR created_at >= $3)
              AND ($4::TIMESTAMPTZ IS NULL OR created_at <= $4)
            "#,
        )
        .bind(filter.trigger_code())
        .bind(status)
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await?;

        let rows: Vec<SendLogRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM email_send_logs
            WHERE ($1::TEXT IS NULL OR trigger_code = $1)
              AND ($2::TEXT IS NULL OR status = $2)
              AND ($3::TIMESTAMPTZ IS NULL OR created_at >= $3)
              AND ($4::TIMESTAMPTZ IS NULL OR created_at <= $4)
            ORDER BY created_at DESC, id DESC
            OFFSET $5 LIMIT $6
            "#,
            LOG_COLUMNS
        ))
        .bind(filter.trigger_code())
        .bind(status)
        .bind(range.start)
        .bind(range.end)
        .bind(request.offset())
        .bind(request.limit())
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(SendLog::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(PageResult::new(items, total, request))
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
