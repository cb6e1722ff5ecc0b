//! PostgreSQL-backed template storage.
//!
//! Table: `email_templates`, soft-deleted through `deleted_at`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::store::TemplateRepository;
use super::types::{NewTemplate, Template, TemplateFilter, TemplateStatus};
use crate::error::{NotificationError, Result};
use crate::pagination::{PageRequest, PageResult};

const TEMPLATE_COLUMNS: &str = "id, trigger_code, language, name, subject, body_html, body_text, \
     status, cc, bcc, reply_to, created_at, updated_at, deleted_at";

#[derive(Debug, FromRow)]
struct TemplateRow {
    id: i64,
    trigger_code: String,
    language: String,
    name: String,
    subject: String,
    body_html: String,
    body_text: String,
    status: String,
    cc: String,
    bcc: String,
    reply_to: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<TemplateRow> for Template {
    type Error = NotificationError;

    fn try_from(row: TemplateRow) -> Result<Self> {
        let status = row
            .status
            .parse::<TemplateStatus>()
            .map_err(|e| NotificationError::Database(sqlx::Error::Decode(e.into())))?;

        Ok(Template {
            id: row.id,
            trigger_code: row.trigger_code,
            language: row.language,
            name: row.name,
            subject: row.subject,
            body_html: row.body_html,
            body_text: row.body_text,
            status,
            cc: row.cc,
            bcc: row.bcc,
            reply_to: row.reply_to,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

/// PostgreSQL template repository.
pub struct PgTemplateRepository {
    pool: PgPool,
}

impl PgTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateRepository for PgTemplateRepository {
    async fn create(&self, template: NewTemplate) -> Result<Template> {
        let row: TemplateRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO email_templates
                (trigger_code, language, name, subject, body_html, body_text, status, cc, bcc, reply_to)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            TEMPLATE_COLUMNS
        ))
        .bind(&template.trigger_code)
        .bind(&template.language)
        .bind(&template.name)
        .bind(&template.subject)
        .bind(&template.body_html)
        .bind(&template.body_text)
        .bind(template.status.as_str())
        .bind(&template.cc)
        .bind(&template.bcc)
        .bind(&template.reply_to)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(
            template_id = row.id,
            trigger_code = %row.trigger_code,
            language = %row.language,
            "Email template inserted"
        );

        row.try_into()
    }

    async fn update(&self, template: &Template) -> Result<Template> {
        let row: Option<TemplateRow> = sqlx::query_as(&format!(
            r#"
            UPDATE email_templates
            SET name = $2, subject = $3, body_html = $4, body_text = $5, status = $6,
                cc = $7, bcc = $8, reply_to = $9, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            TEMPLATE_COLUMNS
        ))
        .bind(template.id)
        .bind(&template.name)
        .bind(&template.subject)
        .bind(&template.body_html)
        .bind(&template.body_text)
        .bind(template.status.as_str())
        .bind(&template.cc)
        .bind(&template.bcc)
        .bind(&template.reply_to)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| NotificationError::TemplateNotFound(template.id.to_string()))?
            .try_into()
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query(
            "UPDATE email_templates SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(NotificationError::TemplateNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn get_by_id(&self, id: i64) -> Result<Template> {
        let row: Option<TemplateRow> = sqlx::query_as(&format!(
            "SELECT {} FROM email_templates WHERE id = $1 AND deleted_at IS NULL",
            TEMPLATE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| NotificationError::TemplateNotFound(id.to_string()))?
            .try_into()
    }

    async fn get_active_template(&self, trigger_code: &str, language: &str) -> Result<Template> {
        let row: Option<TemplateRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM email_templates
            WHERE trigger_code = $1 AND language = $2 AND status = $3 AND deleted_at IS NULL
            ORDER BY id ASC
            LIMIT 1
            "#,
            TEMPLATE_COLUMNS
        ))
        .bind(trigger_code)
        .bind(language)
        .bind(TemplateStatus::Enabled.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| {
            NotificationError::TemplateNotFound(format!("{} ({})", trigger_code, language))
        })?
        .try_into()
    }

    async fn list(&self, filter: &TemplateFilter) -> Result<PageResult<Template>> {
        let request = PageRequest::new(filter.page, filter.page_size);
        let status = filter.status.map(|s| s.as_str());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM email_templates
            WHERE deleted_at IS NULL
              AND ($1::TEXT IS NULL OR trigger_code = $1)
              AND ($2::TEXT IS NULL OR language = $2)
              AND ($3::TEXT IS NULL OR status = $3)
            "#,
        )
        .bind(filter.trigger_code())
        .bind(filter.language())
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows: Vec<TemplateRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM email_templates
            WHERE deleted_at IS NULL
              AND ($1::TEXT IS NULL OR trigger_code = $1)
              AND ($2::TEXT IS NULL OR language = $2)
              AND ($3::TEXT IS NULL OR status = $3)
            ORDER BY created_at DESC, id DESC
            OFFSET $4 LIMIT $5
            "#,
            TEMPLATE_COLUMNS
        ))
        .bind(filter.trigger_code())
        .bind(filter.language())
        .bind(status)
        .bind(request.offset())
        .bind(request.limit())
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(Template::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(PageResult::new(items, total, request))
    }

    async fn exists_by_trigger_and_language(
        &self,
        trigger_code: &str,
        language: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM email_templates
                WHERE trigger_code = $1 AND language = $2 AND deleted_at IS NULL
                  AND ($3::BIGINT IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(trigger_code)
        .bind(language)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> TemplateRow {
        let now = Utc::now();
        TemplateRow {
            id: 9,
            trigger_code: "user:registered".to_string(),
            language: "zh-CN".to_string(),
            name: "Welcome".to_string(),
            subject: "Hi".to_string(),
            body_html: "<p>Hi</p>".to_string(),
            body_text: String::new(),
            status: status.to_string(),
            cc: String::new(),
            bcc: String::new(),
            reply_to: String::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_row_conversion() {
        let template = Template::try_from(row("enabled")).unwrap();
        assert_eq!(template.id, 9);
        assert!(template.is_enabled());
    }

    #[test]
    fn test_row_with_unknown_status_is_database_error() {
        let err = Template::try_from(row("archived")).unwrap_err();
        assert!(matches!(err, NotificationError::Database(_)));
    }
}
