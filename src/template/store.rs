//! Template storage trait and in-memory implementation

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::types::{NewTemplate, Template, TemplateFilter};
use crate::error::{NotificationError, Result};
use crate::pagination::{PageRequest, PageResult};

/// Persistence for email templates.
///
/// Deleted templates are tombstoned and invisible to every query.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn create(&self, template: NewTemplate) -> Result<Template>;

    /// Persist every field of an existing template, refreshing `updated_at`.
    async fn update(&self, template: &Template) -> Result<Template>;

    /// Soft delete.
    async fn delete(&self, id: i64) -> Result<()>;

    async fn get_by_id(&self, id: i64) -> Result<Template>;

    /// The enabled template for a trigger and language.
    async fn get_active_template(&self, trigger_code: &str, language: &str) -> Result<Template>;

    /// Newest first.
    async fn list(&self, filter: &TemplateFilter) -> Result<PageResult<Template>>;

    async fn exists_by_trigger_and_language(
        &self,
        trigger_code: &str,
        language: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool>;

    /// Backend name for health reporting
    fn backend(&self) -> &'static str;
}

/// In-memory template storage
pub struct InMemoryTemplateRepository {
    templates: DashMap<i64, Template>,
    next_id: AtomicI64,
}

impl Default for InMemoryTemplateRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTemplateRepository {
    pub fn new() -> Self {
        Self {
            templates: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    fn live(&self) -> impl Iterator<Item = Template> + '_ {
        self.templates
            .iter()
            .filter(|entry| !entry.value().is_deleted())
            .map(|entry| entry.value().clone())
    }

    fn not_found(id: i64) -> NotificationError {
        NotificationError::TemplateNotFound(id.to_string())
    }
}

#[async_trait]
impl TemplateRepository for InMemoryTemplateRepository {
    async fn create(&self, template: NewTemplate) -> Result<Template> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();

        let created = Template {
            id,
            trigger_code: template.trigger_code,
            language: template.language,
            name: template.name,
            subject: template.subject,
            body_html: template.body_html,
            body_text: template.body_text,
            status: template.status,
            cc: template.cc,
            bcc: template.bcc,
            reply_to: template.reply_to,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.templates.insert(id, created.clone());
        Ok(created)
    }

    async fn update(&self, template: &Template) -> Result<Template> {
        let mut entry = self
            .templates
            .get_mut(&template.id)
            .filter(|entry| !entry.is_deleted())
            .ok_or_else(|| Self::not_found(template.id))?;

        let mut updated = template.clone();
        updated.created_at = entry.created_at;
        updated.updated_at = Utc::now();
        updated.deleted_at = None;
        *entry = updated.clone();

        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut entry = self
            .templates
            .get_mut(&id)
            .filter(|entry| !entry.is_deleted())
            .ok_or_else(|| Self::not_found(id))?;

        entry.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn get_by_id(&self, id: i64) -> Result<Template> {
        self.templates
            .get(&id)
            .filter(|entry| !entry.is_deleted())
            .map(|entry| entry.clone())
            .ok_or_else(|| Self::not_found(id))
    }

    async fn get_active_template(&self, trigger_code: &str, language: &str) -> Result<Template> {
        self.live()
            .filter(|t| t.trigger_code == trigger_code && t.language == language && t.is_enabled())
            .min_by_key(|t| t.id)
            .ok_or_else(|| {
                NotificationError::TemplateNotFound(format!("{} ({})", trigger_code, language))
            })
    }

    async fn list(&self, filter: &TemplateFilter) -> Result<PageResult<Template>> {
        let mut matched: Vec<Template> = self.live().filter(|t| filter.matches(t)).collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(PageResult::from_sorted(
            matched,
            PageRequest::new(filter.page, filter.page_size),
        ))
    }

    async fn exists_by_trigger_and_language(
        &self,
        trigger_code: &str,
        language: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        Ok(self.live().any(|t| {
            t.trigger_code == trigger_code
                && t.language == language
                && exclude_id.map_or(true, |id| t.id != id)
        }))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
