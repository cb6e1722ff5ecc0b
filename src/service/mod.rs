//! Email notification service.
//!
//! Ties the trigger registry, template storage, renderer, send logs and the
//! mail transport together. Sending lives in [`send`]; this module holds
//! construction and the query / CRUD operations.

mod send;
mod types;

pub use types::SendInput;

use std::sync::Arc;

use crate::error::{NotificationError, Result};
use crate::pagination::PageResult;
use crate::send_log::{LogFilter, SendLog, SendLogRepository};
use crate::template::{
    CreateTemplateInput, NewTemplate, Params, Template, TemplateEngine, TemplateFilter,
    TemplateRepository, UpdateTemplateInput,
};
use crate::transport::MailTransport;
use crate::trigger::{Param, TriggerDefinition, TriggerRegistry};

/// Language used when a request names none, and the fallback for missing templates.
pub const DEFAULT_LANGUAGE: &str = "zh-CN";

pub struct EmailNotificationService {
    templates: Arc<dyn TemplateRepository>,
    logs: Arc<dyn SendLogRepository>,
    transport: Arc<dyn MailTransport>,
    registry: Arc<TriggerRegistry>,
    engine: TemplateEngine,
    common_params: Params,
    default_language: String,
}

impl EmailNotificationService {
    pub fn new(
        templates: Arc<dyn TemplateRepository>,
        logs: Arc<dyn SendLogRepository>,
        transport: Arc<dyn MailTransport>,
        registry: Arc<TriggerRegistry>,
    ) -> Self {
        Self {
            templates,
            logs,
            transport,
            registry,
            engine: TemplateEngine::new(),
            common_params: Params::new(),
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Values merged into every send beneath the caller's parameters.
    pub fn with_common_params(mut self, params: Params) -> Self {
        self.common_params = params;
        self
    }

    /// Ignored when empty.
    pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
        let language = language.into();
        if !language.trim().is_empty() {
            self.default_language = language.trim().to_string();
        }
        self
    }

    pub fn registry(&self) -> &Arc<TriggerRegistry> {
        &self.registry
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn common_params(&self) -> &Params {
        &self.common_params
    }

    /// `(template storage, log storage, transport)` names for health reporting.
    pub fn backends(&self) -> (&'static str, &'static str, &'static str) {
        (
            self.templates.backend(),
            self.logs.backend(),
            self.transport.name(),
        )
    }

    // ========== Triggers ==========

    pub fn list_triggers(&self) -> Vec<Arc<TriggerDefinition>> {
        let mut triggers = self.registry.get_all();
        triggers.sort_by(|a, b| a.code.cmp(&b.code));
        triggers
    }

    pub fn get_trigger(&self, code: &str) -> Result<Arc<TriggerDefinition>> {
        self.registry
            .get(code)
            .ok_or_else(|| NotificationError::TriggerNotFound(code.to_string()))
    }

    /// Common params followed by the trigger's own; only common params for unknown codes.
    pub fn get_trigger_params(&self, code: &str) -> Vec<Param> {
        self.registry.get_all_params(code)
    }

    // ========== Templates ==========

    #[tracing::instrument(skip(self, input), fields(trigger_code = %input.trigger_code))]
    pub async fn create_template(&self, input: CreateTemplateInput) -> Result<Template> {
        if !self.registry.exists(&input.trigger_code) {
            return Err(NotificationError::TriggerNotFound(input.trigger_code));
        }

        let language = match input.language.trim() {
            "" => self.default_language.clone(),
            language => language.to_string(),
        };

        require_non_empty("name", &input.name)?;
        require_non_empty("subject", &input.subject)?;
        require_non_empty("body_html", &input.body_html)?;

        if self
            .templates
            .exists_by_trigger_and_language(&input.trigger_code, &language, None)
            .await?
        {
            return Err(NotificationError::TemplateExists {
                trigger_code: input.trigger_code,
                language,
            });
        }

        let template = self
            .templates
            .create(NewTemplate {
                trigger_code: input.trigger_code,
                language,
                name: input.name,
                subject: input.subject,
                body_html: input.body_html,
                body_text: input.body_text,
                status: input.status.unwrap_or_default(),
                cc: input.cc,
                bcc: input.bcc,
                reply_to: input.reply_to,
            })
            .await?;

        tracing::info!(
            template_id = template.id,
            language = %template.language,
            status = %template.status,
            "Email template created"
        );

        Ok(template)
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn update_template(&self, id: i64, input: UpdateTemplateInput) -> Result<Template> {
        let mut template = self.templates.get_by_id(id).await?;
        if input.is_empty() {
            return Ok(template);
        }

        input.apply_to(&mut template);

        require_non_empty("name", &template.name)?;
        require_non_empty("subject", &template.subject)?;
        require_non_empty("body_html", &template.body_html)?;

        if self
            .templates
            .exists_by_trigger_and_language(&template.trigger_code, &template.language, Some(id))
            .await?
        {
            return Err(NotificationError::TemplateExists {
                trigger_code: template.trigger_code,
                language: template.language,
            });
        }

        let updated = self.templates.update(&template).await?;
        tracing::info!(template_id = id, status = %updated.status, "Email template updated");
        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_template(&self, id: i64) -> Result<()> {
        self.templates.delete(id).await?;
        tracing::info!(template_id = id, "Email template deleted");
        Ok(())
    }

    pub async fn get_template(&self, id: i64) -> Result<Template> {
        self.templates.get_by_id(id).await
    }

    pub async fn list_templates(&self, filter: &TemplateFilter) -> Result<PageResult<Template>> {
        self.templates.list(filter).await
    }

    /// The enabled template for a trigger and language, without fallback.
    pub async fn get_template_by_trigger(
        &self,
        trigger_code: &str,
        language: &str,
    ) -> Result<Template> {
        self.templates
            .get_active_template(trigger_code, language)
            .await
    }

    // ========== Send logs ==========

    pub async fn get_send_logs(&self, filter: &LogFilter) -> Result<PageResult<SendLog>> {
        self.logs.list(filter).await
    }

    pub async fn get_send_log(&self, id: i64) -> Result<SendLog> {
        self.logs.get_by_id(id).await
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(NotificationError::InvalidInput(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::send_log::InMemorySendLogRepository;
    use crate::template::{InMemoryTemplateRepository, TemplateStatus};
    use crate::transport::LogTransport;
    use crate::trigger::ParamType;

    fn service() -> EmailNotificationService {
        let registry = Arc::new(TriggerRegistry::new());
        registry.register(
            "user:registered",
            "User registered",
            "Sent after sign-up",
            vec![Param::new("UserName", ParamType::String)],
        );

        EmailNotificationService::new(
            Arc::new(InMemoryTemplateRepository::new()),
            Arc::new(InMemorySendLogRepository::new()),
            Arc::new(LogTransport::new()),
            registry,
        )
    }

    fn create_input(language: &str) -> CreateTemplateInput {
        CreateTemplateInput {
            trigger_code: "user:registered".to_string(),
            language: language.to_string(),
            name: "Welcome".to_string(),
            subject: "Welcome {{.UserName}}".to_string(),
            body_html: "<p>Hi {{.UserName}}</p>".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_template_defaults() {
        let service = service();
        let template = service.create_template(create_input("")).await.unwrap();

        assert_eq!(template.language, "zh-CN");
        assert_eq!(template.status, TemplateStatus::Draft);
    }

    #[tokio::test]
    async fn test_create_template_unknown_trigger() {
        let service = service();
        let mut input = create_input("zh-CN");
        input.trigger_code = "order:shipped".to_string();

        assert!(matches!(
            service.create_template(input).await,
            Err(NotificationError::TriggerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_template_duplicate() {
        let service = service();
        service.create_template(create_input("en-US")).await.unwrap();

        assert!(matches!(
            service.create_template(create_input("en-US")).await,
            Err(NotificationError::TemplateExists { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_template_requires_subject() {
        let service = service();
        let mut input = create_input("zh-CN");
        input.subject = " ".to_string();

        assert!(matches!(
            service.create_template(input).await,
            Err(NotificationError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_update_template_partial() {
        let service = service();
        let created = service.create_template(create_input("zh-CN")).await.unwrap();

        let updated = service
            .update_template(
                created.id,
                UpdateTemplateInput {
                    status: Some(TemplateStatus::Enabled),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, TemplateStatus::Enabled);
        assert_eq!(updated.subject, created.subject);
        assert!(service
            .get_template_by_trigger("user:registered", "zh-CN")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_update_template_rejects_empty_body() {
        let service = service();
        let created = service.create_template(create_input("zh-CN")).await.unwrap();

        let result = service
            .update_template(
                created.id,
                UpdateTemplateInput {
                    body_html: Some(String::new()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(NotificationError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_delete_template() {
        let service = service();
        let created = service.create_template(create_input("zh-CN")).await.unwrap();

        service.delete_template(created.id).await.unwrap();
        assert!(service.get_template(created.id).await.unwrap_err().is_not_found());
        assert!(service.delete_template(created.id).await.is_err());
    }

    #[test]
    fn test_trigger_queries() {
        let service = service();

        assert_eq!(service.list_triggers().len(), 1);
        assert!(service.get_trigger("user:registered").is_ok());
        assert!(matches!(
            service.get_trigger("missing"),
            Err(NotificationError::TriggerNotFound(_))
        ));
        assert_eq!(service.get_trigger_params("user:registered").len(), 1);
        assert!(service.get_trigger_params("missing").is_empty());
    }

    #[test]
    fn test_default_language_override() {
        let service = service().with_default_language("en-US");
        assert_eq!(service.default_language(), "en-US");

        let service = service.with_default_language("");
        assert_eq!(service.default_language(), "en-US");
    }
}
