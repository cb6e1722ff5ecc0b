//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use email_notification_service::error::{NotificationError, Result};
use email_notification_service::pagination::PageResult;
use email_notification_service::send_log::{
    InMemorySendLogRepository, LogFilter, NewSendLog, SendLog, SendLogRepository,
};
use email_notification_service::template::{
    InMemoryTemplateRepository, NewTemplate, Params, Template, TemplateRepository, TemplateStatus,
};
use email_notification_service::transport::{MailTransport, OutboundEmail, TransportError};
use email_notification_service::trigger::{Param, ParamType, TriggerRegistry};
use email_notification_service::EmailNotificationService;

/// Transport that records every message and can be told to fail.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutboundEmail>>,
    failure: Mutex<Option<String>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every later send fails with an SMTP error carrying `message`.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, email: &OutboundEmail) -> std::result::Result<(), TransportError> {
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(TransportError::Smtp(message));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Send log store whose updates always fail.
#[derive(Default)]
pub struct FailingUpdateLogRepository {
    inner: InMemorySendLogRepository,
}

#[async_trait]
impl SendLogRepository for FailingUpdateLogRepository {
    async fn create(&self, log: NewSendLog) -> Result<SendLog> {
        self.inner.create(log).await
    }

    async fn update(&self, _log: &SendLog) -> Result<()> {
        Err(NotificationError::ServiceUnavailable("log store offline".to_string()))
    }

    async fn get_by_id(&self, id: i64) -> Result<SendLog> {
        self.inner.get_by_id(id).await
    }

    async fn list(&self, filter: &LogFilter) -> Result<PageResult<SendLog>> {
        self.inner.list(filter).await
    }

    fn backend(&self) -> &'static str {
        "failing"
    }
}

pub struct TestEnvironment {
    pub service: Arc<EmailNotificationService>,
    pub templates: Arc<InMemoryTemplateRepository>,
    pub logs: Arc<InMemorySendLogRepository>,
    pub transport: Arc<RecordingTransport>,
    pub registry: Arc<TriggerRegistry>,
}

pub fn registry() -> Arc<TriggerRegistry> {
    let registry = Arc::new(TriggerRegistry::new());
    registry.set_common_params(vec![
        Param::new("SiteName", ParamType::String).example("Ara"),
        Param::new("CurrentYear", ParamType::Number),
    ]);
    registry.register(
        "user:registered",
        "User registered",
        "Welcome email",
        vec![
            Param::new("UserName", ParamType::String)
                .required()
                .example("Alice"),
            Param::new("ActivationURL", ParamType::Url),
        ],
    );
    registry.register(
        "user:password_reset",
        "Password reset",
        "Reset link",
        vec![Param::new("ResetURL", ParamType::Url).example("https://example.com/reset")],
    );
    registry
}

pub fn create_test_environment(common_params: Params) -> TestEnvironment {
    let templates = Arc::new(InMemoryTemplateRepository::new());
    let logs = Arc::new(InMemorySendLogRepository::new());
    let transport = Arc::new(RecordingTransport::new());
    let registry = registry();

    let service = EmailNotificationService::new(
        templates.clone(),
        logs.clone(),
        transport.clone(),
        registry.clone(),
    )
    .with_common_params(common_params);

    TestEnvironment {
        service: Arc::new(service),
        templates,
        logs,
        transport,
        registry,
    }
}

pub fn new_template(trigger_code: &str, language: &str, status: TemplateStatus) -> NewTemplate {
    NewTemplate {
        trigger_code: trigger_code.to_string(),
        language: language.to_string(),
        name: format!("{} ({})", trigger_code, language),
        subject: format!("[{}] Welcome {{{{.UserName}}}}", language),
        body_html: "<p>Hello {{.UserName}}, © {{.CurrentYear}} {{.SiteName}}</p>".to_string(),
        body_text: String::new(),
        status,
        cc: String::new(),
        bcc: String::new(),
        reply_to: String::new(),
    }
}

pub async fn insert_template(
    env: &TestEnvironment,
    template: NewTemplate,
) -> Template {
    env.templates.create(template).await.unwrap()
}
