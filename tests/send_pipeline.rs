//! Send pipeline integration tests
//!
//! Runs the service against in-memory storage and a recording transport.

mod common;

use std::sync::Arc;

use chrono::{Datelike, Local};
use serde_json::{json, Value};

use common::{create_test_environment, insert_template, new_template, FailingUpdateLogRepository};
use email_notification_service::send_log::{LogFilter, SendLogRepository, SendStatus};
use email_notification_service::template::{
    InMemoryTemplateRepository, Params, TemplateRepository, TemplateStatus,
};
use email_notification_service::transport::Attachment;
use email_notification_service::{EmailNotificationService, NotificationError, SendInput};

fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}

#[tokio::test]
async fn test_send_with_default_language() {
    let env = create_test_environment(params(json!({ "SiteName": "Ara" })));
    let template = insert_template(
        &env,
        new_template("user:registered", "zh-CN", TemplateStatus::Enabled),
    )
    .await;

    env.service
        .send(SendInput::new("user:registered", "alice@example.com").param("UserName", "Alice"))
        .await
        .unwrap();

    let sent = env.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["alice@example.com"]);
    assert_eq!(sent[0].subject, "[zh-CN] Welcome Alice");
    let year = Local::now().year();
    assert_eq!(
        sent[0].html_body,
        format!("<p>Hello Alice, © {} Ara</p>", year)
    );
    assert!(sent[0].text_body.is_none());

    let logs = env.logs.list(&LogFilter::default()).await.unwrap();
    assert_eq!(logs.total, 1);
    let log = &logs.items[0];
    assert_eq!(log.status, SendStatus::Sent);
    assert!(log.sent_at.is_some());
    assert_eq!(log.template_id, Some(template.id));
    assert_eq!(log.language, "zh-CN");
    assert_eq!(log.subject, "[zh-CN] Welcome Alice");
    assert_eq!(log.params["UserName"], "Alice");
    assert_eq!(log.params["CurrentYear"], year);
}

#[tokio::test]
async fn test_send_falls_back_to_default_language() {
    let env = create_test_environment(Params::new());
    insert_template(
        &env,
        new_template("user:registered", "zh-CN", TemplateStatus::Enabled),
    )
    .await;

    env.service
        .send(
            SendInput::new("user:registered", "bob@example.com")
                .language("en-US")
                .param("UserName", "Bob"),
        )
        .await
        .unwrap();

    let sent = env.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "[zh-CN] Welcome Bob");

    let logs = env.logs.list(&LogFilter::default()).await.unwrap();
    assert_eq!(logs.items[0].language, "zh-CN");
}

#[tokio::test]
async fn test_send_prefers_requested_language() {
    let env = create_test_environment(Params::new());
    insert_template(
        &env,
        new_template("user:registered", "zh-CN", TemplateStatus::Enabled),
    )
    .await;
    insert_template(
        &env,
        new_template("user:registered", "en-US", TemplateStatus::Enabled),
    )
    .await;

    env.service
        .send(
            SendInput::new("user:registered", "bob@example.com")
                .language("en-US")
                .param("UserName", "Bob"),
        )
        .await
        .unwrap();

    assert_eq!(env.transport.sent()[0].subject, "[en-US] Welcome Bob");
}

#[tokio::test]
async fn test_send_without_any_enabled_template() {
    let env = create_test_environment(Params::new());
    insert_template(
        &env,
        new_template("user:registered", "zh-CN", TemplateStatus::Draft),
    )
    .await;

    let err = env
        .service
        .send(SendInput::new("user:registered", "bob@example.com").language("en-US"))
        .await
        .unwrap_err();

    assert!(matches!(err, NotificationError::TemplateNotFound(_)));
    assert!(env.logs.is_empty());
    assert!(env.transport.sent().is_empty());
}

#[tokio::test]
async fn test_send_validation_happens_before_logging() {
    let env = create_test_environment(Params::new());
    insert_template(
        &env,
        new_template("user:registered", "zh-CN", TemplateStatus::Enabled),
    )
    .await;

    let err = env
        .service
        .send(SendInput::new("user:registered", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, NotificationError::NoRecipient));

    let err = env
        .service
        .send(SendInput::new("", "alice@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, NotificationError::InvalidInput(_)));

    let err = env
        .service
        .send(SendInput::new("order:shipped", "alice@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, NotificationError::TriggerNotFound(_)));

    assert!(env.logs.is_empty());
    assert!(env.transport.sent().is_empty());
}

#[tokio::test]
async fn test_render_failure_aborts_before_logging() {
    let env = create_test_environment(Params::new());
    let mut template = new_template("user:registered", "zh-CN", TemplateStatus::Enabled);
    template.body_html = "<p>Hello {{.UserName</p>".to_string();
    insert_template(&env, template).await;

    let err = env
        .service
        .send(SendInput::new("user:registered", "alice@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, NotificationError::RenderFailed(_)));
    assert!(env.logs.is_empty());
    assert!(env.transport.sent().is_empty());
}

#[tokio::test]
async fn test_transport_failure_is_logged_and_wrapped() {
    let env = create_test_environment(Params::new());
    insert_template(
        &env,
        new_template("user:registered", "zh-CN", TemplateStatus::Enabled),
    )
    .await;
    env.transport.fail_with("550 mailbox unavailable");

    let err = env
        .service
        .send(SendInput::new("user:registered", "alice@example.com"))
        .await
        .unwrap_err();

    let cause = match &err {
        NotificationError::SendFailed(cause) => cause.to_string(),
        other => panic!("unexpected error: {:?}", other),
    };
    assert!(cause.contains("550 mailbox unavailable"));

    let logs = env.logs.list(&LogFilter::default()).await.unwrap();
    assert_eq!(logs.total, 1);
    assert_eq!(logs.items[0].status, SendStatus::Failed);
    assert_eq!(logs.items[0].error_message, cause);
    assert!(logs.items[0].sent_at.is_none());
}

#[tokio::test]
async fn test_missing_param_renders_empty() {
    let env = create_test_environment(Params::new());
    insert_template(
        &env,
        new_template("user:registered", "zh-CN", TemplateStatus::Enabled),
    )
    .await;

    env.service
        .send(SendInput::new("user:registered", "alice@example.com"))
        .await
        .unwrap();

    assert_eq!(env.transport.sent()[0].subject, "[zh-CN] Welcome ");
}

#[tokio::test]
async fn test_merge_precedence_is_recorded() {
    let env = create_test_environment(params(json!({ "A": 1 })));
    insert_template(
        &env,
        new_template("user:registered", "zh-CN", TemplateStatus::Enabled),
    )
    .await;

    env.service
        .send(
            SendInput::new("user:registered", "alice@example.com")
                .param("A", 2)
                .param("B", 3),
        )
        .await
        .unwrap();

    let log = env.logs.get_by_id(1).await.unwrap();
    let recorded = log.params.as_object().unwrap();
    assert_eq!(recorded.len(), 3);
    assert_eq!(recorded["A"], 2);
    assert_eq!(recorded["B"], 3);
    assert_eq!(recorded["CurrentYear"], Local::now().year());
}

#[tokio::test]
async fn test_envelope_composition() {
    let env = create_test_environment(Params::new());
    let mut template = new_template("user:registered", "zh-CN", TemplateStatus::Enabled);
    template.cc = "audit@example.com, ,ops@example.com".to_string();
    template.bcc = "archive@example.com".to_string();
    template.reply_to = "team@example.com".to_string();
    template.body_text = "Hello {{.UserName}}".to_string();
    insert_template(&env, template).await;

    env.service
        .send(
            SendInput::new("user:registered", "alice@example.com, bob@example.com")
                .param("UserName", "Alice")
                .cc("extra@example.com")
                .bcc("hidden@example.com")
                .reply_to("support@example.com")
                .from("news@example.com")
                .from_name("Newsletter")
                .subject("Action needed, {{.UserName}}")
                .attach(Attachment::new("terms.txt", b"terms".to_vec(), "text/plain")),
        )
        .await
        .unwrap();

    let email = &env.transport.sent()[0];
    assert_eq!(email.to, vec!["alice@example.com", "bob@example.com"]);
    assert_eq!(
        email.cc,
        vec!["audit@example.com", "ops@example.com", "extra@example.com"]
    );
    assert_eq!(email.bcc, vec!["archive@example.com", "hidden@example.com"]);
    assert_eq!(email.reply_to.as_deref(), Some("support@example.com"));
    assert_eq!(email.from.as_deref(), Some("news@example.com"));
    assert_eq!(email.from_name.as_deref(), Some("Newsletter"));
    assert_eq!(email.subject, "Action needed, Alice");
    assert_eq!(email.text_body.as_deref(), Some("Hello Alice"));
    assert_eq!(email.attachments.len(), 1);
    assert_eq!(email.attachments[0].filename, "terms.txt");
}

#[tokio::test]
async fn test_reply_to_falls_back_to_template() {
    let env = create_test_environment(Params::new());
    let mut template = new_template("user:registered", "zh-CN", TemplateStatus::Enabled);
    template.reply_to = "team@example.com".to_string();
    insert_template(&env, template).await;

    env.service
        .send(SendInput::new("user:registered", "alice@example.com"))
        .await
        .unwrap();

    assert_eq!(
        env.transport.sent()[0].reply_to.as_deref(),
        Some("team@example.com")
    );
}

#[tokio::test]
async fn test_test_send_uses_examples() {
    let env = create_test_environment(params(json!({ "SiteName": "Configured" })));
    let mut template = new_template("user:registered", "zh-CN", TemplateStatus::Draft);
    template.body_html = "{{.UserName}} {{.ActivationURL}} {{.SiteName}} {{.CurrentYear}}".to_string();
    template.cc = "audit@example.com".to_string();
    let template = insert_template(&env, template).await;

    env.service
        .test_send(template.id, "qa@example.com")
        .await
        .unwrap();

    let email = &env.transport.sent()[0];
    assert_eq!(
        email.html_body,
        format!(
            "Alice {{{{.ActivationURL}}}} Ara {}",
            Local::now().year()
        )
    );
    assert_eq!(email.cc, vec!["audit@example.com"]);
    assert!(email.from.is_none());

    let log = env.logs.get_by_id(1).await.unwrap();
    assert_eq!(log.status, SendStatus::Sent);
    assert_eq!(log.recipient, "qa@example.com");
}

#[tokio::test]
async fn test_test_send_errors() {
    let env = create_test_environment(Params::new());
    let draft = insert_template(
        &env,
        new_template("user:registered", "zh-CN", TemplateStatus::Draft),
    )
    .await;

    assert!(matches!(
        env.service.test_send(draft.id, "").await,
        Err(NotificationError::NoRecipient)
    ));
    assert!(matches!(
        env.service.test_send(999, "qa@example.com").await,
        Err(NotificationError::TemplateNotFound(_))
    ));
    assert!(env.logs.is_empty());
}

#[tokio::test]
async fn test_test_send_ignores_template_status() {
    let env = create_test_environment(Params::new());
    let disabled = insert_template(
        &env,
        new_template("user:registered", "zh-CN", TemplateStatus::Disabled),
    )
    .await;

    env.service
        .test_send(disabled.id, "qa@example.com")
        .await
        .unwrap();

    let sent = env.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["qa@example.com"]);
    assert_eq!(sent[0].subject, "[zh-CN] Welcome Alice");

    let log = env.logs.get_by_id(1).await.unwrap();
    assert_eq!(log.template_id, Some(disabled.id));
    assert_eq!(log.status, SendStatus::Sent);
}

#[tokio::test]
async fn test_preview_template() {
    let env = create_test_environment(Params::new());
    let mut template = new_template("user:registered", "zh-CN", TemplateStatus::Draft);
    template.subject = "Welcome {{.UserName}}".to_string();
    template.body_html = "<a href=\"{{.ActivationURL}}\">{{.SiteName}}</a>".to_string();
    template.body_text = "Hi {{.UserName}}".to_string();
    let template = insert_template(&env, template).await;

    let preview = env.service.preview_template(template.id).await.unwrap();

    assert_eq!(preview.subject, "Welcome Alice");
    assert_eq!(preview.body_html, "<a href=\"{{.ActivationURL}}\">Ara</a>");
    assert_eq!(preview.body_text, "Hi Alice");
    assert!(env.logs.is_empty());
    assert!(env.transport.sent().is_empty());
}

#[tokio::test]
async fn test_log_finalization_failure_keeps_delivery_outcome() {
    let templates = Arc::new(InMemoryTemplateRepository::new());
    let logs = Arc::new(FailingUpdateLogRepository::default());
    let transport = Arc::new(common::RecordingTransport::new());
    let service = EmailNotificationService::new(
        templates.clone(),
        logs.clone(),
        transport.clone(),
        common::registry(),
    );

    templates
        .create(new_template("user:registered", "zh-CN", TemplateStatus::Enabled))
        .await
        .unwrap();

    service
        .send(SendInput::new("user:registered", "alice@example.com"))
        .await
        .unwrap();

    assert_eq!(transport.sent().len(), 1);
    let log = logs.get_by_id(1).await.unwrap();
    assert_eq!(log.status, SendStatus::Pending);
}

#[tokio::test]
async fn test_concurrent_sends_are_independent() {
    let env = create_test_environment(Params::new());
    insert_template(
        &env,
        new_template("user:registered", "zh-CN", TemplateStatus::Enabled),
    )
    .await;

    let mut handles = Vec::new();
    for i in 0..10 {
        let service = env.service.clone();
        handles.push(tokio::spawn(async move {
            service
                .send(
                    SendInput::new("user:registered", format!("user{}@example.com", i))
                        .param("UserName", format!("User{}", i)),
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(env.transport.sent().len(), 10);
    let page = env
        .logs
        .list(&LogFilter {
            status: Some(SendStatus::Sent),
            page_size: Some(100),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 10);
}
