use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::signal;

use email_notification_service::config::{MailBackend, Settings, StorageBackend};
use email_notification_service::postgres::PostgresPool;
use email_notification_service::send_log::{
    InMemorySendLogRepository, PgSendLogRepository, SendLogRepository,
};
use email_notification_service::server::{create_app, AppState};
use email_notification_service::telemetry::init_telemetry;
use email_notification_service::template::{
    InMemoryTemplateRepository, Params, PgTemplateRepository, TemplateRepository,
};
use email_notification_service::transport::{LogTransport, MailTransport, SmtpTransport};
use email_notification_service::trigger::{Param, ParamType, TriggerRegistry};
use email_notification_service::EmailNotificationService;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;

    let _telemetry = init_telemetry(&settings.otel)?;
    tracing::info!("Configuration loaded");

    // Storage
    let (templates, logs, postgres_pool): (
        Arc<dyn TemplateRepository>,
        Arc<dyn SendLogRepository>,
        Option<PostgresPool>,
    ) = match settings.database.backend {
        StorageBackend::Postgres => {
            let pool = PostgresPool::new(&settings.database)
                .await
                .context("failed to connect to PostgreSQL")?;
            pool.ensure_schema().await?;
            (
                Arc::new(PgTemplateRepository::new(pool.pool().clone())),
                Arc::new(PgSendLogRepository::new(pool.pool().clone())),
                Some(pool),
            )
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; templates and logs are lost on restart");
            (
                Arc::new(InMemoryTemplateRepository::new()),
                Arc::new(InMemorySendLogRepository::new()),
                None,
            )
        }
    };

    // Transport
    let transport: Arc<dyn MailTransport> = match settings.mail.backend {
        MailBackend::Smtp => Arc::new(SmtpTransport::from_config(&settings.mail)?),
        MailBackend::Log => Arc::new(LogTransport::new()),
    };

    let registry = Arc::new(TriggerRegistry::new());
    register_builtin_triggers(&registry);

    let service = EmailNotificationService::new(templates, logs, transport, registry)
        .with_common_params(common_params(&settings.notification.common_params))
        .with_default_language(settings.notification.default_language.clone());
    tracing::info!(
        default_language = %service.default_language(),
        "Email notification service initialized"
    );

    let mut state = AppState::new(settings.clone(), Arc::new(service));
    if let Some(pool) = postgres_pool.clone() {
        state = state.with_postgres(pool);
    }

    let app = create_app(state);

    // Start server
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_handler())
        .await?;

    if let Some(pool) = postgres_pool {
        pool.close().await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Sample triggers shipped with the service.
fn register_builtin_triggers(registry: &TriggerRegistry) {
    registry.set_common_params(vec![
        Param::new("SiteName", ParamType::String)
            .describe("Site name")
            .example("Ara"),
        Param::new("SiteURL", ParamType::Url)
            .describe("Site home page")
            .example("https://example.com"),
        Param::new("CurrentYear", ParamType::Number)
            .describe("Current year, filled in automatically")
            .example("2024"),
    ]);

    registry.register(
        "user:registered",
        "User registered",
        "Welcome email sent after sign-up",
        vec![
            Param::new("UserName", ParamType::String)
                .describe("Display name")
                .required()
                .example("Alice"),
            Param::new("ActivationURL", ParamType::Url)
                .describe("Account activation link")
                .example("https://example.com/activate?token=abc"),
        ],
    );

    registry.register(
        "user:password_reset",
        "Password reset",
        "Password reset link",
        vec![
            Param::new("UserName", ParamType::String)
                .describe("Display name")
                .required()
                .example("Alice"),
            Param::new("ResetURL", ParamType::Url)
                .describe("Password reset link")
                .required()
                .example("https://example.com/reset?token=abc"),
            Param::new("ExpireMinutes", ParamType::Number)
                .describe("Minutes until the link expires")
                .example("30"),
        ],
    );

    tracing::info!(codes = ?registry.codes(), "Built-in triggers registered");
}

/// Site defaults overlaid with configured values.
fn common_params(configured: &Params) -> Params {
    let mut params = Params::new();
    params.insert("SiteName".to_string(), Value::from("Ara"));
    params.insert("SiteURL".to_string(), Value::from("http://localhost:8082"));
    params.extend(configured.iter().map(|(k, v)| (k.clone(), v.clone())));
    params
}

async fn shutdown_signal_handler() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
