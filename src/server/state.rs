use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::postgres::PostgresPool;
use crate::service::EmailNotificationService;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub service: Arc<EmailNotificationService>,
    /// Present when templates and logs are stored in PostgreSQL
    pub postgres_pool: Option<PostgresPool>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings, service: Arc<EmailNotificationService>) -> Self {
        Self {
            settings: Arc::new(settings),
            service,
            postgres_pool: None,
            start_time: Instant::now(),
        }
    }

    pub fn with_postgres(mut self, pool: PostgresPool) -> Self {
        self.postgres_pool = Some(pool);
        self
    }
}
