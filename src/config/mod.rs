mod settings;

pub use settings::{
    ApiConfig, DatabaseConfig, MailBackend, MailConfig, MailTlsMode, NotificationConfig,
    OtelConfig, ServerConfig, Settings, StorageBackend,
};
