//! Send logs: one durable record per delivery attempt.

pub mod postgres;
pub mod store;
pub mod types;

pub use postgres::PgSendLogRepository;
pub use store::{InMemorySendLogRepository, SendLogRepository};
pub use types::{LogFilter, NewSendLog, SendLog, SendStatus, TimeRange};
