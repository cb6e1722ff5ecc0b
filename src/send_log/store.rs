//! Send log storage trait and in-memory implementation

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::types::{LogFilter, NewSendLog, SendLog, SendStatus};
use crate::error::{NotificationError, Result};
use crate::pagination::{PageRequest, PageResult};

/// Append-mostly storage for delivery attempts.
#[async_trait]
pub trait SendLogRepository: Send + Sync {
    /// Insert a `pending` entry.
    async fn create(&self, log: NewSendLog) -> Result<SendLog>;

    /// Persist the outcome fields (`status`, `error_message`, `sent_at`).
    async fn update(&self, log: &SendLog) -> Result<()>;

    async fn get_by_id(&self, id: i64) -> Result<SendLog>;

    /// Newest first.
    async fn list(&self, filter: &LogFilter) -> Result<PageResult<SendLog>>;

    fn backend(&self) -> &'static str;
}

/// In-memory send log storage
pub struct InMemorySendLogRepository {
    logs: DashMap<i64, SendLog>,
    next_id: AtomicI64,
}

impl Default for InMemorySendLogRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySendLogRepository {
    pub fn new() -> Self {
        Self {
            logs: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

#[async_trait]
impl SendLogRepository for InMemorySendLogRepository {
    async fn create(&self, log: NewSendLog) -> Result<SendLog> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let created = SendLog {
            id,
            template_id: log.template_id,
            trigger_code: log.trigger_code,
            language: log.language,
            recipient: log.recipient,
            subject: log.subject,
            params: log.params,
            status: SendStatus::Pending,
            error_message: String::new(),
            sent_at: None,
            created_at: Utc::now(),
        };

        self.logs.insert(id, created.clone());
        Ok(created)
    }

    async fn update(&self, log: &SendLog) -> Result<()> {
        let mut entry = self
            .logs
            .get_mut(&log.id)
            .ok_or(NotificationError::SendLogNotFound(log.id))?;

        entry.status = log.status;
        entry.error_message = log.error_message.clone();
        entry.sent_at = log.sent_at;
        Ok(())
    }

    async fn get_by_id(&self, id: i64) -> Result<SendLog> {
        self.logs
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(NotificationError::SendLogNotFound(id))
    }

    async fn list(&self, filter: &LogFilter) -> Result<PageResult<SendLog>> {
        let range = filter.time_range()?;

        let mut matched: Vec<SendLog> = self
            .logs
            .iter()
            .filter(|entry| filter.matches(entry.value(), &range))
            .map(|entry| entry.value().clone())
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(PageResult::from_sorted(
            matched,
            PageRequest::new(filter.page, filter.page_size),
        ))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_log(trigger_code: &str) -> NewSendLog {
        NewSendLog {
            template_id: Some(1),
            trigger_code: trigger_code.to_string(),
            language: "zh-CN".to_string(),
            recipient: "alice@example.com".to_string(),
            subject: "Welcome".to_string(),
            params: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn test_create_is_pending() {
        let store = InMemorySendLogRepository::new();
        let log = store.create(new_log("user:registered")).await.unwrap();

        assert_eq!(log.id, 1);
        assert_eq!(log.status, SendStatus::Pending);
        assert!(log.sent_at.is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_update_outcome() {
        let store = InMemorySendLogRepository::new();
        let mut log = store.create(new_log("user:registered")).await.unwrap();

        log.mark_failed("relay rejected");
        store.update(&log).await.unwrap();

        let stored = store.get_by_id(log.id).await.unwrap();
        assert_eq!(stored.status, SendStatus::Failed);
        assert_eq!(stored.error_message, "relay rejected");
    }

    #[tokio::test]
    async fn test_missing_log() {
        let store = InMemorySendLogRepository::new();
        assert!(matches!(
            store.get_by_id(7).await,
            Err(NotificationError::SendLogNotFound(7))
        ));
    }

    #[tokio::test]
    async fn test_list_filters_newest_first() {
        let store = InMemorySendLogRepository::new();
        for code in ["a", "b", "a", "a"] {
            store.create(new_log(code)).await.unwrap();
        }

        let filter = LogFilter {
            trigger_code: Some("a".to_string()),
            page_size: Some(2),
            ..Default::default()
        };
        let page = store.list(&filter).await.unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id, 4);
    }

    #[tokio::test]
    async fn test_list_rejects_bad_time() {
        let store = InMemorySendLogRepository::new();
        let filter = LogFilter {
            end_time: Some("not-a-time".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            store.list(&filter).await,
            Err(NotificationError::InvalidInput(_))
        ));
    }
}
