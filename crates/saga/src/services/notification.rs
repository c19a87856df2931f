//! Notification service trait and in-memory implementation.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::ServiceError;

/// An email to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Which notification the saga was sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Confirmation,
    Cancellation,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Confirmation => write!(f, "confirmation"),
            NotificationKind::Cancellation => write!(f, "cancellation"),
        }
    }
}

/// Trait for delivering customer notifications.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Sends one notification.
    async fn send(&self, notification: &Notification) -> Result<(), ServiceError>;
}

/// In-memory notification service for testing; records every send.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationService {
    sent: Arc<Mutex<Vec<Notification>>>,
    fail_on_send: Arc<AtomicBool>,
}

impl InMemoryNotificationService {
    /// Creates a new in-memory notification service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures every send to fail with a transport error.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.fail_on_send.store(fail, Ordering::SeqCst);
    }

    /// Returns every notification sent so far, oldest first.
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }

    /// Returns the number of notifications sent.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl NotificationService for InMemoryNotificationService {
    async fn send(&self, notification: &Notification) -> Result<(), ServiceError> {
        if self.fail_on_send.load(Ordering::SeqCst) {
            return Err(ServiceError::Transport(
                "email service unreachable".to_string(),
            ));
        }
        self.sent.lock().await.push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification() -> Notification {
        Notification {
            to: "customer-1@example.com".to_string(),
            subject: "hello".to_string(),
            body: "world".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_records_notification() {
        let service = InMemoryNotificationService::new();
        service.send(&notification()).await.unwrap();

        assert_eq!(service.sent_count().await, 1);
        assert_eq!(service.sent().await, vec![notification()]);
    }

    #[tokio::test]
    async fn test_fail_on_send_records_nothing() {
        let service = InMemoryNotificationService::new();
        service.set_fail_on_send(true);

        assert!(service.send(&notification()).await.is_err());
        assert_eq!(service.sent_count().await, 0);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(NotificationKind::Confirmation.to_string(), "confirmation");
        assert_eq!(NotificationKind::Cancellation.to_string(), "cancellation");
    }
}
