//! Transient user notifications
//!
//! Every action outcome becomes one notification that disappears on its own
//! after the configured lifetime, or earlier when dismissed.

use aimart_core::config::NotificationConfig;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Neutral information
    Info,
    /// An action succeeded
    Success,
    /// An action or fetch failed
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        })
    }
}

/// One visible notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Unique id, used for dismissal
    pub id: Uuid,
    /// Severity
    pub kind: NotificationKind,
    /// Text shown to the user
    pub message: String,
    /// When the notification disappears by itself
    pub expires_at: Instant,
}

/// Shared queue of notifications; clones share the same queue
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    entries: Arc<Mutex<Vec<Notification>>>,
    ttl: Duration,
}

impl NotificationCenter {
    /// Center whose notifications live for `ttl`
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            ttl,
        }
    }

    /// Center using the configured lifetime
    #[must_use]
    pub fn from_config(config: &NotificationConfig) -> Self {
        Self::new(config.ttl())
    }

    /// Show a notification
    pub fn push(&self, kind: NotificationKind, message: impl Into<String>) -> Uuid {
        let message = message.into();
        match kind {
            NotificationKind::Error => warn!(%kind, %message, "notification"),
            _ => info!(%kind, %message, "notification"),
        }

        let notification = Notification {
            id: Uuid::new_v4(),
            kind,
            message,
            expires_at: Instant::now() + self.ttl,
        };
        let id = notification.id;
        self.entries.lock().push(notification);
        id
    }

    /// Show an informational notification
    pub fn info(&self, message: impl Into<String>) -> Uuid {
        self.push(NotificationKind::Info, message)
    }

    /// Show a success notification
    pub fn success(&self, message: impl Into<String>) -> Uuid {
        self.push(NotificationKind::Success, message)
    }

    /// Show an error notification
    pub fn error(&self, message: impl Into<String>) -> Uuid {
        self.push(NotificationKind::Error, message)
    }

    /// Remove a notification early; returns whether it was still visible
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|n| n.id != id);
        entries.len() != before
    }

    /// Notifications still visible, oldest first
    #[must_use]
    pub fn active(&self) -> Vec<Notification> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        entries.retain(|n| n.expires_at > now);
        entries.clone()
    }

    /// Take every visible notification, leaving the queue empty
    #[must_use]
    pub fn drain(&self) -> Vec<Notification> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        entries.retain(|n| n.expires_at > now);
        std::mem::take(&mut *entries)
    }

    /// Configured lifetime
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::from_config(&NotificationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test(start_paused = true)]
    async fn test_notifications_expire_after_ttl() {
        let center = NotificationCenter::new(Duration::from_millis(4500));
        center.success("Promocode created");

        tokio::time::advance(Duration::from_millis(4499)).await;
        assert_eq!(center.active().len(), 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(center.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_notification_has_its_own_clock() {
        let center = NotificationCenter::new(Duration::from_secs(4));
        center.info("first");
        tokio::time::advance(Duration::from_secs(2)).await;
        center.error("second");
        tokio::time::advance(Duration::from_secs(3)).await;

        let active = center.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active.first().map(|n| n.message.as_str()), Some("second"));
        assert_eq!(active.first().map(|n| n.kind), Some(NotificationKind::Error));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_removes_only_target() {
        let center = NotificationCenter::new(Duration::from_secs(5));
        let first = center.info("one");
        center.info("two");

        assert!(center.dismiss(first));
        assert!(!center.dismiss(first));
        let messages: Vec<String> = center.active().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["two".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clones_share_queue_and_drain_empties_it() {
        let center = NotificationCenter::new(Duration::from_secs(5));
        let other = center.clone();
        other.success("saved");

        let drained = center.drain();
        assert_eq!(drained.len(), 1);
        assert!(other.active().is_empty());
    }
}
