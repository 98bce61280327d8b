//! Per-item actions: confirmation, single-flight guard, and outcome
//! notification
//!
//! [`ActionDispatcher`] supplies the pieces every mutation goes through;
//! [`crate::page::ListPage`] composes them with the optimistic update or
//! refetch that follows.

use crate::notify::NotificationCenter;
use aimart_core::{Error, Result};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// Mutation a list page can dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Create a new record
    Create,
    /// Edit an existing record
    Update,
    /// Delete a record
    Delete,
    /// Flip a record's active flag
    ToggleStatus,
    /// Suspend an account
    Suspend,
    /// Reactivate a suspended account
    Activate,
}

/// How the list catches up with a successful mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    /// Change the local snapshot first, roll back on failure
    Optimistic,
    /// Refetch the collection after success
    Refetch,
}

impl Action {
    /// Phrase used in messages: "Failed to {verb} promocode"
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::ToggleStatus => "change status of",
            Self::Suspend => "suspend",
            Self::Activate => "activate",
        }
    }

    /// Past tense used in success messages: "Promocode deleted"
    #[must_use]
    pub const fn past_tense(self) -> &'static str {
        match self {
            Self::Create => "created",
            Self::Update => "updated",
            Self::Delete => "deleted",
            Self::ToggleStatus => "status updated",
            Self::Suspend => "suspended",
            Self::Activate => "activated",
        }
    }

    /// Whether the user must confirm before dispatch
    #[must_use]
    pub const fn is_destructive(self) -> bool {
        matches!(self, Self::Delete | Self::Suspend)
    }

    /// How the list reconciles after this action
    #[must_use]
    pub const fn reconcile(self) -> Reconcile {
        match self {
            Self::Delete | Self::ToggleStatus => Reconcile::Optimistic,
            Self::Create | Self::Update | Self::Suspend | Self::Activate => Reconcile::Refetch,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Result of dispatching an action that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The API accepted the mutation
    Applied,
    /// The user declined the confirmation; nothing was sent
    Declined,
}

/// Asks the user to confirm a destructive action
pub trait ConfirmationGate: Send + Sync {
    /// Return `true` to proceed
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> ConfirmationGate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Gate that approves everything, for `--yes` and scripted use
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl ConfirmationGate for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Items with an action in flight
#[derive(Debug, Clone, Default)]
pub struct PendingActions {
    inner: Arc<DashMap<String, Action>>,
}

impl PendingActions {
    /// Claim `id` for `action`
    ///
    /// # Errors
    ///
    /// Returns `Error::Busy` if another action already holds `id`.
    pub fn begin(&self, id: &str, action: Action) -> Result<PendingGuard> {
        match self.inner.entry(id.to_string()) {
            Entry::Occupied(running) => {
                debug!(id, running = %running.get(), requested = %action, "item busy");
                Err(Error::Busy { id: id.to_string() })
            }
            Entry::Vacant(slot) => {
                slot.insert(action);
                Ok(PendingGuard {
                    inner: Arc::clone(&self.inner),
                    id: id.to_string(),
                })
            }
        }
    }

    /// Action currently running for `id`
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Action> {
        self.inner.get(id).map(|entry| *entry.value())
    }

    /// Whether `id` has an action in flight
    #[must_use]
    pub fn is_pending(&self, id: &str) -> bool {
        self.inner.contains_key(id)
    }

    /// Ids with an action in flight, sorted
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }
}

/// Releases an item's pending slot when dropped
#[derive(Debug)]
#[must_use = "the item is released as soon as the guard is dropped"]
pub struct PendingGuard {
    inner: Arc<DashMap<String, Action>>,
    id: String,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.inner.remove(&self.id);
    }
}

/// Confirmation, single-flight and notification for one list page
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    subject: String,
    pending: PendingActions,
    notifications: NotificationCenter,
}

impl ActionDispatcher {
    /// Dispatcher for records called `subject` (e.g. "promocode")
    pub fn new(subject: impl Into<String>, notifications: NotificationCenter) -> Self {
        Self {
            subject: subject.into(),
            pending: PendingActions::default(),
            notifications,
        }
    }

    /// Items with an action in flight
    #[must_use]
    pub const fn pending(&self) -> &PendingActions {
        &self.pending
    }

    /// Ask `gate` before a destructive action; non-destructive actions pass
    /// without asking
    pub fn confirm(&self, action: Action, id: &str, gate: &dyn ConfirmationGate) -> bool {
        if !action.is_destructive() {
            return true;
        }
        let prompt = format!("Are you sure you want to {} {} {id}?", action.verb(), self.subject);
        let confirmed = gate.confirm(&prompt);
        if !confirmed {
            info!(subject = %self.subject, id, %action, "action declined");
        }
        confirmed
    }

    /// Claim `id`, notifying the user if it is busy
    ///
    /// # Errors
    ///
    /// Returns `Error::Busy` if another action holds `id`.
    pub fn claim(&self, id: &str, action: Action) -> Result<PendingGuard> {
        self.pending.begin(id, action).inspect_err(|e| {
            self.notifications.error(e.user_message(&self.describe(action)));
        })
    }

    /// Await the request and notify its outcome
    ///
    /// # Errors
    ///
    /// Returns the request's error after notifying it.
    pub async fn execute<F>(&self, action: Action, request: F) -> Result<Value>
    where
        F: Future<Output = Result<Value>>,
    {
        match request.await {
            Ok(body) => {
                self.notifications.success(self.success_message(action));
                Ok(body)
            }
            Err(e) => {
                self.notifications.error(e.user_message(&self.describe(action)));
                Err(e)
            }
        }
    }

    /// Report a failure that happened before any request was sent
    pub fn reject(&self, action: Action, error: &Error) {
        self.notifications.error(error.user_message(&self.describe(action)));
    }

    fn describe(&self, action: Action) -> String {
        format!("{} {}", action.verb(), self.subject)
    }

    fn success_message(&self, action: Action) -> String {
        let mut chars = self.subject.chars();
        let subject = chars
            .next()
            .map(|first| first.to_uppercase().chain(chars).collect::<String>())
            .unwrap_or_default();
        format!("{subject} {}", action.past_tense())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::notify::NotificationKind;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::time::Duration;

    fn dispatcher() -> (ActionDispatcher, NotificationCenter) {
        let notifications = NotificationCenter::new(Duration::from_secs(60));
        (ActionDispatcher::new("promocode", notifications.clone()), notifications)
    }

    #[rstest]
    #[case(Action::Delete, true, Reconcile::Optimistic)]
    #[case(Action::ToggleStatus, false, Reconcile::Optimistic)]
    #[case(Action::Suspend, true, Reconcile::Refetch)]
    #[case(Action::Activate, false, Reconcile::Refetch)]
    #[case(Action::Create, false, Reconcile::Refetch)]
    #[case(Action::Update, false, Reconcile::Refetch)]
    fn test_action_policies(
        #[case] action: Action,
        #[case] destructive: bool,
        #[case] reconcile: Reconcile,
    ) {
        assert_eq!(action.is_destructive(), destructive);
        assert_eq!(action.reconcile(), reconcile);
    }

    #[test]
    fn test_second_claim_on_same_item_is_busy() {
        let pending = PendingActions::default();
        let guard = pending.begin("p1", Action::Delete).unwrap();

        assert!(matches!(pending.begin("p1", Action::ToggleStatus), Err(Error::Busy { .. })));
        assert!(pending.begin("p2", Action::ToggleStatus).is_ok());
        assert_eq!(pending.get("p1"), Some(Action::Delete));

        drop(guard);
        assert!(!pending.is_pending("p1"));
        assert!(pending.begin("p1", Action::ToggleStatus).is_ok());
    }

    #[test]
    fn test_claim_busy_notifies() {
        let (dispatcher, notifications) = dispatcher();
        let _guard = dispatcher.claim("p1", Action::Delete).unwrap();
        assert!(dispatcher.claim("p1", Action::Delete).is_err());

        let active = notifications.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active.first().map(|n| n.message.as_str()), Some("Please wait, still trying to delete promocode"));
    }

    #[test]
    fn test_confirm_only_asks_for_destructive_actions() {
        let (dispatcher, _) = dispatcher();
        let refuse = |_: &str| false;

        assert!(dispatcher.confirm(Action::ToggleStatus, "p1", &refuse));
        assert!(!dispatcher.confirm(Action::Delete, "p1", &refuse));
        assert!(dispatcher.confirm(Action::Delete, "p1", &AlwaysConfirm));
    }

    #[test]
    fn test_prompt_names_item() {
        let (dispatcher, _) = dispatcher();
        let seen = parking_lot::Mutex::new(String::new());
        let gate = |prompt: &str| {
            *seen.lock() = prompt.to_string();
            true
        };
        dispatcher.confirm(Action::Delete, "SPRING10", &gate);
        assert_eq!(*seen.lock(), "Are you sure you want to delete promocode SPRING10?");
    }

    #[tokio::test]
    async fn test_execute_notifies_success() {
        let (dispatcher, notifications) = dispatcher();
        let body = dispatcher
            .execute(Action::Create, async { Ok(serde_json::json!({"success": true})) })
            .await
            .unwrap();

        assert_eq!(body["success"], true);
        let active = notifications.active();
        assert_eq!(active.first().map(|n| n.kind), Some(NotificationKind::Success));
        assert_eq!(active.first().map(|n| n.message.as_str()), Some("Promocode created"));
    }

    #[rstest]
    #[case(Error::Http { status: 409, message: Some("Code already exists".into()) }, "Code already exists")]
    #[case(Error::Http { status: 500, message: None }, "Failed to delete promocode")]
    #[case(Error::Network("connection refused".into()), "Failed to delete promocode")]
    #[tokio::test]
    async fn test_execute_notifies_failure(#[case] error: Error, #[case] expected: &str) {
        let (dispatcher, notifications) = dispatcher();
        let result = dispatcher.execute(Action::Delete, async { Err(error) }).await;

        assert!(result.is_err());
        let active = notifications.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active.first().map(|n| n.kind), Some(NotificationKind::Error));
        assert_eq!(active.first().map(|n| n.message.as_str()), Some(expected));
    }
}
