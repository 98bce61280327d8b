//! A live list page: fetch, derive, paginate and act on one resource
//!
//! [`ListPage`] owns the page's [`ListController`] behind a mutex that is
//! only ever held for synchronous work, never across an `.await`.

use crate::api_client::ApiClient;
use crate::dispatch::{Action, ActionDispatcher, ConfirmationGate, Outcome, PendingActions};
use crate::fetch::{self, FetchPlan, FetchTracker};
use crate::notify::{Notification, NotificationCenter};
use crate::resources::{Deletable, Editable, Resource, Suspendable, Toggleable, validate_form};
use aimart_core::{Config, Error, Result};
use aimart_list::{Debouncer, ListController, ListView, SortKey};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reqwest::Method;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Everything a list page renders
#[derive(Debug, Clone, PartialEq)]
pub struct PageView<T> {
    /// Current page of records, pagination and aggregates
    pub list: ListView<T>,
    /// Whether a fetch is outstanding
    pub loading: bool,
    /// Notifications still visible
    pub notifications: Vec<Notification>,
    /// Ids with an action in flight
    pub pending: Vec<String>,
    /// Whether the snapshot was fetched with different server-side filters
    /// than the current ones; call [`ListPage::refresh`] to catch up
    pub stale: bool,
}

/// List page for resource `R`
///
/// Clones share the same state, so a handle can be moved into a spawned
/// task while the original keeps rendering.
pub struct ListPage<R: Resource> {
    client: ApiClient,
    controller: Arc<Mutex<ListController<R::Record>>>,
    tracker: Arc<FetchTracker>,
    search: Arc<Mutex<Debouncer<String>>>,
    notifications: NotificationCenter,
    dispatcher: ActionDispatcher,
    plan: FetchPlan,
    fetched_query: Arc<Mutex<Option<ServerQuery>>>,
    resource: PhantomData<fn() -> R>,
}

type ServerQuery = Vec<(String, String)>;

impl<R: Resource> Clone for ListPage<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            controller: Arc::clone(&self.controller),
            tracker: Arc::clone(&self.tracker),
            search: Arc::clone(&self.search),
            notifications: self.notifications.clone(),
            dispatcher: self.dispatcher.clone(),
            plan: self.plan,
            fetched_query: Arc::clone(&self.fetched_query),
            resource: PhantomData,
        }
    }
}

impl<R: Resource> fmt::Debug for ListPage<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListPage")
            .field("resource", &R::NAME)
            .field("loading", &self.tracker.is_loading())
            .field("closed", &self.tracker.is_closed())
            .finish_non_exhaustive()
    }
}

impl<R: Resource> ListPage<R> {
    /// Page with an empty snapshot; call [`refresh`](Self::refresh) to load
    #[must_use]
    pub fn new(client: ApiClient, config: &Config) -> Self {
        let notifications = NotificationCenter::from_config(&config.notifications);
        let controller = ListController::new(Arc::new(R::schema()), &config.list);
        Self {
            client,
            controller: Arc::new(Mutex::new(controller)),
            tracker: Arc::new(FetchTracker::new()),
            search: Arc::new(Mutex::new(Debouncer::new(config.list.search_debounce()))),
            dispatcher: ActionDispatcher::new(R::SINGULAR, notifications.clone()),
            notifications,
            plan: FetchPlan::from_config(&config.list),
            fetched_query: Arc::new(Mutex::new(None)),
            resource: PhantomData,
        }
    }

    /// Notification queue of this page
    #[must_use]
    pub const fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    /// Items with an action in flight
    #[must_use]
    pub const fn pending(&self) -> &PendingActions {
        self.dispatcher.pending()
    }

    /// Whether a fetch is outstanding
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.tracker.is_loading()
    }

    /// Whether the page was closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tracker.is_closed()
    }

    /// Fetch the collection and swap it in
    ///
    /// A newer refresh supersedes this one; a superseded or closed refresh
    /// returns `Ok(())` without touching the snapshot. On failure the prior
    /// snapshot is kept and an error notification is shown. If the server
    /// reports more records than the page cap let through, a warning is
    /// logged and an info notification says how many are shown.
    ///
    /// # Errors
    ///
    /// Returns the transport or HTTP error of a refresh that was still
    /// current when it failed.
    pub async fn refresh(&self) -> Result<()> {
        let ticket = self.tracker.begin();
        let filters = self.server_query();
        debug!(resource = R::NAME, generation = ticket.generation(), "fetching list");

        let result =
            fetch::fetch_list::<R::Record>(&self.client, R::NAME, &filters, self.plan, &ticket)
                .await;
        let current = self.tracker.is_current(&ticket);
        self.tracker.finish(&ticket);

        match result {
            Ok(list) if current => {
                if let (Some(missing), Some(total)) = (list.missing(), list.total) {
                    warn!(
                        resource = R::NAME,
                        received = list.received,
                        missing,
                        pages = list.pages,
                        "collection truncated at page cap"
                    );
                    self.notifications.info(format!(
                        "Showing the first {} of {total} {}",
                        list.received,
                        R::NAME
                    ));
                }
                self.controller.lock().replace_records(list.records, list.total);
                *self.fetched_query.lock() = Some(filters);
                Ok(())
            }
            Ok(_) | Err(Error::Cancelled) => {
                debug!(
                    resource = R::NAME,
                    generation = ticket.generation(),
                    "dropping stale list response"
                );
                Ok(())
            }
            Err(e) if current => {
                warn!(resource = R::NAME, error = %e, "list fetch failed");
                self.notifications
                    .error(e.user_message(&format!("load {}", R::NAME)));
                Err(e)
            }
            Err(e) => {
                debug!(resource = R::NAME, error = %e, "ignoring failure of stale fetch");
                Ok(())
            }
        }
    }

    fn server_query(&self) -> ServerQuery {
        R::server_query(self.controller.lock().state())
    }

    /// Whether the snapshot predates a change to the server-side filters
    /// (or was never fetched)
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        let current = self.server_query();
        self.fetched_query.lock().as_ref() != Some(&current)
    }

    /// Render the page at `now`
    #[must_use]
    pub fn view_at(&self, now: DateTime<Utc>) -> PageView<R::Record> {
        let list = self.controller.lock().view_at(now);
        PageView {
            list,
            loading: self.tracker.is_loading(),
            notifications: self.notifications.active(),
            pending: self.dispatcher.pending().ids(),
            stale: self.needs_refresh(),
        }
    }

    /// Render the page using the wall clock
    #[must_use]
    pub fn view(&self) -> PageView<R::Record> {
        self.view_at(Utc::now())
    }

    /// Run `f` against the controller while holding its lock
    pub fn with_controller<F, O>(&self, f: F) -> O
    where
        F: FnOnce(&mut ListController<R::Record>) -> O,
    {
        f(&mut self.controller.lock())
    }

    /// Apply a search term immediately, dropping any pending keystrokes
    pub fn set_search(&self, term: impl Into<String>) -> bool {
        let _ = self.search.lock().flush();
        self.controller.lock().set_search(term)
    }

    /// Record a keystroke; the term is applied once typing pauses
    pub fn type_search(&self, term: impl Into<String>) {
        self.search.lock().push(term.into(), Instant::now().into_std());
    }

    /// Apply the typed search term if its quiet period is over; returns
    /// whether the view changed
    pub fn poll_search(&self) -> bool {
        let released = self.search.lock().poll(Instant::now().into_std());
        released.is_some_and(|term| self.controller.lock().set_search(term))
    }

    /// Wait out the quiet period of a pending search term, then apply it
    pub async fn settle_search(&self) -> bool {
        let remaining = self.search.lock().remaining(Instant::now().into_std());
        if let Some(remaining) = remaining {
            tokio::time::sleep(remaining).await;
        }
        self.poll_search()
    }

    /// Set a filter dimension
    ///
    /// Only the local snapshot is re-derived. If the dimension is also sent
    /// to the server, [`needs_refresh`](Self::needs_refresh) turns true until
    /// the next [`refresh`](Self::refresh); [`apply_filter`](Self::apply_filter)
    /// does both.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for an unknown dimension or value.
    pub fn set_filter(&self, name: &str, value: &str) -> Result<bool> {
        self.controller.lock().set_filter(name, value)
    }

    /// Set a filter dimension, refetching when the server-side filters
    /// changed
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for an unknown dimension or value, or
    /// the error of the refetch.
    pub async fn apply_filter(&self, name: &str, value: &str) -> Result<bool> {
        let changed = self.set_filter(name, value)?;
        if self.needs_refresh() {
            self.refresh().await?;
        }
        Ok(changed)
    }

    /// Reset search and filters
    pub fn clear_filters(&self) -> bool {
        let _ = self.search.lock().flush();
        self.controller.lock().clear_filters()
    }

    /// Set the sort key
    pub fn set_sort(&self, sort: SortKey) -> bool {
        self.controller.lock().set_sort(sort)
    }

    /// Go to `page`; out-of-range pages are ignored
    pub fn set_page(&self, page: u32) -> bool {
        self.controller.lock().set_page(page)
    }

    /// Set the page size
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if `size` is not a configured option.
    pub fn set_page_size(&self, size: u32) -> Result<bool> {
        self.controller.lock().set_page_size(size)
    }

    /// Close the page: cancel in-flight fetches and ignore late responses
    pub fn close(&self) {
        info!(resource = R::NAME, "closing list page");
        self.tracker.close();
    }

    async fn refetch_after(&self, action: Action) {
        if let Err(e) = self.refresh().await {
            debug!(resource = R::NAME, %action, error = %e, "refetch after action failed");
        }
    }
}

impl<R: Editable> ListPage<R> {
    /// Validate and create a record, then refetch
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` without sending anything if the form is
    /// invalid, or the request's error.
    pub async fn create(&self, form: &R::Form) -> Result<Outcome> {
        let body = self.form_body(Action::Create, form)?;
        self.dispatcher
            .execute(
                Action::Create,
                self.client.send(Method::POST, R::NAME, Some(&body)),
            )
            .await?;
        self.refetch_after(Action::Create).await;
        Ok(Outcome::Applied)
    }

    /// Validate and update a record, then refetch
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` without sending anything if the form is
    /// invalid, `Error::Busy` if the item has an action in flight, or the
    /// request's error.
    pub async fn update(&self, id: &str, form: &R::Form) -> Result<Outcome> {
        let body = self.form_body(Action::Update, form)?;
        let _guard = self.dispatcher.claim(id, Action::Update)?;
        self.dispatcher
            .execute(
                Action::Update,
                self.client.send(Method::PUT, &R::item_path(id), Some(&body)),
            )
            .await?;
        self.refetch_after(Action::Update).await;
        Ok(Outcome::Applied)
    }

    fn form_body(&self, action: Action, form: &R::Form) -> Result<serde_json::Value> {
        validate_form(form)
            .and_then(|()| serde_json::to_value(form).map_err(Error::from))
            .inspect_err(|e| self.dispatcher.reject(action, e))
    }
}

impl<R: Toggleable> ListPage<R> {
    /// Flip a record's active flag
    ///
    /// The local copy flips first; if the request fails it is restored
    /// (unless a newer snapshot already replaced it) and the collection
    /// refetched.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the record is not in the snapshot,
    /// `Error::Busy` if it has an action in flight, or the request's error.
    pub async fn toggle_status(&self, id: &str) -> Result<Outcome> {
        let _guard = self.dispatcher.claim(id, Action::ToggleStatus)?;
        let (previous, revision) = {
            let mut controller = self.controller.lock();
            let revision = controller.revision();
            (controller.patch(id, R::toggle), revision)
        };
        let previous = previous
            .ok_or_else(|| Error::not_found(format!("{} {id}", R::SINGULAR)))
            .inspect_err(|e| self.dispatcher.reject(Action::ToggleStatus, e))?;

        let path = format!("{}/toggle-status", R::item_path(id));
        let result = self
            .dispatcher
            .execute(
                Action::ToggleStatus,
                self.client.send(Method::PATCH, &path, None),
            )
            .await;

        if let Err(e) = result {
            info!(resource = R::NAME, id, "rolling back status toggle");
            self.controller.lock().rollback(previous, revision);
            self.refetch_after(Action::ToggleStatus).await;
            return Err(e);
        }
        Ok(Outcome::Applied)
    }
}

impl<R: Deletable> ListPage<R> {
    /// Delete a record after confirmation
    ///
    /// The record disappears from the view immediately; if the request fails
    /// it is put back at its old position and the collection refetched.
    ///
    /// # Errors
    ///
    /// Returns `Error::Busy` if the record has an action in flight, or the
    /// request's error.
    pub async fn delete(&self, id: &str, gate: &dyn ConfirmationGate) -> Result<Outcome> {
        if !self.dispatcher.confirm(Action::Delete, id, gate) {
            return Ok(Outcome::Declined);
        }
        let _guard = self.dispatcher.claim(id, Action::Delete)?;
        let removed = self.controller.lock().remove(id);

        let result = self
            .dispatcher
            .execute(
                Action::Delete,
                self.client.send(Method::DELETE, &R::item_path(id), None),
            )
            .await;

        if let Err(e) = result {
            if let Some(removed) = removed {
                info!(resource = R::NAME, id, "rolling back delete");
                self.controller.lock().restore(removed);
            }
            self.refetch_after(Action::Delete).await;
            return Err(e);
        }
        Ok(Outcome::Applied)
    }
}

impl<R: Suspendable> ListPage<R> {
    /// Suspend an account after confirmation, then refetch
    ///
    /// # Errors
    ///
    /// Returns `Error::Busy` if the account has an action in flight, or the
    /// request's error.
    pub async fn suspend(&self, id: &str, gate: &dyn ConfirmationGate) -> Result<Outcome> {
        if !self.dispatcher.confirm(Action::Suspend, id, gate) {
            return Ok(Outcome::Declined);
        }
        self.post_and_refetch(Action::Suspend, id, "suspend").await
    }

    /// Reactivate a suspended account, then refetch
    ///
    /// # Errors
    ///
    /// Returns `Error::Busy` if the account has an action in flight, or the
    /// request's error.
    pub async fn activate(&self, id: &str) -> Result<Outcome> {
        self.post_and_refetch(Action::Activate, id, "activate").await
    }

    async fn post_and_refetch(&self, action: Action, id: &str, verb: &str) -> Result<Outcome> {
        let _guard = self.dispatcher.claim(id, action)?;
        let path = format!("{}/{verb}", R::item_path(id));
        self.dispatcher
            .execute(action, self.client.send(Method::POST, &path, None))
            .await?;
        self.refetch_after(action).await;
        Ok(Outcome::Applied)
    }
}
