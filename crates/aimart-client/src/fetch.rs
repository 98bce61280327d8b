//! Collection fetching with supersession and cancellation
//!
//! A list page may issue a new fetch before the previous one answered (the
//! user changed a filter, a mutation triggered a refetch). Only the newest
//! fetch is allowed to land; older ones are cancelled and, should they race
//! past cancellation, recognized as stale by their generation. Closing the
//! page cancels everything still in flight.

use crate::api_client::ApiClient;
use crate::envelope;
use aimart_core::config::ListConfig;
use aimart_core::{Error, Result};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A decoded list response, possibly assembled from several server pages
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedList<T> {
    /// Records that decoded successfully, in server order
    pub records: Vec<T>,
    /// Collection size reported by the server
    pub total: Option<u64>,
    /// Page count reported by the server
    pub total_pages: Option<u32>,
    /// Raw items received, including ones that failed to decode
    pub received: usize,
    /// Server pages requested
    pub pages: u32,
}

impl<T> FetchedList<T> {
    /// How many items the server reported beyond what was received
    #[must_use]
    pub fn missing(&self) -> Option<u64> {
        let received = u64::try_from(self.received).unwrap_or(u64::MAX);
        self.total
            .filter(|&total| total > received)
            .map(|total| total - received)
    }
}

/// Page size and page cap for pulling one collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPlan {
    /// Records requested per server page
    pub limit: u32,
    /// Most server pages requested
    pub max_pages: u32,
}

impl FetchPlan {
    /// Plan from the list configuration
    #[must_use]
    pub fn from_config(config: &ListConfig) -> Self {
        Self {
            limit: config.fetch_limit.max(1),
            max_pages: config.max_fetch_pages.max(1),
        }
    }

    fn query(self, page: u32, filters: &[(String, String)]) -> Vec<(String, String)> {
        let mut query = vec![
            ("page".to_string(), page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];
        query.extend_from_slice(filters);
        query
    }
}

/// Handle for one in-flight fetch
#[derive(Debug, Clone)]
pub struct FetchTicket {
    generation: u64,
    token: CancellationToken,
}

impl FetchTicket {
    /// Generation number of this fetch
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this fetch has been superseded or the page closed
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Tracks which fetch is current and whether one is loading
#[derive(Debug, Default)]
pub struct FetchTracker {
    generation: AtomicU64,
    loading: AtomicBool,
    current: Mutex<Option<CancellationToken>>,
    closed: CancellationToken,
}

impl FetchTracker {
    /// Fresh tracker with nothing in flight
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new fetch, cancelling whichever one was current
    pub fn begin(&self) -> FetchTicket {
        let token = self.closed.child_token();
        let previous = self.current.lock().replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.closed.is_cancelled() {
            self.loading.store(true, Ordering::SeqCst);
        }
        FetchTicket { generation, token }
    }

    /// Whether `ticket` is the newest fetch and the page is still open
    #[must_use]
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        !self.closed.is_cancelled()
            && !ticket.is_cancelled()
            && self.generation.load(Ordering::SeqCst) == ticket.generation
    }

    /// Mark `ticket` finished; clears the loading flag if it was current
    pub fn finish(&self, ticket: &FetchTicket) {
        if self.generation.load(Ordering::SeqCst) == ticket.generation {
            self.loading.store(false, Ordering::SeqCst);
        }
    }

    /// Whether the current fetch is still outstanding
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Cancel everything in flight and refuse further results
    pub fn close(&self) {
        self.closed.cancel();
        self.loading.store(false, Ordering::SeqCst);
    }

    /// Whether [`close`](Self::close) was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

/// Fetch and decode one collection
///
/// Server pages of `plan.limit` records are requested in turn until the
/// reported total is reached, the server runs out of pages, or
/// `plan.max_pages` is hit. `filters` are sent with every page.
///
/// # Errors
///
/// Returns `Error::Cancelled` if `ticket` is cancelled before the last
/// response arrives, or the transport or HTTP error from the client.
/// Malformed bodies and malformed records are not errors; they decode to
/// fewer records.
pub async fn fetch_list<T: DeserializeOwned>(
    client: &ApiClient,
    resource: &str,
    filters: &[(String, String)],
    plan: FetchPlan,
    ticket: &FetchTicket,
) -> Result<FetchedList<T>> {
    let limit = usize::try_from(plan.limit).unwrap_or(usize::MAX);
    let mut list = FetchedList {
        records: Vec::new(),
        total: None,
        total_pages: None,
        received: 0,
        pages: 0,
    };

    loop {
        if ticket.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let page = list.pages + 1;
        let query = plan.query(page, filters);
        let body = tokio::select! {
            () = ticket.token.cancelled() => {
                debug!(resource, page, generation = ticket.generation, "fetch cancelled");
                return Err(Error::Cancelled);
            }
            result = client.get(resource, &query) => result?,
        };

        let envelope = envelope::normalize(&body);
        let count = envelope.items.len();
        list.pages = page;
        list.received = list.received.saturating_add(count);
        list.total = envelope.total.or(list.total);
        list.total_pages = envelope.total_pages.or(list.total_pages);
        list.records.extend(envelope::decode_items(resource, envelope.items));

        let more = count > 0
            && match (list.total, list.total_pages) {
                (Some(_), _) => list.missing().is_some(),
                (None, Some(pages)) => page < pages,
                (None, None) => count >= limit,
            };
        if !more {
            break;
        }
        if page >= plan.max_pages {
            debug!(resource, pages = page, "page cap reached");
            break;
        }
    }

    Ok(list)
}
