//! Search, filter, sort, aggregate and paginate engine for aimart list pages
//!
//! Every admin and buyer list page runs the same three stages: fetch a
//! collection, derive a filtered and sorted view with aggregate stats, and
//! slice that view into pages. This crate is the synchronous part of that
//! pipeline; fetching lives in `aimart-client`.
//!
//! A page is configured with a [`ListSchema`] naming its filter dimensions
//! and aggregates, and driven through a [`ListController`].

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod aggregate;
pub mod controller;
pub mod debounce;
pub mod derive;
pub mod pagination;
pub mod record;
pub mod schema;
pub mod sort;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::Aggregates;
pub use controller::{ListController, ListView, Removed};
pub use debounce::Debouncer;
pub use derive::{Derived, derive};
pub use pagination::{PaginationState, paginate};
pub use record::{ListRecord, SortKey};
pub use schema::{Aggregate, FilterDimension, ListSchema};
pub use state::{ALL, FilterState};
