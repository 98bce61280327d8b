//! aimart marketplace client
//!
//! Talks to the marketplace REST API and runs the admin and buyer list pages
//! on top of the `aimart-list` engine: fetching with supersession, optimistic
//! actions with rollback, and transient notifications.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod api_client;
pub mod dispatch;
pub mod envelope;
pub mod fetch;
pub mod notify;
pub mod page;
pub mod resources;

// Re-export the main types
pub use api_client::ApiClient;
pub use dispatch::{Action, AlwaysConfirm, ConfirmationGate, Outcome};
pub use notify::{Notification, NotificationCenter, NotificationKind};
pub use page::{ListPage, PageView};
pub use resources::Resource;
