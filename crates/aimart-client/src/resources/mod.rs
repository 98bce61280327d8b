//! Marketplace resources served as list pages
//!
//! Each resource ties a record type to its endpoint and [`ListSchema`].
//! Capabilities beyond listing are opt-in through the [`Editable`],
//! [`Toggleable`], [`Deletable`] and [`Suspendable`] traits, so a page only
//! offers actions its backend supports.

pub mod promocodes;
pub mod purchases;
pub mod sellers;
pub mod tools;
pub mod users;

pub use promocodes::{Promocode, PromocodeForm, Promocodes};
pub use purchases::{Purchase, Purchases};
pub use sellers::{Seller, Sellers};
pub use tools::{Tool, ToolForm, Tools};
pub use users::{User, Users};

use aimart_core::{Error, Result};
use aimart_list::{FilterState, ListRecord, ListSchema};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::{Debug, Display};
use validator::{Validate, ValidationErrors};

/// A collection served at `/v1/{NAME}`
pub trait Resource: Send + Sync + 'static {
    /// Record type of the collection
    type Record: ListRecord + DeserializeOwned + Serialize + Debug + Display;

    /// Path segment and display name, e.g. `promocodes`
    const NAME: &'static str;

    /// Singular noun used in messages, e.g. `promocode`
    const SINGULAR: &'static str;

    /// Filters, aggregates and default sort of the list page
    fn schema() -> ListSchema<Self::Record>;

    /// Filters the backend applies itself, sent alongside the client-side
    /// ones
    fn server_query(_state: &FilterState) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Path of one item
    #[must_use]
    fn item_path(id: &str) -> String {
        format!("{}/{id}", Self::NAME)
    }
}

/// Resources that can be created and edited through a form
pub trait Editable: Resource {
    /// Create/update payload
    type Form: Serialize + Validate + Send + Sync;
}

/// Resources with an active flag flipped by `PATCH {id}/toggle-status`
pub trait Toggleable: Resource {
    /// Apply the toggle to a local copy
    fn toggle(record: &mut Self::Record);
}

/// Resources that can be deleted
pub trait Deletable: Resource {}

/// Accounts that can be suspended and reactivated
pub trait Suspendable: Resource {}

/// First field error of a failed validation, as `Error::Validation`
///
/// Fields are visited in name order so the reported error is stable.
#[must_use]
pub fn validation_error(errors: &ValidationErrors) -> Error {
    let mut fields: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            let field = field.to_string();
            let err = errs.first()?;
            let message = err
                .message
                .as_ref()
                .map_or_else(|| format!("{field} is invalid ({})", err.code), ToString::to_string);
            Some((field, message))
        })
        .collect();
    fields.sort();

    fields.into_iter().next().map_or_else(
        || Error::validation("form", "invalid input"),
        |(field, message)| {
            let field = if field == "__all__" { "form".to_string() } else { field };
            Error::validation(field, message)
        },
    )
}

/// Validate a form, converting the first failure into `Error::Validation`
///
/// # Errors
///
/// Returns `Error::Validation` if any rule fails.
pub fn validate_form<F: Validate>(form: &F) -> Result<()> {
    form.validate().map_err(|e| validation_error(&e))
}

/// Active/inactive predicate shared by resources with an `isActive` flag
pub(crate) fn status_matches(is_active: Option<bool>, value: &str) -> bool {
    match value.to_ascii_lowercase().as_str() {
        "active" => is_active == Some(true),
        "inactive" => is_active != Some(true),
        _ => false,
    }
}
