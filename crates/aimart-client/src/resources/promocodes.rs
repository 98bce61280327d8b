//! Promocodes admin page

use super::{Deletable, Editable, Resource, Toggleable, status_matches};
use aimart_core::types::{
    lenient_bool, lenient_datetime, lenient_f64, lenient_id, lenient_or_default, lenient_u64,
};
use aimart_core::{Owner, RecordId};
use aimart_list::{Aggregate, FilterDimension, ListRecord, ListSchema, SortKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use validator::{Validate, ValidationError};

/// How a promocode discounts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// Percentage off the price
    #[default]
    Percentage,
    /// Fixed amount off the price
    Fixed,
}

impl DiscountType {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
        }
    }
}

/// Lifecycle state of a promocode at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromoStatus {
    /// Enabled and within its validity window
    Active,
    /// Disabled by an admin
    Inactive,
    /// Past its `validUntil` date
    Expired,
}

impl PromoStatus {
    /// Filter value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Expired => "expired",
        }
    }
}

/// A discount code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promocode {
    /// Record id
    #[serde(alias = "_id", deserialize_with = "lenient_id")]
    pub id: RecordId,

    /// Code customers type at checkout
    #[serde(default)]
    pub code: String,

    /// Admin-facing description
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub description: Option<String>,

    /// Percentage or fixed
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub discount_type: DiscountType,

    /// Discount amount, in percent or currency depending on the type
    #[serde(default, deserialize_with = "lenient_f64")]
    pub discount_value: Option<f64>,

    /// Enabled flag
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_active: Option<bool>,

    /// Redemptions so far
    #[serde(default, deserialize_with = "lenient_u64")]
    pub usage_count: Option<u64>,

    /// Maximum redemptions, unlimited when absent
    #[serde(default, deserialize_with = "lenient_u64")]
    pub usage_limit: Option<u64>,

    /// Start of the validity window
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub valid_from: Option<DateTime<Utc>>,

    /// End of the validity window
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub valid_until: Option<DateTime<Utc>>,

    /// Creation time
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,

    /// Admin who created the code
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub created_by: Option<Owner>,
}

impl Promocode {
    /// Whether the enabled flag is set
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active == Some(true)
    }

    /// Status at `now`; expiry wins over the enabled flag
    #[must_use]
    pub fn status(&self, now: DateTime<Utc>) -> PromoStatus {
        match (self.valid_until, self.is_active()) {
            (Some(until), _) if until <= now => PromoStatus::Expired,
            (_, true) => PromoStatus::Active,
            (_, false) => PromoStatus::Inactive,
        }
    }

    fn discount_label(&self) -> String {
        let value = self.discount_value.unwrap_or_default();
        match self.discount_type {
            DiscountType::Percentage => format!("{value}%"),
            DiscountType::Fixed => format!("${value:.2}"),
        }
    }
}

impl fmt::Display for Promocode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let usage = match self.usage_limit {
            Some(limit) => format!("{}/{limit}", self.usage_count.unwrap_or_default()),
            None => self.usage_count.unwrap_or_default().to_string(),
        };
        write!(
            f,
            "{:<24} {:<16} {:>8} {:<8} used {usage}",
            self.id,
            self.code,
            self.discount_label(),
            self.status(Utc::now()).as_str()
        )
    }
}

impl ListRecord for Promocode {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.code.as_str()];
        fields.extend(self.description.as_deref());
        if let Some(owner) = &self.created_by {
            fields.extend(owner.name.as_deref());
            fields.extend(owner.email.as_deref());
        }
        fields
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn price(&self) -> Option<f64> {
        self.discount_value
    }

    fn popularity(&self) -> Option<f64> {
        self.usage_count.map(|n| n as f64)
    }
}

/// Create/update payload for a promocode
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_promocode"))]
pub struct PromocodeForm {
    /// Code customers type at checkout
    #[validate(
        length(min = 3, max = 32, message = "Code must be 3 to 32 characters"),
        custom(function = "validate_code")
    )]
    pub code: String,

    /// Admin-facing description
    #[validate(length(max = 500, message = "Description is too long"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Percentage or fixed
    pub discount_type: DiscountType,

    /// Discount amount
    #[validate(range(exclusive_min = 0.0, message = "Discount must be greater than zero"))]
    pub discount_value: f64,

    /// Maximum redemptions
    #[validate(range(min = 1, message = "Usage limit must be at least 1"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u64>,

    /// Start of the validity window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,

    /// End of the validity window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,

    /// Enabled flag
    pub is_active: bool,
}

fn validate_code(code: &str) -> Result<(), ValidationError> {
    if code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Ok(());
    }
    let mut error = ValidationError::new("code_format");
    error.message = Some(Cow::Borrowed(
        "Code may only contain letters, digits, dashes and underscores",
    ));
    Err(error)
}

fn validate_promocode(form: &PromocodeForm) -> Result<(), ValidationError> {
    if form.discount_type == DiscountType::Percentage && form.discount_value > 100.0 {
        let mut error = ValidationError::new("discount_range");
        error.message = Some(Cow::Borrowed("Percentage discount cannot exceed 100"));
        return Err(error);
    }
    if let (Some(from), Some(until)) = (form.valid_from, form.valid_until)
        && until <= from
    {
        let mut error = ValidationError::new("validity_window");
        error.message = Some(Cow::Borrowed("Valid until must be after valid from"));
        return Err(error);
    }
    Ok(())
}

/// The promocodes collection
#[derive(Debug, Clone, Copy, Default)]
pub struct Promocodes;

impl Resource for Promocodes {
    type Record = Promocode;

    const NAME: &'static str = "promocodes";
    const SINGULAR: &'static str = "promocode";

    fn schema() -> ListSchema<Promocode> {
        ListSchema::new(Self::NAME)
            .filter(
                FilterDimension::new("status", |p: &Promocode, value: &str, now| {
                    p.status(now).as_str().eq_ignore_ascii_case(value)
                })
                .with_options(["active", "inactive", "expired"]),
            )
            .filter(
                FilterDimension::exact("type", |p: &Promocode| {
                    Some(p.discount_type.as_str().to_string())
                })
                .with_options(["percentage", "fixed"]),
            )
            .filter(
                FilterDimension::new("enabled", |p: &Promocode, value: &str, _| {
                    status_matches(p.is_active, value)
                })
                .with_options(["active", "inactive"]),
            )
            .aggregate(Aggregate::count("active", Promocode::is_active))
            .aggregate(Aggregate::sum("total_usage", |p: &Promocode| {
                p.usage_count.map(|n| n as f64)
            }))
            .aggregate(Aggregate::average("avg_discount", |p: &Promocode| p.discount_value))
            .default_sort(SortKey::Recent)
    }
}

impl Editable for Promocodes {
    type Form = PromocodeForm;
}

impl Toggleable for Promocodes {
    fn toggle(record: &mut Promocode) {
        record.is_active = Some(!record.is_active());
    }
}

impl Deletable for Promocodes {}
