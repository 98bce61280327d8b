//! Purchase history page

use super::Resource;
use aimart_core::types::{lenient_datetime, lenient_f64, lenient_id, lenient_or_default};
use aimart_core::{Owner, RecordId};
use aimart_list::{Aggregate, FilterDimension, ListRecord, ListSchema, SortKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of product bought
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    /// Prompt template
    #[default]
    Prompt,
    /// Workflow automation
    Automation,
    /// Autonomous agent
    Agent,
    /// Several products sold together
    Bundle,
}

impl ProductType {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Automation => "automation",
            Self::Agent => "agent",
            Self::Bundle => "bundle",
        }
    }
}

/// Payment state of a purchase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    /// Paid and delivered
    Completed,
    /// Awaiting payment
    #[default]
    Pending,
    /// Money returned
    Refunded,
}

impl PurchaseStatus {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Refunded => "refunded",
        }
    }
}

/// One purchase in a buyer's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    /// Record id
    #[serde(alias = "_id", deserialize_with = "lenient_id")]
    pub id: RecordId,

    /// Title of the product at purchase time
    #[serde(default, alias = "title")]
    pub product_title: String,

    /// Product kind
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub product_type: ProductType,

    /// Amount paid
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,

    /// Payment state
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub status: PurchaseStatus,

    /// Seller of the product
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub seller: Option<Owner>,

    /// Rating the buyer left, if any
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rating: Option<f64>,

    /// Purchase time
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Purchase {
    fn price_bracket(&self) -> &'static str {
        match self.price.unwrap_or_default() {
            p if p <= 0.0 => "free",
            p if p < 10.0 => "under-10",
            p if p < 50.0 => "10-50",
            _ => "50-plus",
        }
    }
}

impl fmt::Display for Purchase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<24} {:<32} {:<10} {:<9} ${:>8.2} {}",
            self.id,
            self.product_title,
            self.product_type.as_str(),
            self.status.as_str(),
            self.price.unwrap_or_default(),
            self.seller.as_ref().map_or("-", Owner::display_name)
        )
    }
}

impl ListRecord for Purchase {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.product_title.as_str()];
        if let Some(seller) = &self.seller {
            fields.extend(seller.name.as_deref());
            fields.extend(seller.email.as_deref());
        }
        fields
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn price(&self) -> Option<f64> {
        self.price
    }

    fn rating(&self) -> Option<f64> {
        self.rating
    }
}

/// The purchases collection (read-only)
#[derive(Debug, Clone, Copy, Default)]
pub struct Purchases;

impl Resource for Purchases {
    type Record = Purchase;

    const NAME: &'static str = "purchases";
    const SINGULAR: &'static str = "purchase";

    fn schema() -> ListSchema<Purchase> {
        ListSchema::new(Self::NAME)
            .filter(
                FilterDimension::exact("status", |p: &Purchase| Some(p.status.as_str().to_string()))
                    .with_options(["completed", "pending", "refunded"]),
            )
            .filter(
                FilterDimension::exact("type", |p: &Purchase| {
                    Some(p.product_type.as_str().to_string())
                })
                .with_options(["prompt", "automation", "agent", "bundle"]),
            )
            .filter(
                FilterDimension::new("price", |p: &Purchase, value: &str, _| {
                    p.price_bracket().eq_ignore_ascii_case(value)
                })
                .with_options(["free", "under-10", "10-50", "50-plus"]),
            )
            .aggregate(Aggregate::sum("revenue", |p: &Purchase| p.price))
            .aggregate(Aggregate::count("completed", |p: &Purchase| {
                p.status == PurchaseStatus::Completed
            }))
            .aggregate(Aggregate::average("avg_price", |p: &Purchase| p.price))
            .aggregate(Aggregate::average("avg_rating", |p: &Purchase| p.rating))
            .default_sort(SortKey::Recent)
    }
}
