//! Sellers admin page

use super::{Resource, Suspendable};
use aimart_core::RecordId;
use aimart_core::types::{
    lenient_datetime, lenient_f64, lenient_id, lenient_or_default, lenient_u64,
};
use aimart_list::{Aggregate, FilterDimension, ListRecord, ListSchema, SortKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Earnings at or above this land in the top bracket
const EARNINGS_BRACKET: f64 = 1000.0;

/// Seller verification state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SellerStatus {
    /// Awaiting review
    #[default]
    Pending,
    /// Approved to sell
    Verified,
    /// Application refused
    Rejected,
    /// Selling blocked by an admin
    Suspended,
}

impl SellerStatus {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
            Self::Suspended => "suspended",
        }
    }
}

/// A seller account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    /// Record id
    #[serde(alias = "_id", deserialize_with = "lenient_id")]
    pub id: RecordId,

    /// Display name
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub name: Option<String>,

    /// Contact email
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub email: Option<String>,

    /// Verification state
    #[serde(default, alias = "verificationStatus", deserialize_with = "lenient_or_default")]
    pub status: SellerStatus,

    /// Lifetime earnings
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_earnings: Option<f64>,

    /// Products sold
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_sales: Option<u64>,

    /// Average buyer rating
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rating: Option<f64>,

    /// Platform commission, in percent
    #[serde(default, deserialize_with = "lenient_f64")]
    pub commission_rate: Option<f64>,

    /// Sign-up time
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Seller {
    fn earnings_bracket(&self) -> &'static str {
        match self.total_earnings.unwrap_or_default() {
            e if e <= 0.0 => "none",
            e if e < EARNINGS_BRACKET => "under-1000",
            _ => "1000-plus",
        }
    }
}

impl fmt::Display for Seller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<24} {:<20} {:<28} {:<9} ${:>10.2} {:>5} sales",
            self.id,
            self.name.as_deref().unwrap_or("-"),
            self.email.as_deref().unwrap_or("-"),
            self.status.as_str(),
            self.total_earnings.unwrap_or_default(),
            self.total_sales.unwrap_or_default()
        )
    }
}

impl ListRecord for Seller {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        self.name.as_deref().into_iter().chain(self.email.as_deref()).collect()
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn price(&self) -> Option<f64> {
        self.total_earnings
    }

    fn rating(&self) -> Option<f64> {
        self.rating
    }

    fn popularity(&self) -> Option<f64> {
        self.total_sales.map(|n| n as f64)
    }
}

/// The sellers collection
#[derive(Debug, Clone, Copy, Default)]
pub struct Sellers;

impl Resource for Sellers {
    type Record = Seller;

    const NAME: &'static str = "sellers";
    const SINGULAR: &'static str = "seller";

    fn schema() -> ListSchema<Seller> {
        ListSchema::new(Self::NAME)
            .filter(
                FilterDimension::exact("status", |s: &Seller| Some(s.status.as_str().to_string()))
                    .with_options(["pending", "verified", "rejected", "suspended"]),
            )
            .filter(
                FilterDimension::new("earnings", |s: &Seller, value: &str, _| {
                    s.earnings_bracket().eq_ignore_ascii_case(value)
                })
                .with_options(["none", "under-1000", "1000-plus"]),
            )
            .aggregate(Aggregate::sum("total_earnings", |s: &Seller| s.total_earnings))
            .aggregate(Aggregate::count("verified", |s: &Seller| {
                s.status == SellerStatus::Verified
            }))
            .aggregate(Aggregate::count("pending", |s: &Seller| {
                s.status == SellerStatus::Pending
            }))
            .aggregate(Aggregate::average("avg_rating", |s: &Seller| s.rating))
            .default_sort(SortKey::Recent)
    }
}

impl Suspendable for Sellers {}
