//! Users admin page

use super::{Deletable, Resource, Toggleable, status_matches};
use aimart_core::RecordId;
use aimart_core::types::{
    lenient_bool, lenient_datetime, lenient_f64, lenient_id, lenient_or_default, lenient_u64,
};
use aimart_list::{ALL, Aggregate, FilterDimension, FilterState, ListRecord, ListSchema, SortKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Buys products
    #[default]
    Buyer,
    /// Sells products
    Seller,
    /// Administers the marketplace
    Admin,
}

impl UserRole {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::Admin => "admin",
        }
    }
}

/// A user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Record id
    #[serde(alias = "_id", deserialize_with = "lenient_id")]
    pub id: RecordId,

    /// Display name
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub name: Option<String>,

    /// Login email
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub email: Option<String>,

    /// Role
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub role: UserRole,

    /// Whether the account may sign in
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_active: Option<bool>,

    /// Lifetime spend
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_spent: Option<f64>,

    /// Number of purchases
    #[serde(default, deserialize_with = "lenient_u64")]
    pub purchase_count: Option<u64>,

    /// Sign-up time
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Whether the account may sign in
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active == Some(true)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<24} {:<20} {:<28} {:<6} {:<8} ${:.2}",
            self.id,
            self.name.as_deref().unwrap_or("-"),
            self.email.as_deref().unwrap_or("-"),
            self.role.as_str(),
            if self.is_active() { "active" } else { "inactive" },
            self.total_spent.unwrap_or_default()
        )
    }
}

impl ListRecord for User {
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
        self.total_spent
    }

    fn popularity(&self) -> Option<f64> {
        self.purchase_count.map(|n| n as f64)
    }
}

/// The users collection
#[derive(Debug, Clone, Copy, Default)]
pub struct Users;

impl Resource for Users {
    type Record = User;

    const NAME: &'static str = "users";
    const SINGULAR: &'static str = "user";

    fn schema() -> ListSchema<User> {
        ListSchema::new(Self::NAME)
            .filter(
                FilterDimension::exact("role", |u: &User| Some(u.role.as_str().to_string()))
                    .with_options(["buyer", "seller", "admin"]),
            )
            .filter(
                FilterDimension::new("status", |u: &User, value: &str, _| {
                    status_matches(u.is_active, value)
                })
                .with_options(["active", "inactive"]),
            )
            .aggregate(Aggregate::count("active", User::is_active))
            .aggregate(Aggregate::count("sellers", |u: &User| u.role == UserRole::Seller))
            .aggregate(Aggregate::sum("total_spent", |u: &User| u.total_spent))
            .default_sort(SortKey::Recent)
    }

    /// The backend also narrows by role
    fn server_query(state: &FilterState) -> Vec<(String, String)> {
        match state.filter("role") {
            ALL => Vec::new(),
            role => vec![("role".to_string(), role.to_string())],
        }
    }
}

impl Toggleable for Users {
    fn toggle(record: &mut User) {
        record.is_active = Some(!record.is_active());
    }
}

impl Deletable for Users {}
