//! The view of a record that the list engine needs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A record that can be searched, sorted and paginated
///
/// Numeric accessors return `None` when the backend omitted the field; the
/// engine treats that as zero. A missing timestamp sorts as the oldest.
pub trait ListRecord: Clone + Send + Sync + 'static {
    /// Stable identifier used for per-item actions
    fn id(&self) -> &str;

    /// Text fields matched by the search box
    fn search_fields(&self) -> Vec<&str>;

    /// Creation time
    fn created_at(&self) -> Option<DateTime<Utc>>;

    /// Price, used by the price sort keys
    fn price(&self) -> Option<f64> {
        None
    }

    /// Rating, used by [`SortKey::Rating`]
    fn rating(&self) -> Option<f64> {
        None
    }

    /// Popularity (sales, usage count), used by [`SortKey::Popularity`]
    fn popularity(&self) -> Option<f64> {
        None
    }
}

/// Fixed set of orderings a list page offers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Newest first
    #[default]
    Recent,
    /// Oldest first
    Oldest,
    /// Cheapest first
    PriceAsc,
    /// Most expensive first
    PriceDesc,
    /// Highest rated first
    Rating,
    /// Most sold / most used first
    Popularity,
}

impl SortKey {
    /// All sort keys in menu order
    pub const ALL: [Self; 6] = [
        Self::Recent,
        Self::Oldest,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::Rating,
        Self::Popularity,
    ];

    /// Wire / command-line name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recent => "recent",
            Self::Oldest => "oldest",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::Rating => "rating",
            Self::Popularity => "popularity",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = aimart_core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "recent" | "newest" => Ok(Self::Recent),
            "oldest" => Ok(Self::Oldest),
            "price-asc" | "price-low" => Ok(Self::PriceAsc),
            "price-desc" | "price-high" => Ok(Self::PriceDesc),
            "rating" => Ok(Self::Rating),
            "popularity" | "popular" => Ok(Self::Popularity),
            _ => Err(aimart_core::Error::validation(
                "sort",
                format!("unknown sort key '{s}'"),
            )),
        }
    }
}
