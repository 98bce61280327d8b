//! Tools (niche taxonomy) admin page

use super::{Deletable, Editable, Resource, Toggleable, status_matches};
use aimart_core::RecordId;
use aimart_core::types::{
    lenient_bool, lenient_datetime, lenient_id, lenient_or_default, lenient_u64,
};
use aimart_list::{Aggregate, FilterDimension, ListRecord, ListSchema, SortKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// A taxonomy entry products are filed under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Record id
    #[serde(alias = "_id", deserialize_with = "lenient_id")]
    pub id: RecordId,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Description
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub description: Option<String>,

    /// Category the tool belongs to, e.g. `llm` or `image`
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub category: Option<String>,

    /// Whether the tool is offered to sellers
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_active: Option<bool>,

    /// Products filed under this tool
    #[serde(default, deserialize_with = "lenient_u64")]
    pub product_count: Option<u64>,

    /// Creation time
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Tool {
    /// Whether the tool is offered to sellers
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active == Some(true)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<24} {:<24} {:<12} {:<8} {} products",
            self.id,
            self.name,
            self.category.as_deref().unwrap_or("-"),
            if self.is_active() { "active" } else { "inactive" },
            self.product_count.unwrap_or_default()
        )
    }
}

impl ListRecord for Tool {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.description.as_deref());
        fields.extend(self.category.as_deref());
        fields
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn popularity(&self) -> Option<f64> {
        self.product_count.map(|n| n as f64)
    }
}

/// Create/update payload for a tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ToolForm {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,

    /// Description
    #[validate(length(max = 500, message = "Description is too long"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Category
    #[validate(length(min = 1, max = 50, message = "Category must be 1 to 50 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Whether the tool is offered to sellers
    pub is_active: bool,
}

/// The tools collection
#[derive(Debug, Clone, Copy, Default)]
pub struct Tools;

impl Resource for Tools {
    type Record = Tool;

    const NAME: &'static str = "tools";
    const SINGULAR: &'static str = "tool";

    fn schema() -> ListSchema<Tool> {
        ListSchema::new(Self::NAME)
            .filter(
                FilterDimension::new("status", |t: &Tool, value: &str, _| {
                    status_matches(t.is_active, value)
                })
                .with_options(["active", "inactive"]),
            )
            .filter(FilterDimension::exact("category", |t: &Tool| t.category.clone()))
            .aggregate(Aggregate::count("active", Tool::is_active))
            .aggregate(Aggregate::sum("total_products", |t: &Tool| {
                t.product_count.map(|n| n as f64)
            }))
            .default_sort(SortKey::Recent)
    }
}

impl Editable for Tools {
    type Form = ToolForm;
}

impl Toggleable for Tools {
    fn toggle(record: &mut Tool) {
        record.is_active = Some(!record.is_active());
    }
}

impl Deletable for Tools {}
