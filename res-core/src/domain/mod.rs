use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the geography reference table. Nodes form a forest over
/// `parent_id`; roots carry either no parent or point at themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeographyNode {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    pub level: i64,
    pub is_country: bool,
    pub is_region: bool,
}

/// A geography node with its owning country and region resolved by walking
/// the parent chain. `region_id` is None when the country ancestor is reached
/// before any region-flagged node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedGeography {
    pub id: i64,
    pub name: String,
    pub country_id: i64,
    pub country_name: String,
    pub region_id: Option<i64>,
    pub region_name: Option<String>,
}

/// The descriptive attributes of a search, everything except when it happened
/// and where it looked. Doubles as the re-aggregation grouping key, so every
/// field is hashable and missing values are legitimate key parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchFilters {
    pub category: Option<String>,
    pub listing_type: Option<String>,
    pub living_area_low: Option<i64>,
    pub living_area_high: Option<i64>,
    pub price_low: Option<i64>,
    pub price_high: Option<i64>,
    pub new_development: Option<bool>,
    pub garage: Option<bool>,
    pub storage: Option<bool>,
    pub balcony: Option<bool>,
    pub secure_door: Option<bool>,
    pub alarm: Option<bool>,
    pub fireplace: Option<bool>,
    pub elevator: Option<bool>,
    pub garden: Option<bool>,
    pub rooms_low: Option<i64>,
    pub rooms_high: Option<i64>,
    pub pets_allowed: Option<bool>,
}

/// A consumer search event after normalization: broker fields are gone,
/// sentinel codes are cleared, `area_ids` is non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchEvent {
    pub date: NaiveDate,
    pub area_ids: Vec<i64>,
    pub filters: SearchFilters,
}

/// A search event annotated with resolved geography. `area_ids` and
/// `geography_names` are parallel lists ordered by first appearance within
/// the logical search; `country_name`/`region_name` are shared by every area
/// in the row (searches spanning countries split into separate rows).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedSearchEvent {
    pub search_id: u64,
    pub date: NaiveDate,
    pub filters: SearchFilters,
    pub country_name: Option<String>,
    pub region_name: Option<String>,
    pub area_ids: Vec<i64>,
    pub geography_names: Vec<Option<String>>,
}
