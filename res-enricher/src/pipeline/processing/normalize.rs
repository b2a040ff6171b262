//! Search-record normalization: broker filtering, projection onto the
//! recognized attribute set, and sentinel cleanup.

use chrono::NaiveDate;
use res_core::domain::{SearchEvent, SearchFilters};
use res_core::{EnrichError, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::observability::metrics;
use crate::pipeline::ingestion::ParsedSearchRecord;

/// Numeric placeholder codes the portal writes when a filter was left unset.
const PRICE_LOW_SENTINELS: [i64; 2] = [9, 998];
const PRICE_HIGH_SENTINELS: [i64; 2] = [999_999, 99_999_999];
const LIVING_AREA_LOW_SENTINEL: i64 = 3;
const LIVING_AREA_HIGH_SENTINEL: i64 = 99_999_999;

pub struct SearchRecordNormalizer;

/// Outcome of a batch pass. Dropped rows are counted, never silently lost.
#[derive(Debug, Default)]
pub struct NormalizeOutcome {
    pub events: Vec<SearchEvent>,
    pub broker_filtered: usize,
    pub malformed: usize,
}

impl SearchRecordNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize_batch(&self, records: &[ParsedSearchRecord]) -> NormalizeOutcome {
        let mut outcome = NormalizeOutcome::default();
        for record in records {
            if Self::is_broker_originated(&record.record) {
                outcome.broker_filtered += 1;
                metrics::normalize::broker_filtered();
                continue;
            }
            match self.normalize_record(record) {
                Ok(event) => {
                    metrics::normalize::record_normalized();
                    outcome.events.push(event);
                }
                Err(e) => {
                    warn!("skipping malformed search record: {}", e);
                    metrics::normalize::record_malformed();
                    outcome.malformed += 1;
                }
            }
        }
        debug!(
            "normalized {} events ({} broker-originated, {} malformed)",
            outcome.events.len(),
            outcome.broker_filtered,
            outcome.malformed
        );
        outcome
    }

    /// Broker-originated searches are excluded from consumer analysis: any
    /// row carrying a broker id or a published broker site.
    pub fn is_broker_originated(record: &Value) -> bool {
        let present = |key: &str| matches!(record.get(key), Some(v) if !v.is_null());
        present("brokerID") || present("publishedBrokerSite")
    }

    /// Project one raw row onto the recognized attribute set and clear
    /// sentinel codes. Unrecognized fields are discarded by construction.
    pub fn normalize_record(&self, record: &ParsedSearchRecord) -> Result<SearchEvent> {
        let malformed = |reason: String| EnrichError::MalformedRecord {
            file: record.source_file.clone(),
            line: record.line,
            reason,
        };

        let raw = record
            .record
            .as_object()
            .ok_or_else(|| malformed("record is not an object".to_string()))?;

        let date = raw
            .get("date")
            .and_then(parse_date)
            .ok_or_else(|| malformed("missing or unparseable date".to_string()))?;

        let area_ids = match raw.get("areaIDs") {
            Some(Value::Array(items)) if !items.is_empty() => items
                .iter()
                .map(|v| as_i64(v).ok_or_else(|| malformed("non-numeric area id".to_string())))
                .collect::<Result<Vec<i64>>>()?,
            _ => return Err(malformed("areaIDs missing or not a non-empty list".to_string())),
        };

        let mut filters = SearchFilters {
            category: opt_string(raw.get("category")),
            listing_type: opt_string(raw.get("listingType")),
            living_area_low: opt_i64(raw.get("livingAreaLow")),
            living_area_high: opt_i64(raw.get("livingAreaHigh")),
            price_low: opt_i64(raw.get("priceLow")),
            price_high: opt_i64(raw.get("priceHigh")),
            new_development: opt_bool(raw.get("newDevelopment")),
            garage: opt_bool(raw.get("garage")),
            storage: opt_bool(raw.get("storage")),
            balcony: opt_bool(raw.get("balcony")),
            secure_door: opt_bool(raw.get("secureDoor")),
            alarm: opt_bool(raw.get("alarm")),
            fireplace: opt_bool(raw.get("fireplace")),
            elevator: opt_bool(raw.get("elevator")),
            garden: opt_bool(raw.get("garden")),
            rooms_low: opt_i64(raw.get("roomsLow")),
            rooms_high: opt_i64(raw.get("roomsHigh")),
            pets_allowed: opt_bool(raw.get("petsAllowed")),
        };
        clear_sentinels(&mut filters);

        Ok(SearchEvent {
            date,
            area_ids,
            filters,
        })
    }
}

impl Default for SearchRecordNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Each sentinel rule reads the field it clears; the living-area rules are
/// independent of the price fields.
fn clear_sentinels(filters: &mut SearchFilters) {
    let mut cleared = 0usize;
    if matches!(filters.price_low, Some(v) if PRICE_LOW_SENTINELS.contains(&v)) {
        filters.price_low = None;
        cleared += 1;
    }
    if matches!(filters.price_high, Some(v) if PRICE_HIGH_SENTINELS.contains(&v)) {
        filters.price_high = None;
        cleared += 1;
    }
    if filters.living_area_low == Some(LIVING_AREA_LOW_SENTINEL) {
        filters.living_area_low = None;
        cleared += 1;
    }
    if filters.living_area_high == Some(LIVING_AREA_HIGH_SENTINEL) {
        filters.living_area_high = None;
        cleared += 1;
    }
    if cleared > 0 {
        metrics::normalize::sentinels_cleared(cleared);
    }
}

/// Dates arrive as `YYYY-MM-DD...` strings; a ten-character prefix is enough.
/// Integer values are treated as epoch seconds.
fn parse_date(value: &Value) -> Option<NaiveDate> {
    if let Some(s) = value.as_str() {
        let prefix = s.get(..10)?;
        return NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok();
    }
    if let Some(epoch) = value.as_i64() {
        return chrono::DateTime::from_timestamp(epoch, 0).map(|dt| dt.date_naive());
    }
    None
}

fn as_i64(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    // Some fields arrive as floats with zero fraction.
    value
        .as_f64()
        .filter(|f| f.fract() == 0.0 && f.is_finite())
        .map(|f| f as i64)
}

fn opt_i64(value: Option<&Value>) -> Option<i64> {
    value.and_then(as_i64)
}

fn opt_bool(value: Option<&Value>) -> Option<bool> {
    let v = value?;
    if let Some(b) = v.as_bool() {
        return Some(b);
    }
    // 0/1 flags show up in older log files.
    as_i64(v).and_then(|n| match n {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    })
}

fn opt_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
