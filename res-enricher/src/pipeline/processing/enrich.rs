//! Search enrichment: explode multi-area events, join resolved geography,
//! re-aggregate rows that share every non-area attribute.

use std::collections::HashMap;

use chrono::NaiveDate;
use res_core::domain::{EnrichedSearchEvent, SearchEvent, SearchFilters};
use tracing::debug;

use crate::observability::metrics;
use crate::pipeline::processing::geography::GeographyIndex;

/// One exploded row: a single area of a logical search, carrying the
/// geography resolved for that area. Area ids missing from the reference
/// table keep null geography fields rather than being dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplodedSearchRow {
    pub search_id: u64,
    pub date: NaiveDate,
    pub filters: SearchFilters,
    pub area_id: i64,
    pub geography_name: Option<String>,
    pub country_name: Option<String>,
    pub region_name: Option<String>,
}

#[derive(Debug, Default)]
pub struct EnrichOutcome {
    pub events: Vec<EnrichedSearchEvent>,
    pub exploded_rows: usize,
    pub unknown_areas: usize,
}

pub struct SearchEnricher<'a> {
    geography: &'a GeographyIndex,
}

impl<'a> SearchEnricher<'a> {
    pub fn new(geography: &'a GeographyIndex) -> Self {
        Self { geography }
    }

    pub fn enrich_batch(&self, events: &[SearchEvent]) -> EnrichOutcome {
        let searches = events.len();
        let (rows, unknown_areas) = self.explode_and_join(events);
        let exploded_rows = rows.len();
        let events = reaggregate(rows);
        metrics::enrich::rows_emitted(events.len());
        debug!(
            "enriched {} searches into {} rows ({} exploded, {} unknown areas)",
            searches,
            events.len(),
            exploded_rows,
            unknown_areas
        );
        EnrichOutcome {
            events,
            exploded_rows,
            unknown_areas,
        }
    }

    /// One row per (search, area id). `search_id` is the position of the
    /// event in the normalized batch, assigned before exploding so rows of
    /// one logical search stay associated.
    pub fn explode_and_join(&self, events: &[SearchEvent]) -> (Vec<ExplodedSearchRow>, usize) {
        let mut rows = Vec::new();
        let mut unknown_areas = 0usize;
        for (position, event) in events.iter().enumerate() {
            for &area_id in &event.area_ids {
                let resolved = self.geography.lookup(area_id);
                if resolved.is_none() {
                    unknown_areas += 1;
                    metrics::enrich::unknown_area();
                }
                rows.push(ExplodedSearchRow {
                    search_id: position as u64,
                    date: event.date,
                    filters: event.filters.clone(),
                    area_id,
                    geography_name: resolved.map(|r| r.name.clone()),
                    country_name: resolved.map(|r| r.country_name.clone()),
                    region_name: resolved.and_then(|r| r.region_name.clone()),
                });
            }
        }
        metrics::enrich::rows_exploded(rows.len());
        (rows, unknown_areas)
    }
}

#[derive(PartialEq, Eq, Hash)]
struct GroupKey {
    search_id: u64,
    date: NaiveDate,
    filters: SearchFilters,
    country_name: Option<String>,
    region_name: Option<String>,
}

/// Collapse exploded rows back into logical search events. The key is every
/// field except the area-valued ones, missing values included, so exploded
/// rows of one search that resolved to different countries stay separate.
/// Output order and per-row area order both follow first appearance.
pub fn reaggregate(rows: Vec<ExplodedSearchRow>) -> Vec<EnrichedSearchEvent> {
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut out: Vec<EnrichedSearchEvent> = Vec::new();
    for row in rows {
        let key = GroupKey {
            search_id: row.search_id,
            date: row.date,
            filters: row.filters.clone(),
            country_name: row.country_name.clone(),
            region_name: row.region_name.clone(),
        };
        match index.get(&key) {
            Some(&at) => {
                out[at].area_ids.push(row.area_id);
                out[at].geography_names.push(row.geography_name);
            }
            None => {
                index.insert(key, out.len());
                out.push(EnrichedSearchEvent {
                    search_id: row.search_id,
                    date: row.date,
                    filters: row.filters,
                    country_name: row.country_name,
                    region_name: row.region_name,
                    area_ids: vec![row.area_id],
                    geography_names: vec![row.geography_name],
                });
            }
        }
    }
    out
}

/// Inverse of `reaggregate` for a single enriched row. Exploding every output
/// row must reproduce the joined intermediate table as a multiset.
pub fn explode_enriched(event: &EnrichedSearchEvent) -> Vec<ExplodedSearchRow> {
    event
        .area_ids
        .iter()
        .zip(event.geography_names.iter())
        .map(|(&area_id, geography_name)| ExplodedSearchRow {
            search_id: event.search_id,
            date: event.date,
            filters: event.filters.clone(),
            area_id,
            geography_name: geography_name.clone(),
            country_name: event.country_name.clone(),
            region_name: event.region_name.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use res_core::domain::GeographyNode;

    use crate::pipeline::processing::geography::GeographyResolver;

    fn geography() -> GeographyIndex {
        // Two countries; country 1 has region 2 with children 3 and 4,
        // country 10 has direct child 11.
        let node = |id: i64, parent: Option<i64>, country: bool, region: bool, name: &str| {
            GeographyNode {
                id,
                parent_id: parent,
                name: name.to_string(),
                level: 0,
                is_country: country,
                is_region: region,
            }
        };
        GeographyResolver::new(vec![
            node(1, None, true, false, "Greece"),
            node(2, Some(1), false, true, "Attica"),
            node(3, Some(2), false, false, "Athens"),
            node(4, Some(2), false, false, "Piraeus"),
            node(10, None, true, false, "Cyprus"),
            node(11, Some(10), false, false, "Nicosia"),
        ])
        .resolve_all()
        .unwrap()
    }

    fn search(areas: &[i64]) -> SearchEvent {
        SearchEvent {
            date: NaiveDate::from_ymd_opt(2021, 4, 20).unwrap(),
            area_ids: areas.to_vec(),
            filters: SearchFilters {
                category: Some("residential".to_string()),
                price_low: Some(50_000),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_same_region_areas_collapse_into_one_row() {
        let geography = geography();
        let enricher = SearchEnricher::new(&geography);
        let outcome = enricher.enrich_batch(&[search(&[3, 4])]);

        assert_eq!(outcome.events.len(), 1);
        let row = &outcome.events[0];
        assert_eq!(row.area_ids, vec![3, 4]);
        assert_eq!(
            row.geography_names,
            vec![Some("Athens".to_string()), Some("Piraeus".to_string())]
        );
        assert_eq!(row.country_name.as_deref(), Some("Greece"));
        assert_eq!(row.region_name.as_deref(), Some("Attica"));
    }

    #[test]
    fn test_cross_country_search_splits_rows() {
        let geography = geography();
        let enricher = SearchEnricher::new(&geography);
        let outcome = enricher.enrich_batch(&[search(&[3, 11])]);

        assert_eq!(outcome.events.len(), 2);
        assert_eq!(outcome.events[0].country_name.as_deref(), Some("Greece"));
        assert_eq!(outcome.events[1].country_name.as_deref(), Some("Cyprus"));
        assert_eq!(outcome.events[0].search_id, outcome.events[1].search_id);
    }

    #[test]
    fn test_unknown_area_kept_with_null_geography() {
        let geography = geography();
        let enricher = SearchEnricher::new(&geography);
        let outcome = enricher.enrich_batch(&[search(&[3, 9999])]);

        assert_eq!(outcome.unknown_areas, 1);
        // Null country differs from "Greece", so the unknown area lands in
        // its own row rather than disappearing.
        assert_eq!(outcome.events.len(), 2);
        let unknown = outcome
            .events
            .iter()
            .find(|e| e.area_ids == vec![9999])
            .unwrap();
        assert_eq!(unknown.country_name, None);
        assert_eq!(unknown.geography_names, vec![None]);
    }

    #[test]
    fn test_identical_searches_keep_separate_search_ids() {
        let geography = geography();
        let enricher = SearchEnricher::new(&geography);
        let outcome = enricher.enrich_batch(&[search(&[3]), search(&[3])]);
        assert_eq!(outcome.events.len(), 2);
        assert_ne!(outcome.events[0].search_id, outcome.events[1].search_id);
    }

    #[test]
    fn test_output_never_exceeds_input_rows() {
        let geography = geography();
        let enricher = SearchEnricher::new(&geography);
        let events = vec![search(&[3, 4]), search(&[3, 11]), search(&[11])];
        let outcome = enricher.enrich_batch(&events);
        assert!(outcome.exploded_rows >= outcome.events.len());
        assert!(outcome.events.iter().all(|e| !e.area_ids.is_empty()));
    }

    #[test]
    fn test_round_trip_law() {
        let geography = geography();
        let enricher = SearchEnricher::new(&geography);
        let events = vec![search(&[3, 4]), search(&[3, 11, 9999]), search(&[4])];

        let (joined, _) = enricher.explode_and_join(&events);
        let aggregated = reaggregate(joined.clone());

        let mut re_exploded: Vec<ExplodedSearchRow> =
            aggregated.iter().flat_map(explode_enriched).collect();

        // Multiset equality: sort both sides by a stable key.
        let sort_key = |r: &ExplodedSearchRow| (r.search_id, r.area_id, r.country_name.clone());
        let mut joined = joined;
        joined.sort_by_key(sort_key);
        re_exploded.sort_by_key(sort_key);
        assert_eq!(joined, re_exploded);
    }
}
