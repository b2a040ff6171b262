//! Downstream summary aggregations over the enriched table. Derived data
//! only; nothing here feeds back into the pipeline.

use std::collections::BTreeMap;

use res_core::domain::EnrichedSearchEvent;
use tracing::info;

const UNKNOWN_COUNTRY: &str = "(unknown)";
const UNCATEGORIZED: &str = "(uncategorized)";

#[derive(Debug, Default)]
pub struct AnalyticsSummary {
    pub total_searches: usize,
    /// (country, category) -> search count. BTreeMap keeps log output stable.
    pub by_country_and_category: BTreeMap<(String, String), usize>,
    pub price_by_country: BTreeMap<String, PriceDistribution>,
}

/// Distribution over the non-null price bounds of a country's searches.
#[derive(Debug, Clone, Default)]
pub struct PriceDistribution {
    pub samples: usize,
    pub min: i64,
    pub max: i64,
    pub mean: f64,
}

impl PriceDistribution {
    fn observe(&mut self, value: i64) {
        if self.samples == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.samples += 1;
        self.mean += (value as f64 - self.mean) / self.samples as f64;
    }
}

pub fn summarize(rows: &[EnrichedSearchEvent]) -> AnalyticsSummary {
    let mut summary = AnalyticsSummary {
        total_searches: rows.len(),
        ..Default::default()
    };
    for row in rows {
        let country = row
            .country_name
            .clone()
            .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string());
        let category = row
            .filters
            .category
            .clone()
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        *summary
            .by_country_and_category
            .entry((country.clone(), category))
            .or_insert(0) += 1;

        let prices = summary.price_by_country.entry(country).or_default();
        if let Some(low) = row.filters.price_low {
            prices.observe(low);
        }
        if let Some(high) = row.filters.price_high {
            prices.observe(high);
        }
    }
    summary
}

impl AnalyticsSummary {
    pub fn log(&self) {
        info!("📊 {} enriched searches", self.total_searches);
        for ((country, category), count) in &self.by_country_and_category {
            info!("  {} / {}: {}", country, category, count);
        }
        for (country, dist) in &self.price_by_country {
            if dist.samples == 0 {
                continue;
            }
            info!(
                "  {} price bounds: n={} min={} max={} mean={:.0}",
                country, dist.samples, dist.min, dist.max, dist.mean
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use res_core::domain::SearchFilters;

    fn row(country: Option<&str>, category: Option<&str>, price_low: Option<i64>) -> EnrichedSearchEvent {
        EnrichedSearchEvent {
            search_id: 0,
            date: NaiveDate::from_ymd_opt(2021, 4, 20).unwrap(),
            filters: SearchFilters {
                category: category.map(str::to_string),
                price_low,
                ..Default::default()
            },
            country_name: country.map(str::to_string),
            region_name: None,
            area_ids: vec![1],
            geography_names: vec![None],
        }
    }

    #[test]
    fn test_counts_by_country_and_category() {
        let rows = vec![
            row(Some("Greece"), Some("residential"), Some(100)),
            row(Some("Greece"), Some("residential"), Some(200)),
            row(Some("Greece"), Some("commercial"), None),
            row(None, None, Some(300)),
        ];
        let summary = summarize(&rows);
        assert_eq!(summary.total_searches, 4);
        assert_eq!(
            summary.by_country_and_category[&("Greece".to_string(), "residential".to_string())],
            2
        );
        assert_eq!(
            summary.by_country_and_category
                [&("(unknown)".to_string(), "(uncategorized)".to_string())],
            1
        );
    }

    #[test]
    fn test_price_distribution() {
        let rows = vec![
            row(Some("Greece"), None, Some(100)),
            row(Some("Greece"), None, Some(300)),
        ];
        let summary = summarize(&rows);
        let dist = &summary.price_by_country["Greece"];
        assert_eq!(dist.samples, 2);
        assert_eq!(dist.min, 100);
        assert_eq!(dist.max, 300);
        assert!((dist.mean - 200.0).abs() < f64::EPSILON);
    }
}
