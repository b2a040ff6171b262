use anyhow::Result;
use res_core::domain::EnrichedSearchEvent;
use res_core::EnrichError;
use tracing::{info, warn};

use crate::app::ports::{EnrichedOutputPort, GeographySourcePort, SearchRecordSourcePort};
use crate::observability::metrics;
use crate::pipeline::processing::enrich::SearchEnricher;
use crate::pipeline::processing::geography::GeographyResolver;
use crate::pipeline::processing::normalize::SearchRecordNormalizer;

/// Use case for the full batch pass: geography resolution, normalization,
/// enrichment, output. Hierarchy errors abort the run; individual bad rows
/// only count against the malformed tolerance.
pub struct EnrichUseCase {
    geography: Box<dyn GeographySourcePort>,
    records: Box<dyn SearchRecordSourcePort>,
    output: Box<dyn EnrichedOutputPort>,
    max_malformed_ratio: f64,
}

/// What one run did, for logging and for the analytics summary.
#[derive(Debug, Default)]
pub struct EnrichRunReport {
    pub files_read: usize,
    pub raw_records: usize,
    pub malformed_lines: usize,
    pub broker_filtered: usize,
    pub malformed_records: usize,
    pub normalized_events: usize,
    pub exploded_rows: usize,
    pub unknown_areas: usize,
    pub enriched: Vec<EnrichedSearchEvent>,
}

impl EnrichUseCase {
    pub fn new(
        geography: Box<dyn GeographySourcePort>,
        records: Box<dyn SearchRecordSourcePort>,
        output: Box<dyn EnrichedOutputPort>,
        max_malformed_ratio: f64,
    ) -> Self {
        Self {
            geography,
            records,
            output,
            max_malformed_ratio,
        }
    }

    pub async fn run(&self) -> Result<EnrichRunReport> {
        // 1) Resolve the geography reference table. Fatal on corrupt data.
        let nodes = self.geography.load_nodes().await?;
        metrics::geography::nodes_loaded(nodes.len());
        let index = GeographyResolver::new(nodes).resolve_all()?;
        metrics::geography::nodes_resolved(index.len());
        info!("🌍 resolved {} geography nodes", index.len());

        // 2) Load and normalize the raw search records.
        let batch = self.records.load_records().await?;
        let raw_records = batch.records.len();
        let outcome = SearchRecordNormalizer::new().normalize_batch(&batch.records);

        self.check_tolerance(
            batch.malformed_lines + outcome.malformed,
            batch.malformed_lines + raw_records,
        )?;

        // 3) Explode, join, re-aggregate.
        let enriched = SearchEnricher::new(&index).enrich_batch(&outcome.events);
        if enriched.unknown_areas > 0 {
            warn!(
                "{} area references missing from the geography table (kept with null geography)",
                enriched.unknown_areas
            );
        }

        // 4) Write the enriched table.
        for record in &enriched.events {
            self.output.write_enriched_record(record).await?;
            metrics::output::row_written();
        }
        self.output.flush().await?;

        let report = EnrichRunReport {
            files_read: batch.files_read,
            raw_records,
            malformed_lines: batch.malformed_lines,
            broker_filtered: outcome.broker_filtered,
            malformed_records: outcome.malformed,
            normalized_events: outcome.events.len(),
            exploded_rows: enriched.exploded_rows,
            unknown_areas: enriched.unknown_areas,
            enriched: enriched.events,
        };
        info!(
            "✅ enriched {} searches into {} rows ({} raw records, {} broker-originated, {} malformed)",
            report.normalized_events,
            report.enriched.len(),
            report.raw_records,
            report.broker_filtered,
            report.malformed_records + report.malformed_lines,
        );
        Ok(report)
    }

    /// Bad rows are tolerated up to a configured share of the input; past
    /// that the batch itself is suspect.
    fn check_tolerance(&self, malformed: usize, total: usize) -> Result<()> {
        if total == 0 || malformed == 0 {
            return Ok(());
        }
        let observed = malformed as f64 / total as f64;
        if observed > self.max_malformed_ratio {
            return Err(EnrichError::MalformedRowRateExceeded {
                observed,
                tolerance: self.max_malformed_ratio,
            }
            .into());
        }
        warn!(
            "{}/{} malformed rows ({:.1}%), within tolerance",
            malformed,
            total,
            observed * 100.0
        );
        Ok(())
    }
}
