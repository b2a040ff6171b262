//! Metrics for the enrichment pipeline, following Prometheus naming
//! conventions. The `MetricName` enum is the single catalog of names.

use once_cell::sync::OnceCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Loader metrics
    LoaderFilesRead,
    LoaderLinesParsed,
    LoaderLinesMalformed,

    // Geography metrics
    GeographyNodesLoaded,
    GeographyNodesResolved,

    // Normalize metrics
    NormalizeRecordsProcessed,
    NormalizeBrokerFiltered,
    NormalizeRecordsMalformed,
    NormalizeSentinelsCleared,

    // Enrich metrics
    EnrichRowsExploded,
    EnrichUnknownAreas,
    EnrichRowsEmitted,

    // Output metrics
    OutputRowsWritten,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::LoaderFilesRead => "res_loader_files_read_total",
            MetricName::LoaderLinesParsed => "res_loader_lines_parsed_total",
            MetricName::LoaderLinesMalformed => "res_loader_lines_malformed_total",

            MetricName::GeographyNodesLoaded => "res_geography_nodes_loaded_total",
            MetricName::GeographyNodesResolved => "res_geography_nodes_resolved_total",

            MetricName::NormalizeRecordsProcessed => "res_normalize_records_processed_total",
            MetricName::NormalizeBrokerFiltered => "res_normalize_broker_filtered_total",
            MetricName::NormalizeRecordsMalformed => "res_normalize_records_malformed_total",
            MetricName::NormalizeSentinelsCleared => "res_normalize_sentinels_cleared_total",

            MetricName::EnrichRowsExploded => "res_enrich_rows_exploded_total",
            MetricName::EnrichUnknownAreas => "res_enrich_unknown_areas_total",
            MetricName::EnrichRowsEmitted => "res_enrich_rows_emitted_total",

            MetricName::OutputRowsWritten => "res_output_rows_written_total",
        }
    }

    /// (description) for `describe_counter!` registration.
    fn description(&self) -> &'static str {
        match self {
            MetricName::LoaderFilesRead => "Log files read",
            MetricName::LoaderLinesParsed => "Log lines parsed",
            MetricName::LoaderLinesMalformed => "Log lines skipped as malformed",
            MetricName::GeographyNodesLoaded => "Geography nodes loaded",
            MetricName::GeographyNodesResolved => "Geography nodes resolved",
            MetricName::NormalizeRecordsProcessed => "Records normalized",
            MetricName::NormalizeBrokerFiltered => "Broker-originated records dropped",
            MetricName::NormalizeRecordsMalformed => "Records skipped as malformed",
            MetricName::NormalizeSentinelsCleared => "Sentinel values cleared to missing",
            MetricName::EnrichRowsExploded => "Rows produced by area explosion",
            MetricName::EnrichUnknownAreas => "Area ids missing from the geography table",
            MetricName::EnrichRowsEmitted => "Enriched rows emitted",
            MetricName::OutputRowsWritten => "Rows written to the output file",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            LoaderFilesRead,
            LoaderLinesParsed,
            LoaderLinesMalformed,
            GeographyNodesLoaded,
            GeographyNodesResolved,
            NormalizeRecordsProcessed,
            NormalizeBrokerFiltered,
            NormalizeRecordsMalformed,
            NormalizeSentinelsCleared,
            EnrichRowsExploded,
            EnrichUnknownAreas,
            EnrichRowsEmitted,
            OutputRowsWritten,
        ]
        .into_iter()
    }
}

static INIT: OnceCell<()> = OnceCell::new();

/// Register metric descriptions once. Safe to call from multiple entry points.
pub fn init() {
    INIT.get_or_init(|| {
        for metric in MetricName::all_metrics() {
            ::metrics::describe_counter!(metric.as_str(), metric.description());
        }
    });
}

pub mod loader {
    use super::MetricName;

    pub fn file_read() {
        ::metrics::counter!(MetricName::LoaderFilesRead.as_str()).increment(1);
    }

    pub fn lines_parsed(count: usize) {
        ::metrics::counter!(MetricName::LoaderLinesParsed.as_str()).increment(count as u64);
    }

    pub fn line_malformed() {
        ::metrics::counter!(MetricName::LoaderLinesMalformed.as_str()).increment(1);
    }
}

pub mod geography {
    use super::MetricName;

    pub fn nodes_loaded(count: usize) {
        ::metrics::counter!(MetricName::GeographyNodesLoaded.as_str()).increment(count as u64);
    }

    pub fn nodes_resolved(count: usize) {
        ::metrics::counter!(MetricName::GeographyNodesResolved.as_str()).increment(count as u64);
    }
}

pub mod normalize {
    use super::MetricName;

    pub fn record_normalized() {
        ::metrics::counter!(MetricName::NormalizeRecordsProcessed.as_str()).increment(1);
    }

    pub fn broker_filtered() {
        ::metrics::counter!(MetricName::NormalizeBrokerFiltered.as_str()).increment(1);
    }

    pub fn record_malformed() {
        ::metrics::counter!(MetricName::NormalizeRecordsMalformed.as_str()).increment(1);
    }

    pub fn sentinels_cleared(count: usize) {
        ::metrics::counter!(MetricName::NormalizeSentinelsCleared.as_str())
            .increment(count as u64);
    }
}

pub mod enrich {
    use super::MetricName;

    pub fn rows_exploded(count: usize) {
        ::metrics::counter!(MetricName::EnrichRowsExploded.as_str()).increment(count as u64);
    }

    pub fn unknown_area() {
        ::metrics::counter!(MetricName::EnrichUnknownAreas.as_str()).increment(1);
    }

    pub fn rows_emitted(count: usize) {
        ::metrics::counter!(MetricName::EnrichRowsEmitted.as_str()).increment(count as u64);
    }
}

pub mod output {
    use super::MetricName;

    pub fn row_written() {
        ::metrics::counter!(MetricName::OutputRowsWritten.as_str()).increment(1);
    }
}
