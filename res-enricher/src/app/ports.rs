use async_trait::async_trait;
use res_core::domain::{EnrichedSearchEvent, GeographyNode};

use crate::pipeline::ingestion::ParsedSearchRecord;

/// Everything read from the search-log directory in one pass. Malformed
/// lines are counted here so the tolerance check can see them.
#[derive(Debug, Default)]
pub struct RecordBatch {
    pub records: Vec<ParsedSearchRecord>,
    pub malformed_lines: usize,
    pub files_read: usize,
}

#[async_trait]
pub trait GeographySourcePort: Send + Sync {
    async fn load_nodes(&self) -> anyhow::Result<Vec<GeographyNode>>;
}

#[async_trait]
pub trait SearchRecordSourcePort: Send + Sync {
    async fn load_records(&self) -> anyhow::Result<RecordBatch>;
}

#[async_trait]
pub trait EnrichedOutputPort: Send + Sync {
    async fn write_enriched_record(&self, record: &EnrichedSearchEvent) -> anyhow::Result<()>;

    async fn flush(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
