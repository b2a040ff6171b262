pub mod lenient;

use serde_json::Value;

/// One successfully parsed log line, with enough provenance to report
/// malformed data precisely.
#[derive(Debug, Clone)]
pub struct ParsedSearchRecord {
    pub source_file: String,
    pub line: usize,
    pub record: Value,
}
