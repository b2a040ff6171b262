use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrichError {
    /// Cyclic or dangling parent pointers in the geography table. Fatal:
    /// reference data is corrupt, resolution cannot proceed.
    #[error("malformed geography hierarchy at node {node_id}: {reason}")]
    MalformedHierarchy { node_id: i64, reason: String },

    /// An individual log row that cannot be interpreted. Recoverable: the row
    /// is skipped and counted.
    #[error("malformed record at {file}:{line}: {reason}")]
    MalformedRecord {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("malformed row rate {observed:.3} exceeds tolerance {tolerance:.3}")]
    MalformedRowRateExceeded { observed: f64, tolerance: f64 },

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {message}")]
    Database { message: String },

    #[error("CSV write failed: {message}")]
    Csv { message: String },

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EnrichError>;
