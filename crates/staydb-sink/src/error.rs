use thiserror::Error;

/// Failures while persisting records locally or loading them into the
/// warehouse. None of these are retried.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error for {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The assertion could not be signed or the token exchange was refused.
    #[error("warehouse authentication failed: {0}")]
    Auth(String),

    #[error("invalid service-account credentials at {path}: {reason}")]
    Credentials { path: String, reason: String },

    /// The load job finished with an error result.
    #[error("warehouse load into {table} failed: {reason}")]
    LoadFailed { table: String, reason: String },

    #[error("unexpected HTTP {status} from {context}: {body}")]
    UnexpectedStatus {
        context: String,
        status: u16,
        body: String,
    },

    /// The `fail` policy found an existing, non-empty table.
    #[error("table {table} already exists and is not empty")]
    TableExists { table: String },

    #[error("nothing to write to {target}: no records")]
    EmptyRecords { target: String },
}

impl SinkError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
