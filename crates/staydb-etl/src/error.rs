use staydb_sink::SinkError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EtlError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("column {column} not found in {table}")]
    MissingColumn { column: String, table: String },

    /// A non-empty cell in a mean-imputed column is not a number.
    #[error("invalid number {value:?} in column {column} at row {row}")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },

    #[error(transparent)]
    Sink(#[from] SinkError),
}
