pub mod auth;
pub mod error;
pub mod file;
pub mod table;
pub mod warehouse;

pub use auth::{fetch_access_token, load_service_account, ServiceAccountKey, TokenSource};
pub use error::SinkError;
pub use file::{output_path, write_records, write_table_csv};
pub use table::Table;
pub use warehouse::{BigQueryClient, LoadSummary, WriteDisposition};
