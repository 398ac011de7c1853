//! Bookings/properties ETL: extract two CSV exports, join and impute them,
//! write the combined table, and optionally replace its warehouse copy.

pub mod error;
pub mod extract;
pub mod load;
pub mod transform;

use std::path::PathBuf;

use staydb_core::AppConfig;
use staydb_sink::{BigQueryClient, LoadSummary};

pub use error::EtlError;
pub use extract::{extract, read_csv, RawTables};
pub use load::{load, upload};
pub use transform::{impute, left_join, transform, Fill, IMPUTATIONS, JOIN_KEY};

/// What an ETL run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtlSummary {
    pub rows: usize,
    pub output_path: PathBuf,
    /// `None` when the upload was skipped.
    pub upload: Option<LoadSummary>,
}

/// Runs extract, transform and load with the paths in `config`, then
/// uploads to the configured table when `warehouse` is given.
///
/// # Errors
///
/// Returns the first failing phase's [`EtlError`]; later phases do not run.
pub async fn run_etl(
    config: &AppConfig,
    warehouse: Option<&BigQueryClient>,
) -> Result<EtlSummary, EtlError> {
    let raw = extract(
        &config.etl_input_dir,
        &config.etl_bookings_file,
        &config.etl_properties_file,
    )?;
    let combined = transform(&raw)?;
    let output_path = load(&combined, &config.etl_output_dir, &config.etl_output_file)?;

    let loaded = match warehouse {
        Some(client) => Some(upload(client, &combined, &config.etl_namespace()).await?),
        None => {
            tracing::info!("warehouse upload skipped");
            None
        }
    };

    Ok(EtlSummary {
        rows: combined.len(),
        output_path,
        upload: loaded,
    })
}
