use std::path::{Path, PathBuf};

use staydb_core::WarehouseNamespace;
use staydb_sink::{write_table_csv, BigQueryClient, LoadSummary, Table, WriteDisposition};

use crate::error::EtlError;

/// Writes the combined table to `{output_dir}/{output_file}`.
///
/// # Errors
///
/// Returns [`EtlError::Sink`] if the directory or file cannot be written.
pub fn load(table: &Table, output_dir: &Path, output_file: &str) -> Result<PathBuf, EtlError> {
    let path = output_dir.join(output_file);
    write_table_csv(table, &path)?;
    tracing::info!(path = %path.display(), rows = table.len(), "combined table written");
    Ok(path)
}

/// Replaces the warehouse table at `namespace` with `table`.
///
/// # Errors
///
/// Returns [`EtlError::Sink`] if the load job fails.
pub async fn upload(
    warehouse: &BigQueryClient,
    table: &Table,
    namespace: &WarehouseNamespace,
) -> Result<LoadSummary, EtlError> {
    Ok(warehouse
        .load_table(table, namespace, WriteDisposition::Replace)
        .await?)
}
