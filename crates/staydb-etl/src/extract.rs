use std::fs::File;
use std::path::Path;

use staydb_sink::Table;

use crate::error::EtlError;

/// The two raw exports the ETL combines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTables {
    pub bookings: Table,
    pub properties: Table,
}

/// Reads a CSV export with a header row.
///
/// # Errors
///
/// Returns [`EtlError::Io`] if the file cannot be opened, or
/// [`EtlError::Csv`] if it is malformed.
pub fn read_csv(path: &Path) -> Result<Table, EtlError> {
    let file = File::open(path).map_err(|source| EtlError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Table::from_csv_reader(file).map_err(|source| EtlError::Csv {
        path: path.display().to_string(),
        source,
    })
}

/// Reads the bookings and properties exports from `input_dir`.
///
/// # Errors
///
/// Propagates [`read_csv`] failures for either file.
pub fn extract(
    input_dir: &Path,
    bookings_file: &str,
    properties_file: &str,
) -> Result<RawTables, EtlError> {
    tracing::info!(dir = %input_dir.display(), "extracting raw exports");
    let bookings = read_csv(&input_dir.join(bookings_file))?;
    let properties = read_csv(&input_dir.join(properties_file))?;
    tracing::debug!(
        bookings = bookings.len(),
        properties = properties.len(),
        "read raw exports"
    );
    Ok(RawTables {
        bookings,
        properties,
    })
}
