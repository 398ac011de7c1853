//! Local file sink: writes the capped result set as CSV or a JSON array.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use staydb_core::{OutputFormat, ResultSet};

use crate::error::SinkError;
use crate::table::Table;

/// Output path for a run: `{dir}/{source_name}.{ext}`.
#[must_use]
pub fn output_path(dir: &Path, source_name: &str, format: OutputFormat) -> PathBuf {
    dir.join(format!("{source_name}.{}", format.extension()))
}

/// Writes the first `cap` records of `results` to
/// `{dir}/{source_name}.{ext}`, creating `dir` if needed and replacing any
/// previous file. Returns the written path.
///
/// # Errors
///
/// - [`SinkError::EmptyRecords`] if there is nothing to write.
/// - [`SinkError::Io`], [`SinkError::Csv`] or [`SinkError::Json`] if the
///   file cannot be created or serialized.
pub fn write_records(
    results: &ResultSet,
    dir: &Path,
    source_name: &str,
    format: OutputFormat,
) -> Result<PathBuf, SinkError> {
    let path = output_path(dir, source_name, format);
    let records = results.capped();
    if records.is_empty() {
        return Err(SinkError::EmptyRecords {
            target: path.display().to_string(),
        });
    }

    fs::create_dir_all(dir).map_err(|e| SinkError::io(dir, e))?;
    let file = fs::File::create(&path).map_err(|e| SinkError::io(&path, e))?;

    match format {
        OutputFormat::Csv => Table::from_records(records).write_csv(file)?,
        OutputFormat::Json => {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, records).map_err(|source| SinkError::Json {
                context: path.display().to_string(),
                source,
            })?;
            writer.flush().map_err(|e| SinkError::io(&path, e))?;
        }
    }

    tracing::info!(
        path = %path.display(),
        format = %format,
        records = records.len(),
        collected = results.len(),
        "saved records"
    );
    Ok(path)
}

/// Writes `table` as CSV to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`SinkError::Io`] or [`SinkError::Csv`] on failure.
pub fn write_table_csv(table: &Table, path: &Path) -> Result<(), SinkError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SinkError::io(parent, e))?;
    }
    let file = fs::File::create(path).map_err(|e| SinkError::io(path, e))?;
    table.write_csv(file)?;
    Ok(())
}
