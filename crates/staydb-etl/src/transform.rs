//! Join and null imputation for the bookings/properties tables.

use std::collections::{HashMap, HashSet};

use staydb_sink::Table;

use crate::error::EtlError;
use crate::extract::RawTables;

/// Column both exports are joined on.
pub const JOIN_KEY: &str = "PropertyId";

const LEFT_SUFFIX: &str = "_x";
const RIGHT_SUFFIX: &str = "_y";

/// How null cells of a column are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Constant(&'static str),
    /// Arithmetic mean of the column's non-null values.
    Mean,
}

/// Imputation applied to the joined table, in order.
pub const IMPUTATIONS: [(&str, Fill); 11] = [
    ("Channel", Fill::Constant("Unknown")),
    ("RoomRate", Fill::Mean),
    ("Revenue", Fill::Mean),
    ("ADR", Fill::Mean),
    ("TouristTax", Fill::Constant("0")),
    ("RealProperty", Fill::Constant("Unknown")),
    ("Capacity", Fill::Constant("0")),
    ("Square", Fill::Mean),
    ("PropertyType", Fill::Constant("Unknown")),
    ("NumBedrooms", Fill::Constant("0")),
    ("ReadyDate", Fill::Constant("1900-01-01")),
];

/// Joins and imputes the raw exports into the combined table.
///
/// # Errors
///
/// Propagates [`left_join`] and [`impute`] failures.
pub fn transform(raw: &RawTables) -> Result<Table, EtlError> {
    tracing::info!("transforming bookings and properties");
    let mut combined = left_join(&raw.bookings, &raw.properties, JOIN_KEY)?;
    impute(&mut combined)?;
    tracing::info!(
        rows = combined.len(),
        columns = combined.headers().len(),
        "combined table ready"
    );
    Ok(combined)
}

/// Left-joins `right` onto `left` on `key`.
///
/// Every left row appears at least once, in order; a left row with several
/// matches is repeated once per match. Unmatched rows get null right-hand
/// cells, and a null key never matches. The key column appears once. Other
/// column names present on both sides get `_x` (left) and `_y` (right).
///
/// # Errors
///
/// Returns [`EtlError::MissingColumn`] if either side lacks `key`.
pub fn left_join(left: &Table, right: &Table, key: &str) -> Result<Table, EtlError> {
    let left_key = left.column_index(key).ok_or_else(|| EtlError::MissingColumn {
        column: key.to_owned(),
        table: "bookings".to_owned(),
    })?;
    let right_key = right.column_index(key).ok_or_else(|| EtlError::MissingColumn {
        column: key.to_owned(),
        table: "properties".to_owned(),
    })?;

    let left_names: HashSet<&str> = left.headers().iter().map(String::as_str).collect();
    let right_names: HashSet<&str> = right.headers().iter().map(String::as_str).collect();

    let mut headers: Vec<String> = left
        .headers()
        .iter()
        .map(|h| {
            if h != key && right_names.contains(h.as_str()) {
                format!("{h}{LEFT_SUFFIX}")
            } else {
                h.clone()
            }
        })
        .collect();
    headers.extend(
        right
            .headers()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != right_key)
            .map(|(_, h)| {
                if left_names.contains(h.as_str()) {
                    format!("{h}{RIGHT_SUFFIX}")
                } else {
                    h.clone()
                }
            }),
    );

    let mut matches: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, row) in right.rows().iter().enumerate() {
        if let Some(k) = row.get(right_key).and_then(Option::as_deref) {
            matches.entry(k.trim()).or_default().push(i);
        }
    }

    let right_values = |row: &[Option<String>]| -> Vec<Option<String>> {
        row.iter()
            .enumerate()
            .filter(|(i, _)| *i != right_key)
            .map(|(_, cell)| cell.clone())
            .collect()
    };
    let right_width = right.headers().len() - 1;

    let mut joined = Table::new(headers);
    let mut unmatched = 0usize;
    for row in left.rows() {
        let hits = row
            .get(left_key)
            .and_then(Option::as_deref)
            .and_then(|k| matches.get(k.trim()));

        match hits {
            Some(hits) => {
                for &hit in hits {
                    let mut out = row.clone();
                    out.extend(right_values(&right.rows()[hit]));
                    joined.push_row(out);
                }
            }
            None => {
                unmatched += 1;
                let mut out = row.clone();
                out.resize(left.headers().len() + right_width, None);
                joined.push_row(out);
            }
        }
    }

    tracing::debug!(
        left = left.len(),
        right = right.len(),
        joined = joined.len(),
        unmatched,
        "left join finished"
    );
    Ok(joined)
}

/// Fills null cells according to [`IMPUTATIONS`].
///
/// A mean column with no values at all stays null.
///
/// # Errors
///
/// - [`EtlError::MissingColumn`] if an imputed column is absent.
/// - [`EtlError::InvalidNumber`] if a mean column holds a non-numeric value.
pub fn impute(table: &mut Table) -> Result<(), EtlError> {
    for (column, fill) in IMPUTATIONS {
        let idx = table
            .column_index(column)
            .ok_or_else(|| EtlError::MissingColumn {
                column: column.to_owned(),
                table: "joined table".to_owned(),
            })?;

        let value = match fill {
            Fill::Constant(value) => Some(value.to_owned()),
            Fill::Mean => column_mean(table, column, idx)?.map(format_mean),
        };
        let Some(value) = value else {
            tracing::warn!(column, "no values to average; nulls left in place");
            continue;
        };

        let mut filled = 0usize;
        for row in table.rows_mut() {
            if row[idx].is_none() {
                row[idx] = Some(value.clone());
                filled += 1;
            }
        }
        if filled > 0 {
            tracing::debug!(column, filled, value = %value, "imputed nulls");
        }
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn column_mean(table: &Table, column: &str, idx: usize) -> Result<Option<f64>, EtlError> {
    let mut sum = 0.0_f64;
    let mut count = 0usize;
    for (row_no, row) in table.rows().iter().enumerate() {
        let Some(cell) = row[idx].as_deref() else {
            continue;
        };
        let value: f64 = cell.trim().parse().map_err(|_| EtlError::InvalidNumber {
            column: column.to_owned(),
            row: row_no,
            value: cell.to_owned(),
        })?;
        sum += value;
        count += 1;
    }
    Ok((count > 0).then(|| sum / count as f64))
}

/// Renders a mean the way a float column is written: whole numbers keep
/// one decimal place.
fn format_mean(mean: f64) -> String {
    if mean.is_finite() && mean.fract().abs() < f64::EPSILON {
        format!("{mean:.1}")
    } else {
        format!("{mean}")
    }
}

#[cfg(test)]
#[path = "transform_test.rs"]
mod tests;
