//! Column-ordered tabular data with nullable string cells.
//!
//! This is the hand-off shape between record producers (the scraper, the
//! bookings ETL) and the sinks. An empty CSV field reads as `None` and
//! `None` writes as an empty field.

use std::io;

use staydb_core::NormalizedRecord;

/// A header row plus data rows; every row has one cell per header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    #[must_use]
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Tabulates records in [`NormalizedRecord::COLUMNS`] order.
    #[must_use]
    pub fn from_records(records: &[NormalizedRecord]) -> Self {
        let mut table = Self::new(
            NormalizedRecord::COLUMNS
                .iter()
                .map(|c| (*c).to_owned())
                .collect(),
        );
        for record in records {
            table.rows.push(record.to_row());
        }
        table
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Vec<Option<String>>] {
        &mut self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row, padding with `None` or truncating to the header width.
    pub fn push_row(&mut self, mut row: Vec<Option<String>>) {
        row.resize(self.headers.len(), None);
        self.rows.push(row);
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at (`row`, `column`), or `None` when out of range or null.
    #[must_use]
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col)?.as_deref()
    }

    /// Reads a CSV with a header row.
    ///
    /// # Errors
    ///
    /// Returns a [`csv::Error`] on malformed input, including rows whose
    /// width differs from the header.
    pub fn from_csv_reader<R: io::Read>(reader: R) -> Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers = reader.headers()?.iter().map(str::to_owned).collect();
        let mut table = Self::new(headers);
        for record in reader.records() {
            let record = record?;
            table.rows.push(
                record
                    .iter()
                    .map(|field| (!field.is_empty()).then(|| field.to_owned()))
                    .collect(),
            );
        }
        Ok(table)
    }

    /// Writes the header row and every data row as CSV.
    ///
    /// # Errors
    ///
    /// Returns a [`csv::Error`] if writing to `writer` fails.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// The table as CSV bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`csv::Error`] if serialization fails.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, csv::Error> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(buf)
    }
}
