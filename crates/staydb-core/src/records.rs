//! Listing record types shared by the scraper and the sinks.
//!
//! A scrape run produces one [`NormalizedRecord`] per result entry. The two
//! transient halves it is assembled from ([`ListingReference`] from the
//! results page, [`ListingDetail`] from the detail page) never leave the
//! record collector.

use serde::{Deserialize, Serialize};

/// Reference metadata read from a single results-page entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingReference {
    /// Locator exactly as embedded in the entry (may lack a scheme).
    pub link: String,
    pub name: String,
}

/// Fields read from a listing's detail page.
///
/// Every field is independently optional: `None` means the field could not
/// be found, never zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingDetail {
    /// Nightly price with the currency marker stripped.
    pub price: Option<u64>,
    /// Rating as a decimal string, e.g. `"4.85"`.
    pub rating: Option<String>,
    /// Review count as a digit string, e.g. `"12"`.
    pub review_count: Option<String>,
}

/// One collected listing: reference metadata merged with its detail fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub link: String,
    pub name: String,
    pub price: Option<u64>,
    pub rating: Option<String>,
    pub review_count: Option<String>,
}

impl NormalizedRecord {
    /// Column order used for every tabular rendition of a record.
    pub const COLUMNS: [&'static str; 5] = ["link", "name", "price", "rating", "review_count"];

    #[must_use]
    pub fn new(reference: ListingReference, detail: ListingDetail) -> Self {
        Self {
            link: reference.link,
            name: reference.name,
            price: detail.price,
            rating: detail.rating,
            review_count: detail.review_count,
        }
    }

    /// Renders the record as cells in [`Self::COLUMNS`] order; absent fields
    /// become `None`.
    #[must_use]
    pub fn to_row(&self) -> Vec<Option<String>> {
        vec![
            Some(self.link.clone()),
            Some(self.name.clone()),
            self.price.map(|p| p.to_string()),
            self.rating.clone(),
            self.review_count.clone(),
        ]
    }
}

/// Ordered records collected during one run.
///
/// Insertion order is discovery order across pages. The cap is enforced in
/// two stages: collection continues while `len() <= cap`, so the final page
/// may push the set past the cap, and [`ResultSet::capped`] trims to the cap
/// when the set is written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSet {
    records: Vec<NormalizedRecord>,
    cap: usize,
}

impl ResultSet {
    #[must_use]
    pub fn with_cap(cap: usize) -> Self {
        Self {
            records: Vec::new(),
            cap,
        }
    }

    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: NormalizedRecord) {
        self.records.push(record);
    }

    /// Whether another results page should be collected.
    #[must_use]
    pub fn accepts_more(&self) -> bool {
        self.records.len() <= self.cap
    }

    /// Every collected record, including any past the cap.
    #[must_use]
    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    /// The first `cap` records in discovery order.
    #[must_use]
    pub fn capped(&self) -> &[NormalizedRecord] {
        &self.records[..self.records.len().min(self.cap)]
    }

    #[must_use]
    pub fn into_records(self) -> Vec<NormalizedRecord> {
        self.records
    }
}
