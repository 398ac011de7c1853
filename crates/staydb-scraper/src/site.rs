//! Capability interface between the scraping algorithm and a live site.
//!
//! The collector, pager, and session controller only talk to the site
//! through [`ListingSite`]; a markup change touches the adapter (and its
//! selectors), never the algorithm.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use staydb_core::ListingReference;

use crate::error::ScraperError;

/// Text probes on an open detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailProbe {
    Price,
    RatingA,
    RatingB,
    ReviewA,
    ReviewB,
}

impl DetailProbe {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DetailProbe::Price => "detail price",
            DetailProbe::RatingA => "rating (shape A)",
            DetailProbe::RatingB => "rating (shape B)",
            DetailProbe::ReviewA => "reviews (shape A)",
            DetailProbe::ReviewB => "reviews (shape B)",
        }
    }
}

/// Metadata read from one result entry, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawEntry {
    pub link: Option<String>,
    pub name: Option<String>,
}

impl RawEntry {
    /// Validates the entry's metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::StructuralMismatch`] when the locator or the
    /// display name is missing or blank.
    pub fn into_reference(
        self,
        page: usize,
        index: usize,
    ) -> Result<ListingReference, ScraperError> {
        let link = self
            .link
            .filter(|l| !l.trim().is_empty())
            .ok_or_else(|| {
                ScraperError::structural(
                    format!("locator metadata of entry {index} on page {page}"),
                    "entry_link",
                )
            })?;
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| {
                ScraperError::structural(
                    format!("display name metadata of entry {index} on page {page}"),
                    "entry_name",
                )
            })?;
        Ok(ListingReference { link, name })
    }
}

/// Operations the scraper needs from a browsing session.
///
/// Implementations own exactly one results context and at most one isolated
/// detail context at a time. All methods take `&mut self`, so no two
/// components can manipulate contexts concurrently.
#[allow(async_fn_in_trait)]
pub trait ListingSite {
    /// Navigates the results context to `url`.
    async fn open_root(&mut self, url: &str) -> Result<(), ScraperError>;

    /// Clears the search box and types `query` into it.
    ///
    /// Fails with [`ScraperError::StructuralMismatch`] if the box is absent.
    async fn fill_search(&mut self, query: &str) -> Result<(), ScraperError>;

    /// Submits the search box with the Enter key.
    async fn submit_search(&mut self) -> Result<(), ScraperError>;

    /// Clicks the search confirmation control.
    ///
    /// Fails with [`ScraperError::StructuralMismatch`] if the control is absent.
    async fn click_search_button(&mut self) -> Result<(), ScraperError>;

    /// Reads the metadata of every result entry on the current results page,
    /// in document order.
    async fn result_entries(&mut self) -> Result<Vec<RawEntry>, ScraperError>;

    /// Opens `url` in a fresh isolated context, leaving the results context intact.
    async fn open_detail(&mut self, url: &str) -> Result<(), ScraperError>;

    /// Waits up to `timeout` for the detail price element.
    ///
    /// Fails with [`ScraperError::DetailTimeout`] when it never appears.
    async fn wait_for_detail_price(&mut self, timeout: Duration) -> Result<(), ScraperError>;

    /// Text of the first element matching `probe` on the detail page, or
    /// `None` if there is no such element.
    async fn detail_text(&mut self, probe: DetailProbe) -> Result<Option<String>, ScraperError>;

    /// Closes the isolated context and returns to the results context.
    async fn close_detail(&mut self) -> Result<(), ScraperError>;

    /// Activates the "next page" control. Returns `false` when there is none.
    async fn advance_page(&mut self) -> Result<bool, ScraperError>;

    /// Saves a PNG of the results context to `path`.
    async fn save_screenshot(&mut self, path: &Path) -> Result<(), ScraperError>;

    /// Tears the session down.
    async fn shutdown(self) -> Result<(), ScraperError>;
}
