//! Pager: walks result pages until the result set reaches its cap.
//!
//! The loop continues while `len <= cap`, so the last page may push the set
//! past the cap; truncation happens when the set is written out. The walk
//! also stops as soon as a page has no "next page" control.

use staydb_core::ResultSet;

use crate::collector::collect_page;
use crate::error::ScraperError;
use crate::session::{pause, ScrapeSettings};
use crate::site::ListingSite;

/// Collects result pages into `results`. Returns the number of pages visited.
///
/// # Errors
///
/// - [`ScraperError::PaginationLimit`] if more than `settings.max_pages`
///   pages would be visited.
/// - Any error from [`collect_page`] or from activating the next-page control.
pub async fn collect_all_pages<S: ListingSite>(
    site: &mut S,
    settings: &ScrapeSettings,
    results: &mut ResultSet,
) -> Result<usize, ScraperError> {
    let mut page = 0usize;

    while results.accepts_more() {
        page += 1;
        if page > settings.max_pages {
            return Err(ScraperError::PaginationLimit {
                max_pages: settings.max_pages,
            });
        }

        let appended = collect_page(site, settings, page, results).await?;
        tracing::info!(page, appended, total = results.len(), "extracted results page");

        if !results.accepts_more() {
            break;
        }

        if !site.advance_page().await? {
            tracing::info!(page, "no next-page control; stopping");
            break;
        }
        pause(settings.timing.page_settle).await;
    }

    Ok(page)
}
