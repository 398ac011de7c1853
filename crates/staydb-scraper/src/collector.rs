//! Record collector: turns the current results page into normalized records.
//!
//! Each entry is visited in its own isolated detail context so the results
//! page keeps its state. Detail fields are best-effort (a missing element
//! degrades the field to `None`); missing entry metadata is fatal.

use staydb_core::{ListingDetail, ListingReference, NormalizedRecord, ResultSet};

use crate::error::ScraperError;
use crate::extract::{
    absolute_url, choose_rating_source, choose_review_source, extract_price, extract_rating,
    extract_review_count,
};
use crate::session::{pause, ScrapeSettings};
use crate::site::{DetailProbe, ListingSite};

/// Collects every entry on the current results page into `results`, in
/// enumeration order. Returns the number of records appended.
///
/// # Errors
///
/// - [`ScraperError::StructuralMismatch`] if the page has no result entries
///   or an entry lacks its locator or display name.
/// - Any browser error raised while opening, reading, or closing a detail
///   context.
pub async fn collect_page<S: ListingSite>(
    site: &mut S,
    settings: &ScrapeSettings,
    page: usize,
    results: &mut ResultSet,
) -> Result<usize, ScraperError> {
    let entries = site.result_entries().await?;
    if entries.is_empty() {
        return Err(ScraperError::structural(
            format!("result entries on page {page}"),
            "result_entries",
        ));
    }
    tracing::debug!(page, entries = entries.len(), "found result entries");

    let mut appended = 0usize;
    for (index, entry) in entries.into_iter().enumerate() {
        let reference = entry.into_reference(page, index)?;
        let detail = collect_detail(site, settings, &reference).await?;
        tracing::debug!(
            page,
            index,
            link = %reference.link,
            price = ?detail.price,
            rating = ?detail.rating,
            reviews = ?detail.review_count,
            "collected listing"
        );
        results.push(NormalizedRecord::new(reference, detail));
        appended += 1;
    }

    Ok(appended)
}

/// Visits one listing in an isolated context and reads its detail fields.
///
/// The context is closed even when reading fails.
async fn collect_detail<S: ListingSite>(
    site: &mut S,
    settings: &ScrapeSettings,
    reference: &ListingReference,
) -> Result<ListingDetail, ScraperError> {
    let url = absolute_url(&reference.link);
    site.open_detail(&url).await?;

    let detail = read_detail(site, settings, &url).await;
    let closed = site.close_detail().await;

    let detail = detail?;
    closed?;
    Ok(detail)
}

async fn read_detail<S: ListingSite>(
    site: &mut S,
    settings: &ScrapeSettings,
    url: &str,
) -> Result<ListingDetail, ScraperError> {
    pause(settings.timing.detail_jitter()).await;

    match site.wait_for_detail_price(settings.timing.detail_wait).await {
        Ok(()) => {}
        Err(e @ ScraperError::DetailTimeout { .. }) => {
            tracing::warn!(url, error = %e, "detail price did not appear; continuing");
        }
        Err(e) => return Err(e),
    }
    pause(settings.timing.detail_settle).await;

    let price = site
        .detail_text(DetailProbe::Price)
        .await?
        .as_deref()
        .and_then(extract_price);

    let rating_a = site.detail_text(DetailProbe::RatingA).await?.unwrap_or_default();
    let rating_b = site.detail_text(DetailProbe::RatingB).await?.unwrap_or_default();
    let rating = extract_rating(choose_rating_source(
        &rating_a,
        &rating_b,
        &settings.rating_label_prefix,
    ));

    let review_a = site.detail_text(DetailProbe::ReviewA).await?.unwrap_or_default();
    let review_b = site.detail_text(DetailProbe::ReviewB).await?.unwrap_or_default();
    let review_count = extract_review_count(choose_review_source(
        &review_a,
        &review_b,
        &settings.review_label_marker,
    ));

    Ok(ListingDetail {
        price,
        rating,
        review_count,
    })
}
