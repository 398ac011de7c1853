//! Session controller: owns the browsing session for one scrape run.
//!
//! A run opens the site root, performs the search, hands the results page to
//! the pager, and always tears the session down, whether the pager succeeded
//! or not.

use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use staydb_core::{AppConfig, ResultSet, SiteSelectors};

use crate::chromium::{ChromiumSite, LaunchOptions};
use crate::error::ScraperError;
use crate::pager::collect_all_pages;
use crate::site::ListingSite;

/// Fixed waits used between browser interactions.
///
/// These are coarse settle delays, not adaptive waits; `detail_wait` is the
/// only bounded wait that polls for an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeTiming {
    /// Upper bound on waiting for the detail price element.
    pub detail_wait: Duration,
    /// Extra delay after the detail wait, before fields are read.
    pub detail_settle: Duration,
    /// Bounds of the randomized pause after a detail page loads.
    pub detail_jitter_min: Duration,
    pub detail_jitter_max: Duration,
    pub root_settle: Duration,
    pub input_settle: Duration,
    pub search_settle: Duration,
    pub page_settle: Duration,
}

impl ScrapeTiming {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            detail_wait: Duration::from_secs(config.detail_wait_secs),
            detail_settle: Duration::from_millis(config.detail_settle_ms),
            detail_jitter_min: Duration::from_millis(config.detail_jitter_min_ms),
            detail_jitter_max: Duration::from_millis(config.detail_jitter_max_ms),
            root_settle: Duration::from_millis(config.root_settle_ms),
            input_settle: Duration::from_millis(config.input_settle_ms),
            search_settle: Duration::from_millis(config.search_settle_ms),
            page_settle: Duration::from_millis(config.page_settle_ms),
        }
    }

    /// No waits at all. For runs against scripted sites.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            detail_wait: Duration::ZERO,
            detail_settle: Duration::ZERO,
            detail_jitter_min: Duration::ZERO,
            detail_jitter_max: Duration::ZERO,
            root_settle: Duration::ZERO,
            input_settle: Duration::ZERO,
            search_settle: Duration::ZERO,
            page_settle: Duration::ZERO,
        }
    }

    /// A uniformly random pause within the jitter bounds.
    pub(crate) fn detail_jitter(&self) -> Duration {
        if self.detail_jitter_max <= self.detail_jitter_min {
            return self.detail_jitter_min;
        }
        rand::rng().random_range(self.detail_jitter_min..=self.detail_jitter_max)
    }
}

/// Parameters of one scrape run.
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub source_name: String,
    pub site_root: String,
    pub search_query: String,
    pub record_cap: usize,
    pub max_pages: usize,
    pub rating_label_prefix: String,
    pub review_label_marker: String,
    /// Where to save a screenshot of the results page, if anywhere.
    pub screenshot_path: Option<PathBuf>,
    pub timing: ScrapeTiming,
}

impl ScrapeSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig, selectors: &SiteSelectors) -> Self {
        Self {
            source_name: config.source_name.clone(),
            site_root: config.site_root.clone(),
            search_query: config.search_query.clone(),
            record_cap: config.record_cap,
            max_pages: config.max_pages,
            rating_label_prefix: selectors.rating_label_prefix.clone(),
            review_label_marker: selectors.review_label_marker.clone(),
            screenshot_path: config
                .screenshot_dir
                .as_ref()
                .map(|dir| dir.join(format!("{}.png", config.source_name))),
            timing: ScrapeTiming::from_config(config),
        }
    }
}

pub(crate) async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

/// Runs a complete scrape against `site` and tears the session down.
///
/// Teardown happens on every exit path. A teardown failure is logged and
/// does not replace the run's own outcome.
///
/// # Errors
///
/// Propagates the first fatal error from search or collection, e.g.
/// [`ScraperError::StructuralMismatch`] when the markup has drifted.
pub async fn run_scrape<S: ListingSite>(
    mut site: S,
    settings: &ScrapeSettings,
) -> Result<ResultSet, ScraperError> {
    let outcome = drive(&mut site, settings).await;

    match site.shutdown().await {
        Ok(()) => tracing::debug!(source = %settings.source_name, "browsing session closed"),
        Err(e) => tracing::warn!(
            source = %settings.source_name,
            error = %e,
            "browsing session teardown failed"
        ),
    }

    if let Err(e) = &outcome {
        tracing::error!(source = %settings.source_name, error = %e, "scrape run aborted");
    }
    outcome
}

/// Launches a Chromium session and runs a complete scrape with it.
///
/// # Errors
///
/// Returns [`ScraperError::Launch`] if the browser cannot start, otherwise
/// whatever [`run_scrape`] returns.
pub async fn scrape_with_chromium(
    config: &AppConfig,
    selectors: SiteSelectors,
) -> Result<ResultSet, ScraperError> {
    let settings = ScrapeSettings::from_config(config, &selectors);
    let options = LaunchOptions::from_config(config);
    let site = ChromiumSite::launch(&options, selectors).await?;
    run_scrape(site, &settings).await
}

async fn drive<S: ListingSite>(
    site: &mut S,
    settings: &ScrapeSettings,
) -> Result<ResultSet, ScraperError> {
    tracing::info!(url = %settings.site_root, "opening site root");
    site.open_root(&settings.site_root).await?;
    pause(settings.timing.root_settle).await;

    search(site, settings).await?;

    if let Some(path) = &settings.screenshot_path {
        match site.save_screenshot(path).await {
            Ok(()) => tracing::info!(path = %path.display(), "saved results screenshot"),
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "could not save results screenshot"
            ),
        }
    }

    let mut results = ResultSet::with_cap(settings.record_cap);
    let pages = collect_all_pages(site, settings, &mut results).await?;
    tracing::info!(
        source = %settings.source_name,
        pages,
        records = results.len(),
        "scrape finished"
    );
    Ok(results)
}

async fn search<S: ListingSite>(site: &mut S, settings: &ScrapeSettings) -> Result<(), ScraperError> {
    site.fill_search(&settings.search_query).await?;
    pause(settings.timing.input_settle).await;
    site.submit_search().await?;
    site.click_search_button().await?;
    pause(settings.timing.search_settle).await;
    tracing::info!(query = %settings.search_query, "search submitted");
    Ok(())
}
