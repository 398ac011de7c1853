//! [`ListingSite`] adapter over a Chromium browser driven through CDP.
//!
//! The results page lives in one tab for the whole run; each detail page is
//! opened in a new tab and closed before the next entry is visited.

mod scripts;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use staydb_core::{AppConfig, SiteSelectors};
use tokio::task::JoinHandle;

use crate::error::ScraperError;
use crate::site::{DetailProbe, ListingSite, RawEntry};

#[derive(Deserialize)]
struct TextProbe {
    text: Option<String>,
}

/// Polling interval while waiting for a detail element.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Browser process options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub headless: bool,
    /// Explicit browser binary; auto-detected when `None`.
    pub chrome_path: Option<PathBuf>,
    pub window_width: u32,
    pub window_height: u32,
}

impl LaunchOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            headless: config.headless,
            chrome_path: config.chrome_path.clone(),
            window_width: config.window_width,
            window_height: config.window_height,
        }
    }
}

/// A live Chromium session bound to one set of site selectors.
pub struct ChromiumSite {
    browser: Browser,
    handler: JoinHandle<()>,
    results: Page,
    detail: Option<Page>,
    selectors: SiteSelectors,
}

impl ChromiumSite {
    /// Launches the browser and opens the results tab.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Launch`] if the browser cannot be configured or
    /// started, or [`ScraperError::Browser`] if the first tab cannot be opened.
    pub async fn launch(
        options: &LaunchOptions,
        selectors: SiteSelectors,
    ) -> Result<Self, ScraperError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--start-maximized")
            .window_size(options.window_width, options.window_height);
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(ScraperError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScraperError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "browser handler event error");
                }
            }
        });

        let results = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(e.into());
            }
        };

        tracing::info!(headless = options.headless, "browser launched");
        Ok(Self {
            browser,
            handler,
            results,
            detail: None,
            selectors,
        })
    }

    fn detail_page(&self) -> Result<&Page, ScraperError> {
        self.detail.as_ref().ok_or(ScraperError::DetailNotOpen)
    }

    fn probe_selector(&self, probe: DetailProbe) -> &str {
        match probe {
            DetailProbe::Price => &self.selectors.detail_price,
            DetailProbe::RatingA => &self.selectors.rating_a,
            DetailProbe::RatingB => &self.selectors.rating_b,
            DetailProbe::ReviewA => &self.selectors.review_a,
            DetailProbe::ReviewB => &self.selectors.review_b,
        }
    }

    async fn require_css(&self, element: &str, css: &str) -> Result<(), ScraperError> {
        let present: bool = evaluate(&self.results, scripts::css_present(css), element).await?;
        if present {
            Ok(())
        } else {
            Err(ScraperError::structural(element, css))
        }
    }
}

/// Evaluates `script` as an expression and deserializes its value.
async fn evaluate<T: DeserializeOwned>(
    page: &Page,
    script: String,
    context: &str,
) -> Result<T, ScraperError> {
    let params = EvaluateParams::builder()
        .expression(script)
        .return_by_value(true)
        .build()
        .map_err(|reason| ScraperError::InvalidScript {
            context: context.to_owned(),
            reason,
        })?;

    page.evaluate_expression(params)
        .await?
        .into_value::<T>()
        .map_err(|source| ScraperError::ScriptResult {
            context: context.to_owned(),
            source,
        })
}

impl ListingSite for ChromiumSite {
    async fn open_root(&mut self, url: &str) -> Result<(), ScraperError> {
        self.results.goto(url).await?;
        Ok(())
    }

    async fn fill_search(&mut self, query: &str) -> Result<(), ScraperError> {
        let css = self.selectors.search_input.clone();
        self.require_css("search input", &css).await?;
        let _: bool = evaluate(&self.results, scripts::clear_input(&css), "search input").await?;

        let input = self.results.find_element(css.as_str()).await?;
        input.click().await?.type_str(query).await?;
        Ok(())
    }

    async fn submit_search(&mut self) -> Result<(), ScraperError> {
        let css = self.selectors.search_input.clone();
        self.require_css("search input", &css).await?;
        self.results
            .find_element(css.as_str())
            .await?
            .press_key("Enter")
            .await?;
        Ok(())
    }

    async fn click_search_button(&mut self) -> Result<(), ScraperError> {
        let css = self.selectors.search_button.clone();
        self.require_css("search button", &css).await?;
        self.results.find_element(css.as_str()).await?.click().await?;
        Ok(())
    }

    async fn result_entries(&mut self) -> Result<Vec<RawEntry>, ScraperError> {
        let script = scripts::result_entries(
            &self.selectors.result_entries,
            &self.selectors.entry_link,
            &self.selectors.entry_name,
        );
        evaluate(&self.results, script, "result entries").await
    }

    async fn open_detail(&mut self, url: &str) -> Result<(), ScraperError> {
        if let Some(stale) = self.detail.take() {
            tracing::warn!("closing a detail tab left open by a previous entry");
            stale.close().await?;
        }
        let page = self.browser.new_page(url).await?;
        self.detail = Some(page);
        Ok(())
    }

    async fn wait_for_detail_price(&mut self, timeout: Duration) -> Result<(), ScraperError> {
        let script = scripts::xpath_present(&self.selectors.detail_price);
        let page = self.detail_page()?;
        let started = Instant::now();

        loop {
            let present: bool = evaluate(page, script.clone(), "detail price").await?;
            if present {
                return Ok(());
            }
            let waited = started.elapsed();
            if waited >= timeout {
                return Err(ScraperError::DetailTimeout {
                    element: DetailProbe::Price.as_str().to_owned(),
                    waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                });
            }
            tokio::time::sleep(POLL_INTERVAL.min(timeout - waited)).await;
        }
    }

    async fn detail_text(&mut self, probe: DetailProbe) -> Result<Option<String>, ScraperError> {
        let script = scripts::xpath_text(self.probe_selector(probe));
        let page = self.detail_page()?;
        let probed: TextProbe = evaluate(page, script, probe.as_str()).await?;
        Ok(probed.text)
    }

    async fn close_detail(&mut self) -> Result<(), ScraperError> {
        if let Some(page) = self.detail.take() {
            page.close().await?;
        }
        self.results.bring_to_front().await?;
        Ok(())
    }

    async fn advance_page(&mut self) -> Result<bool, ScraperError> {
        let script = scripts::xpath_click(&self.selectors.next_page);
        evaluate(&self.results, script, "next page").await
    }

    async fn save_screenshot(&mut self, path: &Path) -> Result<(), ScraperError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ScraperError::Io {
                    path: parent.display().to_string(),
                    source,
                })?;
        }
        self.results
            .save_screenshot(ScreenshotParams::builder().full_page(true).build(), path)
            .await?;
        Ok(())
    }

    async fn shutdown(mut self) -> Result<(), ScraperError> {
        if let Some(page) = self.detail.take() {
            if let Err(e) = page.close().await {
                tracing::debug!(error = %e, "detail tab already gone at shutdown");
            }
        }

        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            tracing::debug!(error = %e, "browser process wait failed");
        }
        self.handler.abort();

        closed?;
        Ok(())
    }
}
