pub mod chromium;
pub mod collector;
pub mod error;
pub mod extract;
pub mod pager;
pub mod session;
pub mod site;

pub use chromium::{ChromiumSite, LaunchOptions};
pub use error::ScraperError;
pub use session::{run_scrape, scrape_with_chromium, ScrapeSettings, ScrapeTiming};
pub use site::{DetailProbe, ListingSite, RawEntry};
