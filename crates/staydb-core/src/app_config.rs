use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// File format written by the local file sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    /// File extension (without the dot) for this format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{other}'; expected csv or json")),
        }
    }
}

/// Fully-qualified warehouse table: `project.dataset.table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseNamespace {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl std::fmt::Display for WarehouseNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,

    pub source_name: String,
    pub search_query: String,
    pub site_root: String,
    pub output_format: OutputFormat,
    pub output_dir: PathBuf,
    pub record_cap: usize,
    pub max_pages: usize,

    pub detail_wait_secs: u64,
    pub detail_settle_ms: u64,
    pub detail_jitter_min_ms: u64,
    pub detail_jitter_max_ms: u64,
    pub root_settle_ms: u64,
    pub input_settle_ms: u64,
    pub search_settle_ms: u64,
    pub page_settle_ms: u64,

    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
    pub window_width: u32,
    pub window_height: u32,
    pub selectors_path: Option<PathBuf>,
    pub screenshot_dir: Option<PathBuf>,

    pub warehouse_project: String,
    pub warehouse_dataset: String,
    pub warehouse_scrape_table: String,
    pub warehouse_etl_table: String,
    pub warehouse_credentials_path: PathBuf,
    pub warehouse_access_token: Option<String>,
    pub warehouse_base_url: String,
    pub warehouse_timeout_secs: u64,
    pub warehouse_poll_interval_ms: u64,
    pub warehouse_max_polls: u32,

    pub etl_input_dir: PathBuf,
    pub etl_bookings_file: String,
    pub etl_properties_file: String,
    pub etl_output_dir: PathBuf,
    pub etl_output_file: String,
}

impl AppConfig {
    /// Destination table for scraped listings.
    #[must_use]
    pub fn scrape_namespace(&self) -> WarehouseNamespace {
        WarehouseNamespace {
            project: self.warehouse_project.clone(),
            dataset: self.warehouse_dataset.clone(),
            table: self.warehouse_scrape_table.clone(),
        }
    }

    /// Destination table for the combined bookings/properties table.
    #[must_use]
    pub fn etl_namespace(&self) -> WarehouseNamespace {
        WarehouseNamespace {
            project: self.warehouse_project.clone(),
            dataset: self.warehouse_dataset.clone(),
            table: self.warehouse_etl_table.clone(),
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("source_name", &self.source_name)
            .field("search_query", &self.search_query)
            .field("site_root", &self.site_root)
            .field("output_format", &self.output_format)
            .field("output_dir", &self.output_dir)
            .field("record_cap", &self.record_cap)
            .field("max_pages", &self.max_pages)
            .field("detail_wait_secs", &self.detail_wait_secs)
            .field("detail_settle_ms", &self.detail_settle_ms)
            .field("detail_jitter_min_ms", &self.detail_jitter_min_ms)
            .field("detail_jitter_max_ms", &self.detail_jitter_max_ms)
            .field("root_settle_ms", &self.root_settle_ms)
            .field("input_settle_ms", &self.input_settle_ms)
            .field("search_settle_ms", &self.search_settle_ms)
            .field("page_settle_ms", &self.page_settle_ms)
            .field("headless", &self.headless)
            .field("chrome_path", &self.chrome_path)
            .field("window_width", &self.window_width)
            .field("window_height", &self.window_height)
            .field("selectors_path", &self.selectors_path)
            .field("screenshot_dir", &self.screenshot_dir)
            .field("warehouse_project", &self.warehouse_project)
            .field("warehouse_dataset", &self.warehouse_dataset)
            .field("warehouse_scrape_table", &self.warehouse_scrape_table)
            .field("warehouse_etl_table", &self.warehouse_etl_table)
            .field(
                "warehouse_credentials_path",
                &self.warehouse_credentials_path,
            )
            .field(
                "warehouse_access_token",
                &self.warehouse_access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("warehouse_base_url", &self.warehouse_base_url)
            .field("warehouse_timeout_secs", &self.warehouse_timeout_secs)
            .field(
                "warehouse_poll_interval_ms",
                &self.warehouse_poll_interval_ms,
            )
            .field("warehouse_max_polls", &self.warehouse_max_polls)
            .field("etl_input_dir", &self.etl_input_dir)
            .field("etl_bookings_file", &self.etl_bookings_file)
            .field("etl_properties_file", &self.etl_properties_file)
            .field("etl_output_dir", &self.etl_output_dir)
            .field("etl_output_file", &self.etl_output_file)
            .finish()
    }
}
