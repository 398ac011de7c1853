use std::path::PathBuf;

use crate::app_config::{AppConfig, Environment, OutputFormat};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default matching the observed production run, so an
/// empty environment yields a usable config.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("'{other}' is not a boolean"),
            }),
        }
    };

    let env = parse_environment(&or_default("STAYDB_ENV", "development"))?;
    let log_level = or_default("STAYDB_LOG_LEVEL", "info");

    let source_name = or_default("STAYDB_SOURCE_NAME", "airbnb_barcelona");
    let search_query = or_default("STAYDB_SEARCH_QUERY", "Barcelona");
    let site_root = or_default("STAYDB_SITE_ROOT", "https://www.airbnb.com/");
    let output_format = or_default("STAYDB_OUTPUT_FORMAT", "csv")
        .parse::<OutputFormat>()
        .map_err(|reason| ConfigError::InvalidEnvVar {
            var: "STAYDB_OUTPUT_FORMAT".to_string(),
            reason,
        })?;
    let output_dir = PathBuf::from(or_default("STAYDB_OUTPUT_DIR", "./web_scraping_outputs"));
    let record_cap = parse_usize("STAYDB_RECORD_CAP", "100")?;
    let max_pages = parse_usize("STAYDB_MAX_PAGES", "50")?;
    if max_pages == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "STAYDB_MAX_PAGES".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let detail_wait_secs = parse_u64("STAYDB_DETAIL_WAIT_SECS", "2")?;
    let detail_settle_ms = parse_u64("STAYDB_DETAIL_SETTLE_MS", "2000")?;
    let detail_jitter_min_ms = parse_u64("STAYDB_DETAIL_JITTER_MIN_MS", "1000")?;
    let detail_jitter_max_ms = parse_u64("STAYDB_DETAIL_JITTER_MAX_MS", "2000")?;
    if detail_jitter_min_ms > detail_jitter_max_ms {
        return Err(ConfigError::InvalidEnvVar {
            var: "STAYDB_DETAIL_JITTER_MIN_MS".to_string(),
            reason: format!(
                "{detail_jitter_min_ms} exceeds STAYDB_DETAIL_JITTER_MAX_MS ({detail_jitter_max_ms})"
            ),
        });
    }
    let root_settle_ms = parse_u64("STAYDB_ROOT_SETTLE_MS", "1000")?;
    let input_settle_ms = parse_u64("STAYDB_INPUT_SETTLE_MS", "1000")?;
    let search_settle_ms = parse_u64("STAYDB_SEARCH_SETTLE_MS", "3000")?;
    let page_settle_ms = parse_u64("STAYDB_PAGE_SETTLE_MS", "3000")?;

    let headless = parse_bool("STAYDB_HEADLESS", "true")?;
    let chrome_path = optional("STAYDB_CHROME_PATH").map(PathBuf::from);
    let window_width = parse_u32("STAYDB_WINDOW_WIDTH", "1920")?;
    let window_height = parse_u32("STAYDB_WINDOW_HEIGHT", "1080")?;
    let selectors_path = optional("STAYDB_SELECTORS_PATH").map(PathBuf::from);
    let screenshot_dir = optional("STAYDB_SCREENSHOT_DIR").map(PathBuf::from);

    let warehouse_project = or_default("STAYDB_WAREHOUSE_PROJECT", "esoteric-throne-425604-u5");
    let warehouse_dataset = or_default("STAYDB_WAREHOUSE_DATASET", "dataset_stayunique");
    let warehouse_scrape_table = or_default("STAYDB_WAREHOUSE_SCRAPE_TABLE", "bookings_scraping");
    let warehouse_etl_table = or_default("STAYDB_WAREHOUSE_ETL_TABLE", "bookings_info");
    let warehouse_credentials_path = PathBuf::from(or_default(
        "STAYDB_WAREHOUSE_CREDENTIALS",
        "./credentials/credentials.json",
    ));
    let warehouse_access_token = optional("STAYDB_WAREHOUSE_ACCESS_TOKEN");
    let warehouse_base_url = or_default("STAYDB_WAREHOUSE_BASE_URL", "https://bigquery.googleapis.com");
    let warehouse_timeout_secs = parse_u64("STAYDB_WAREHOUSE_TIMEOUT_SECS", "60")?;
    let warehouse_poll_interval_ms = parse_u64("STAYDB_WAREHOUSE_POLL_INTERVAL_MS", "1000")?;
    let warehouse_max_polls = parse_u32("STAYDB_WAREHOUSE_MAX_POLLS", "300")?;

    let etl_input_dir = PathBuf::from(or_default("STAYDB_ETL_INPUT_DIR", "./data_ddv"));
    let etl_bookings_file = or_default("STAYDB_ETL_BOOKINGS_FILE", "Bookings.csv");
    let etl_properties_file = or_default("STAYDB_ETL_PROPERTIES_FILE", "Properties.csv");
    let etl_output_dir = PathBuf::from(or_default("STAYDB_ETL_OUTPUT_DIR", "./data_udv"));
    let etl_output_file = or_default("STAYDB_ETL_OUTPUT_FILE", "combined_data.csv");

    Ok(AppConfig {
        env,
        log_level,
        source_name,
        search_query,
        site_root,
        output_format,
        output_dir,
        record_cap,
        max_pages,
        detail_wait_secs,
        detail_settle_ms,
        detail_jitter_min_ms,
        detail_jitter_max_ms,
        root_settle_ms,
        input_settle_ms,
        search_settle_ms,
        page_settle_ms,
        headless,
        chrome_path,
        window_width,
        window_height,
        selectors_path,
        screenshot_dir,
        warehouse_project,
        warehouse_dataset,
        warehouse_scrape_table,
        warehouse_etl_table,
        warehouse_credentials_path,
        warehouse_access_token,
        warehouse_base_url,
        warehouse_timeout_secs,
        warehouse_poll_interval_ms,
        warehouse_max_polls,
        etl_input_dir,
        etl_bookings_file,
        etl_properties_file,
        etl_output_dir,
        etl_output_file,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "STAYDB_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
