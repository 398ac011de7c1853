//! `scrape` command: one scraper run, then the file and warehouse sinks.
//!
//! The file receives at most `record_cap` records; the warehouse receives
//! every record the run collected.

use anyhow::Context;
use staydb_core::AppConfig;
use staydb_sink::{BigQueryClient, Table, WriteDisposition};

/// Scrapes the configured site, writes the output file, and optionally
/// replaces the scrape table in the warehouse.
///
/// # Errors
///
/// Returns an error if the selectors file is invalid, the scrape aborts,
/// or either sink fails. The output file is written before the upload is
/// attempted.
pub(crate) async fn run_scrape_command(config: &AppConfig, upload: bool) -> anyhow::Result<()> {
    let selectors = staydb_core::load_selectors(config.selectors_path.as_deref())
        .context("failed to load site selectors")?;

    let results = staydb_scraper::scrape_with_chromium(config, selectors)
        .await
        .with_context(|| format!("scrape run '{}' failed", config.source_name))?;

    let path = staydb_sink::write_records(
        &results,
        &config.output_dir,
        &config.source_name,
        config.output_format,
    )
    .context("failed to write scrape output")?;
    println!(
        "saved {} records to {}",
        results.capped().len(),
        path.display()
    );

    if !upload {
        tracing::info!("warehouse upload skipped");
        return Ok(());
    }

    let client = BigQueryClient::from_config(config).context("failed to build warehouse client")?;
    let namespace = config.scrape_namespace();
    let summary = client
        .load_table(
            &Table::from_records(results.records()),
            &namespace,
            WriteDisposition::Replace,
        )
        .await
        .with_context(|| format!("failed to load records into {namespace}"))?;
    println!("loaded {} rows into {namespace}", summary.rows);

    Ok(())
}
