use anyhow::Context;
use staydb_core::AppConfig;
use staydb_sink::BigQueryClient;

/// Runs the bookings/properties ETL.
///
/// # Errors
///
/// Returns an error if any ETL phase fails or the warehouse client cannot be
/// built.
pub(crate) async fn run_etl_command(config: &AppConfig, upload: bool) -> anyhow::Result<()> {
    let client = if upload {
        Some(BigQueryClient::from_config(config).context("failed to build warehouse client")?)
    } else {
        None
    };

    let summary = staydb_etl::run_etl(config, client.as_ref())
        .await
        .context("ETL run failed")?;

    println!(
        "combined {} rows into {}",
        summary.rows,
        summary.output_path.display()
    );
    if let Some(loaded) = summary.upload {
        println!("loaded {} rows into {}", loaded.rows, config.etl_namespace());
    }
    Ok(())
}
