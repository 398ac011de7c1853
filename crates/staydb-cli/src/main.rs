mod etl;
mod scrape;

use clap::{Parser, Subcommand};
use staydb_core::OutputFormat;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "staydb-cli")]
#[command(about = "Listing scraper and bookings ETL")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape listings from the configured site and save them
    Scrape {
        /// Search query typed into the site's search box
        #[arg(long)]
        query: Option<String>,
        /// Run label; also the output file name
        #[arg(long)]
        source: Option<String>,
        /// Output file format (csv or json)
        #[arg(long)]
        format: Option<OutputFormat>,
        /// Maximum number of records written to the output file
        #[arg(long)]
        cap: Option<usize>,
        /// Skip the warehouse upload
        #[arg(long)]
        no_upload: bool,
    },
    /// Combine the bookings and properties exports
    Etl {
        /// Skip the warehouse upload
        #[arg(long)]
        no_upload: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let mut config = staydb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(env = %config.env, "configuration loaded");

    match cli.command {
        Commands::Scrape {
            query,
            source,
            format,
            cap,
            no_upload,
        } => {
            if let Some(query) = query {
                config.search_query = query;
            }
            if let Some(source) = source {
                config.source_name = source;
            }
            if let Some(format) = format {
                config.output_format = format;
            }
            if let Some(cap) = cap {
                config.record_cap = cap;
            }
            scrape::run_scrape_command(&config, !no_upload).await?;
        }
        Commands::Etl { no_upload } => {
            etl::run_etl_command(&config, !no_upload).await?;
        }
    }

    Ok(())
}
