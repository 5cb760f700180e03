//! Listing Cleaner - Command Line Entry Point
//!
//! Cleans the scraped rent and sale files and writes one combined dataset.

use anyhow::{Context, Result};
use clap::Parser;
use data_cleaner::{read_raw_listings, write_cleaned_listings, CleanError, ListingCleaner};
use feature_engine::ListingType;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clean-listings")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Clean scraped rent and sale listings into one training dataset", long_about = None)]
struct Cli {
    /// Scraped rental listings
    #[arg(long, default_value = "dataset_for_rent.csv")]
    rent: PathBuf,

    /// Scraped sale listings
    #[arg(long, default_value = "dataset_for_sale.csv")]
    sale: PathBuf,

    /// Combined cleaned output
    #[arg(short, long, default_value = "properties_cleaned.csv")]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!("Starting data cleaning process...");

    let (rent, sale) = match (read_raw_listings(&cli.rent), read_raw_listings(&cli.sale)) {
        (Ok(rent), Ok(sale)) => (rent, sale),
        (Err(e @ CleanError::MissingInput(_)), _) | (_, Err(e @ CleanError::MissingInput(_))) => {
            error!("{}", e);
            std::process::exit(1);
        }
        (Err(e), _) | (_, Err(e)) => return Err(e).context("Failed to read raw listings"),
    };

    let cleaner = ListingCleaner::new();
    let (mut combined, rent_stats) = cleaner.clean(&rent, ListingType::Rent);
    let (sale_cleaned, sale_stats) = cleaner.clean(&sale, ListingType::Sale);
    combined.extend(sale_cleaned);

    for (field, count) in rent_stats
        .dropped_by_field
        .iter()
        .chain(sale_stats.dropped_by_field.iter())
    {
        info!("Dropped {} rows with unusable {}", count, field);
    }

    write_cleaned_listings(&cli.output, &combined)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    info!(
        "Data cleaning complete! Saved {} properties to '{}'",
        combined.len(),
        cli.output.display()
    );
    Ok(())
}
