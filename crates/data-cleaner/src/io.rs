//! CSV Input and Output
//!
//! The cleaned CSV is the hand-off between the cleaner and the trainer, so
//! both directions of it live here. Columns of the cleaned file, in order:
//! `price, area_sqft, bedrooms, bathrooms, location, listing_type, property_type`.

use crate::cleaner::{CleanedListing, RawListing};
use crate::error::CleanError;
use crate::parser::parse_count;
use feature_engine::PropertyRecord;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

/// Column order of the cleaned dataset
pub const CLEANED_COLUMNS: [&str; 7] = [
    "price",
    "area_sqft",
    "bedrooms",
    "bathrooms",
    "location",
    "listing_type",
    "property_type",
];

/// Read a scraped listings CSV
pub fn read_raw_listings(path: &Path) -> Result<Vec<RawListing>, CleanError> {
    let df = read_as_text(path)?;

    let price = text_column(&df, path, "price")?;
    let size = text_column(&df, path, "size")?;
    let bedrooms = text_column(&df, path, "bedrooms")?;
    let bathrooms = text_column(&df, path, "bathrooms")?;
    let location = text_column(&df, path, "location")?;
    let property_type = text_column(&df, path, "property_type")?;

    let listings = (0..df.height())
        .map(|i| RawListing {
            price: price[i].clone(),
            size: size[i].clone(),
            bedrooms: bedrooms[i].clone(),
            bathrooms: bathrooms[i].clone(),
            location: location[i].clone(),
            property_type: property_type[i].clone(),
        })
        .collect::<Vec<_>>();

    info!("Read {} raw listings from {}", listings.len(), path.display());
    Ok(listings)
}

/// Write the cleaned dataset
pub fn write_cleaned_listings(path: &Path, listings: &[CleanedListing]) -> Result<(), CleanError> {
    let mut df = DataFrame::new(vec![
        Series::new(CLEANED_COLUMNS[0], listings.iter().map(|l| l.price).collect::<Vec<f64>>()),
        Series::new(
            CLEANED_COLUMNS[1],
            listings.iter().map(|l| l.record.area_sqft).collect::<Vec<f64>>(),
        ),
        Series::new(
            CLEANED_COLUMNS[2],
            listings.iter().map(|l| l.record.bedrooms).collect::<Vec<u32>>(),
        ),
        Series::new(
            CLEANED_COLUMNS[3],
            listings.iter().map(|l| l.record.bathrooms).collect::<Vec<u32>>(),
        ),
        Series::new(
            CLEANED_COLUMNS[4],
            listings.iter().map(|l| l.record.location.as_str()).collect::<Vec<&str>>(),
        ),
        Series::new(
            CLEANED_COLUMNS[5],
            listings.iter().map(|l| l.record.listing_type.as_str()).collect::<Vec<&str>>(),
        ),
        Series::new(
            CLEANED_COLUMNS[6],
            listings.iter().map(|l| l.record.property_type.as_str()).collect::<Vec<&str>>(),
        ),
    ])?;

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;

    info!("Wrote {} cleaned listings to {}", listings.len(), path.display());
    Ok(())
}

/// Read the cleaned dataset. Rows that no longer parse, or whose price or
/// area is negative or not finite, are skipped.
pub fn read_cleaned_listings(path: &Path) -> Result<Vec<CleanedListing>, CleanError> {
    let df = read_as_text(path)?;

    let columns = CLEANED_COLUMNS
        .iter()
        .map(|&name| text_column(&df, path, name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut listings = Vec::with_capacity(df.height());
    let mut skipped = 0usize;

    for i in 0..df.height() {
        let cell = |c: usize| columns[c][i].as_deref().map(str::trim);
        let number = |c: usize| {
            cell(c)
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v >= 0.0)
        };
        let count = |c: usize| cell(c).and_then(parse_count);
        let text = |c: usize| cell(c).filter(|s| !s.is_empty()).map(str::to_string);

        let parsed = (|| {
            Some(CleanedListing {
                price: number(0)?,
                record: PropertyRecord {
                    area_sqft: number(1)?,
                    bedrooms: count(2)?,
                    bathrooms: count(3)?,
                    location: text(4)?,
                    listing_type: text(5)?,
                    property_type: text(6)?,
                },
            })
        })();

        match parsed {
            Some(listing) => listings.push(listing),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("Skipped {} unparsable rows in {}", skipped, path.display());
    }
    info!("Loaded {} cleaned listings from {}", listings.len(), path.display());
    Ok(listings)
}

/// Load a CSV with every column kept as text
fn read_as_text(path: &Path) -> Result<DataFrame, CleanError> {
    if !path.exists() {
        return Err(CleanError::MissingInput(path.to_path_buf()));
    }
    let file = File::open(path)?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()?;

    Ok(df)
}

fn text_column(
    df: &DataFrame,
    path: &Path,
    column: &'static str,
) -> Result<Vec<Option<String>>, CleanError> {
    let series = df.column(column).map_err(|_| CleanError::MissingColumn {
        path: path.to_path_buf(),
        column,
    })?;
    let series = series.cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}
