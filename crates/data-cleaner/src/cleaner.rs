//! Listing Cleaner

use crate::parser::FieldParser;
use feature_engine::{ListingType, PropertyRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// A listing as scraped, every field free text and possibly absent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawListing {
    pub price: Option<String>,
    pub size: Option<String>,
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,
    pub location: Option<String>,
    pub property_type: Option<String>,
}

/// A fully parsed listing with its observed price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedListing {
    /// Listed price (monthly rent or sale price, MYR)
    pub price: f64,
    /// Features describing the property
    pub record: PropertyRecord,
}

/// Outcome counts for one cleaning pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningStats {
    /// Rows read
    pub total: usize,
    /// Rows kept
    pub kept: usize,
    /// Dropped rows, keyed by the first field that failed to parse
    pub dropped_by_field: BTreeMap<&'static str, usize>,
}

impl CleaningStats {
    /// Number of dropped rows
    pub fn dropped(&self) -> usize {
        self.total - self.kept
    }
}

/// Turns raw listings into cleaned ones, dropping any row with a field that
/// cannot be parsed
pub struct ListingCleaner {
    parser: FieldParser,
}

impl ListingCleaner {
    /// Create a new cleaner
    pub fn new() -> Self {
        Self {
            parser: FieldParser::new(),
        }
    }

    /// Clean a batch of listings that share a listing type
    pub fn clean(
        &self,
        raw: &[RawListing],
        listing_type: ListingType,
    ) -> (Vec<CleanedListing>, CleaningStats) {
        info!("Cleaning {} data ({} rows)", listing_type, raw.len());

        let mut stats = CleaningStats {
            total: raw.len(),
            ..Default::default()
        };
        let mut cleaned = Vec::with_capacity(raw.len());

        for (row, listing) in raw.iter().enumerate() {
            match self.clean_one(listing, listing_type) {
                Ok(listing) => cleaned.push(listing),
                Err(field) => {
                    debug!("Dropping {} row {}: unusable {}", listing_type, row, field);
                    *stats.dropped_by_field.entry(field).or_insert(0) += 1;
                }
            }
        }

        stats.kept = cleaned.len();
        info!(
            "Kept {} of {} {} rows ({} dropped)",
            stats.kept,
            stats.total,
            listing_type,
            stats.dropped()
        );

        (cleaned, stats)
    }

    /// Clean one listing, or name the first field that made it unusable
    pub fn clean_one(
        &self,
        raw: &RawListing,
        listing_type: ListingType,
    ) -> Result<CleanedListing, &'static str> {
        let p = &self.parser;

        let price = field(&raw.price, "price", |s| p.parse_price(s))?;
        let area_sqft = field(&raw.size, "area_sqft", |s| p.parse_size(s))?;
        let bedrooms = field(&raw.bedrooms, "bedrooms", |s| p.parse_bedrooms(s))?;
        let bathrooms = field(&raw.bathrooms, "bathrooms", |s| p.parse_bathrooms(s))?;
        let location = field(&raw.location, "location", |s| p.primary_location(s))?;
        let property_type = field(&raw.property_type, "property_type", |s| p.property_type(s))?;

        Ok(CleanedListing {
            price,
            record: PropertyRecord {
                area_sqft,
                bedrooms,
                bathrooms,
                location,
                listing_type: listing_type.as_str().to_string(),
                property_type,
            },
        })
    }
}

impl Default for ListingCleaner {
    fn default() -> Self {
        Self::new()
    }
}

fn field<T>(
    value: &Option<String>,
    name: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, &'static str> {
    value.as_deref().and_then(parse).ok_or(name)
}
