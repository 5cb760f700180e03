//! Property Records

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bedroom count assigned to listings advertised as "Studio".
///
/// Every component that turns bedroom text into a count must use this value.
pub const STUDIO_BEDROOMS: u32 = 1;

/// Numeric fields, in column order
pub const NUMERIC_FIELDS: [&str; 3] = ["area_sqft", "bedrooms", "bathrooms"];

/// Categorical fields, in column order
pub const CATEGORICAL_FIELDS: [&str; 3] = ["location", "listing_type", "property_type"];

/// Whether a listing is for rent or for sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Rent,
    Sale,
}

impl ListingType {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Rent => "rent",
            ListingType::Sale => "sale",
        }
    }
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rent" => Ok(ListingType::Rent),
            "sale" => Ok(ListingType::Sale),
            other => Err(format!("unknown listing type '{}'", other)),
        }
    }
}

/// A single property, as seen by the encoder
///
/// Categorical values are kept as free text: a value the schema has never
/// seen is not an error, it simply matches no one-hot column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    /// Floor area in square feet
    pub area_sqft: f64,
    /// Bedroom count
    pub bedrooms: u32,
    /// Bathroom count
    pub bathrooms: u32,
    /// Primary location segment (e.g. "Mont Kiara")
    pub location: String,
    /// "rent" or "sale"
    pub listing_type: String,
    /// Property type (e.g. "Condominium")
    pub property_type: String,
}

impl PropertyRecord {
    /// Numeric fields paired with their column names
    pub fn numeric_values(&self) -> [(&'static str, f64); 3] {
        [
            (NUMERIC_FIELDS[0], self.area_sqft),
            (NUMERIC_FIELDS[1], self.bedrooms as f64),
            (NUMERIC_FIELDS[2], self.bathrooms as f64),
        ]
    }

    /// Categorical fields paired with their field names
    pub fn categorical_values(&self) -> [(&'static str, &str); 3] {
        [
            (CATEGORICAL_FIELDS[0], self.location.as_str()),
            (CATEGORICAL_FIELDS[1], self.listing_type.as_str()),
            (CATEGORICAL_FIELDS[2], self.property_type.as_str()),
        ]
    }
}

/// Name of the one-hot column for a categorical value
pub(crate) fn one_hot_column(field: &str, value: &str) -> String {
    format!("{}_{}", field, value)
}
