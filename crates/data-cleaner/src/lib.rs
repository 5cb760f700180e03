//! Listing Data Cleaning
//!
//! Parses scraped rent and sale listings into the cleaned dataset the trainer
//! consumes.

mod cleaner;
mod error;
mod io;
mod parser;

pub use cleaner::{CleanedListing, CleaningStats, ListingCleaner, RawListing};
pub use error::CleanError;
pub use io::{read_cleaned_listings, read_raw_listings, write_cleaned_listings, CLEANED_COLUMNS};
pub use parser::{parse_count, FieldParser};
