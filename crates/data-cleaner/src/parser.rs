//! Field Parsers for Raw Listing Text

use feature_engine::STUDIO_BEDROOMS;
use regex::Regex;

/// Parses the free-text fields of a scraped listing
pub struct FieldParser {
    /// First run of digits and thousands separators that holds a digit
    size_pattern: Regex,
}

impl FieldParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self {
            size_pattern: Regex::new(r"[\d,]*\d[\d,]*").unwrap(),
        }
    }

    /// Price from text such as `"RM 1,500 /month"`.
    ///
    /// Only the part before the first `/` counts; every character other than
    /// digits and `.` is removed from it before parsing.
    pub fn parse_price(&self, raw: &str) -> Option<f64> {
        let head = raw.split('/').next().unwrap_or_default();
        let digits: String = head
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if digits.is_empty() {
            return None;
        }
        digits.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Floor area from text such as `"1,200 sq. ft."`
    pub fn parse_size(&self, raw: &str) -> Option<f64> {
        let run = self.size_pattern.find(raw)?;
        run.as_str().replace(',', "").parse::<f64>().ok()
    }

    /// Bedroom count; "Studio" maps to [`STUDIO_BEDROOMS`]
    pub fn parse_bedrooms(&self, raw: &str) -> Option<u32> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("studio") {
            return Some(STUDIO_BEDROOMS);
        }
        parse_count(trimmed)
    }

    /// Bathroom count
    pub fn parse_bathrooms(&self, raw: &str) -> Option<u32> {
        parse_count(raw.trim())
    }

    /// First comma-delimited segment of a location, e.g. `"Mont Kiara"`
    /// from `"Mont Kiara, Kuala Lumpur"`
    pub fn primary_location(&self, raw: &str) -> Option<String> {
        let first = raw.split(',').next().unwrap_or_default().trim();
        non_empty(first)
    }

    /// Property type, trimmed
    pub fn property_type(&self, raw: &str) -> Option<String> {
        non_empty(raw.trim())
    }
}

impl Default for FieldParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a non-negative whole number, accepting integral floats like "3.0"
pub fn parse_count(text: &str) -> Option<u32> {
    let value = text.parse::<f64>().ok()?;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return None;
    }
    Some(value as u32)
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
