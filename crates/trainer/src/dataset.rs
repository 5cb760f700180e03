//! Dataset Preparation

use crate::TrainError;
use data_cleaner::CleanedListing;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::info;

/// Quantile of `values` with linear interpolation between closest ranks.
///
/// Returns `None` for an empty slice. `q` is clamped to `[0, 1]`.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Inclusive price bounds kept by the outlier filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutlierBounds {
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBounds {
    pub fn contains(&self, price: f64) -> bool {
        self.lower <= price && price <= self.upper
    }
}

/// Keep listings priced within the `[lower_q, upper_q]` quantile band
pub fn filter_outliers(
    listings: Vec<CleanedListing>,
    lower_q: f64,
    upper_q: f64,
) -> (Vec<CleanedListing>, Option<OutlierBounds>) {
    let prices: Vec<f64> = listings.iter().map(|l| l.price).collect();
    let (Some(lower), Some(upper)) = (quantile(&prices, lower_q), quantile(&prices, upper_q)) else {
        return (listings, None);
    };
    let bounds = OutlierBounds { lower, upper };

    let before = listings.len();
    let kept: Vec<CleanedListing> = listings.into_iter().filter(|l| bounds.contains(l.price)).collect();
    info!(
        "Outlier filter kept {} of {} listings (price {:.2} ..= {:.2})",
        kept.len(),
        before,
        lower,
        upper
    );
    (kept, Some(bounds))
}

/// Row indices of a hold-out split
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Seeded shuffle split. The test side gets `ceil(test_fraction * n)` rows
/// and both sides are guaranteed non-empty.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> Result<Split, TrainError> {
    if n < 2 {
        return Err(TrainError::InsufficientData(format!(
            "{} rows cannot be split into train and test sets",
            n
        )));
    }

    let n_test = ((n as f64 * test_fraction).ceil() as usize).clamp(1, n - 1);
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));

    let train = indices.split_off(n_test);
    Ok(Split { train, test: indices })
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_engine::PropertyRecord;
    use proptest::prelude::*;

    fn listing(price: f64) -> CleanedListing {
        CleanedListing {
            price,
            record: PropertyRecord {
                area_sqft: 800.0,
                bedrooms: 2,
                bathrooms: 1,
                location: "Cheras".to_string(),
                listing_type: "rent".to_string(),
                property_type: "Apartment".to_string(),
            },
        }
    }

    #[test]
    fn test_quantile_interpolates() {
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        assert!((quantile(&values, 0.01).unwrap() - 1.99).abs() < 1e-9);
        assert!((quantile(&values, 0.99).unwrap() - 99.01).abs() < 1e-9);
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&[5.0], 0.5), Some(5.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_filter_removes_tails() {
        let listings: Vec<CleanedListing> = (1..=100).map(|p| listing(p as f64)).collect();
        let (kept, bounds) = filter_outliers(listings, 0.01, 0.99);

        let bounds = bounds.unwrap();
        assert_eq!(kept.len(), 98);
        assert!(kept.iter().all(|l| l.price >= 2.0 && l.price <= 99.0));
        assert!(bounds.contains(2.0) && !bounds.contains(1.0) && !bounds.contains(100.0));
    }

    #[test]
    fn test_filter_keeps_rows_on_the_bounds() {
        let listings: Vec<CleanedListing> = [10.0, 10.0, 10.0, 20.0, 20.0].into_iter().map(listing).collect();
        let (kept, _) = filter_outliers(listings, 0.0, 1.0);
        assert_eq!(kept.len(), 5);
    }

    #[test]
    fn test_split_sizes_and_seed() {
        let split = train_test_split(10, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 2);
        assert_eq!(split.train.len(), 8);
        assert_eq!(split, train_test_split(10, 0.2, 42).unwrap());

        let split = train_test_split(11, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 3);

        assert!(matches!(train_test_split(1, 0.2, 42), Err(TrainError::InsufficientData(_))));
    }

    proptest! {
        #[test]
        fn prop_filter_excludes_exactly_the_tails(prices in prop::collection::vec(1.0f64..1e7, 1..200)) {
            let lower = quantile(&prices, 0.01).unwrap();
            let upper = quantile(&prices, 0.99).unwrap();
            let expected = prices.iter().filter(|&&p| p >= lower && p <= upper).count();

            let (kept, _) = filter_outliers(prices.iter().map(|&p| listing(p)).collect(), 0.01, 0.99);
            prop_assert_eq!(kept.len(), expected);
            prop_assert!(kept.iter().all(|l| l.price >= lower && l.price <= upper));
        }

        #[test]
        fn prop_split_is_a_partition(n in 2usize..500, seed in any::<u64>()) {
            let split = train_test_split(n, 0.2, seed).unwrap();
            let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
            all.sort_unstable();
            prop_assert_eq!(all, (0..n).collect::<Vec<_>>());
            prop_assert!(!split.train.is_empty() && !split.test.is_empty());
        }
    }
}
