//! Linear and Ridge Regression
//!
//! Least squares on centred data via the normal equations. One-hot columns
//! of the same field always sum to one, so the plain least-squares system is
//! rank deficient; a tiny diagonal jitter keeps it solvable and yields the
//! near minimum-norm solution.

use crate::{check_training_shape, check_width, ModelError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Relative diagonal jitter added when no explicit penalty is set
const JITTER: f64 = 1e-8;

/// Solve the symmetric positive-definite system `a·x = b` by Cholesky
/// decomposition. Returns `None` if `a` is not positive definite.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 || !diag.is_finite() {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // Forward substitution: L * y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward substitution: L^T * x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Linear regression with optional L2 penalty (ridge)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    /// L2 penalty; 0 for ordinary least squares
    pub alpha: f64,
    /// Whether to fit an unpenalised intercept
    pub fit_intercept: bool,
    coefficients: Option<Vec<f64>>,
    intercept: f64,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    /// Ordinary least squares
    pub fn new() -> Self {
        Self {
            alpha: 0.0,
            fit_intercept: true,
            coefficients: None,
            intercept: 0.0,
        }
    }

    /// Ridge regression with penalty `alpha`
    pub fn ridge(alpha: f64) -> Self {
        Self::new().with_alpha(alpha)
    }

    /// Set regularization strength
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha.max(0.0);
        self
    }

    /// Fit the model to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        check_training_shape(x, y)?;
        let n_features = x.ncols();

        let (x_mean, y_mean) = if self.fit_intercept {
            (
                x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(n_features)),
                y.mean().unwrap_or(0.0),
            )
        } else {
            (Array1::zeros(n_features), 0.0)
        };

        let x_centered = x - &x_mean;
        let y_centered = y - y_mean;

        let mut gram = x_centered.t().dot(&x_centered);
        let rhs = x_centered.t().dot(&y_centered);

        let mean_diag = gram.diag().sum() / n_features as f64;
        let penalty = if self.alpha > 0.0 {
            self.alpha
        } else {
            JITTER * mean_diag.max(1.0)
        };
        for i in 0..n_features {
            gram[[i, i]] += penalty;
        }

        let weights = cholesky_solve(&gram, &rhs).ok_or_else(|| {
            ModelError::SingularMatrix(format!("{}x{} normal equations", n_features, n_features))
        })?;

        self.intercept = y_mean - x_mean.dot(&weights);
        self.coefficients = Some(weights.to_vec());

        debug!(
            "Fitted linear model: {} features, alpha={}, intercept={:.4}",
            n_features, self.alpha, self.intercept
        );
        Ok(())
    }

    /// Predict targets for each row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        let coefficients = self.coefficients.as_ref().ok_or(ModelError::NotFitted)?;
        check_width(coefficients.len(), x)?;

        let weights = Array1::from_vec(coefficients.clone());
        Ok(x.dot(&weights) + self.intercept)
    }

    /// Fitted coefficients
    pub fn coefficients(&self) -> Option<&[f64]> {
        self.coefficients.as_deref()
    }

    /// Fitted intercept
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Number of input features, once fitted
    pub fn n_features(&self) -> Option<usize> {
        self.coefficients.as_ref().map(Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((50, 2), |(i, j)| ((i * (j + 3)) % 17) as f64);
        let y = x
            .rows()
            .into_iter()
            .map(|row| 3.0 * row[0] - 2.0 * row[1] + 5.0)
            .collect();
        (x, y)
    }

    #[test]
    fn test_recovers_exact_relation() {
        let (x, y) = linear_data();
        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients().unwrap();
        assert!((coef[0] - 3.0).abs() < 1e-4);
        assert!((coef[1] + 2.0).abs() < 1e-4);
        assert!((model.intercept() - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_collinear_one_hot_columns() {
        // Two indicator columns that always sum to one, plus a numeric column
        let x = Array2::from_shape_fn((40, 3), |(i, j)| match j {
            0 => i as f64,
            1 => (i % 2) as f64,
            _ => 1.0 - (i % 2) as f64,
        });
        let y: Array1<f64> = (0..40).map(|i| 0.5 * i as f64 + if i % 2 == 1 { 4.0 } else { 0.0 }).collect();

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let predictions = model.predict(&x).unwrap();

        for (p, t) in predictions.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-3, "prediction {} vs target {}", p, t);
        }
    }

    #[test]
    fn test_ridge_shrinks_coefficients() {
        let (x, y) = linear_data();
        let mut ols = LinearRegression::new();
        let mut ridge = LinearRegression::ridge(1_000.0);
        ols.fit(&x, &y).unwrap();
        ridge.fit(&x, &y).unwrap();

        let norm = |c: &[f64]| c.iter().map(|v| v * v).sum::<f64>();
        assert!(norm(ridge.coefficients().unwrap()) < norm(ols.coefficients().unwrap()));
    }

    #[test]
    fn test_predict_checks_width() {
        let (x, y) = linear_data();
        let mut model = LinearRegression::new();
        assert_eq!(model.predict(&x), Err(ModelError::NotFitted));

        model.fit(&x, &y).unwrap();
        let wrong = Array2::zeros((1, 3));
        assert!(matches!(model.predict(&wrong), Err(ModelError::InvalidInputShape { .. })));
    }
}
