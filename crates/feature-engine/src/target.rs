//! Log-space target transform
//!
//! Prices are heavily right-skewed, so models are fitted on `ln(1 + price)`
//! and predictions are mapped back with `exp(y) - 1`.

/// Map a price into log space
pub fn log_target(price: f64) -> f64 {
    price.ln_1p()
}

/// Map a log-space prediction back to a price
pub fn restore_target(log_price: f64) -> f64 {
    log_price.exp_m1()
}
