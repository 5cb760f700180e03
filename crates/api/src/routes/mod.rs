//! HTTP Route Handlers

pub mod predict;
pub mod status;
