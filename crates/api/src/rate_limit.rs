//! Rate Limiting Middleware using GCRA Algorithm
//!
//! Per-IP limits on the prediction endpoint via tower_governor. The peer
//! address comes from `ConnectInfo`, so the server must be started with
//! `into_make_service_with_connect_info::<SocketAddr>()`.

use crate::config::RateLimitSettings;
use governor::middleware::StateInformationMiddleware;
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;

/// Governor config with X-RateLimit-* headers enabled
pub type PredictGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Build the governor config, or `None` if the settings are unusable
/// (a zero period or burst)
pub fn create_governor_config(settings: &RateLimitSettings) -> Option<Arc<PredictGovernorConfig>> {
    GovernorConfigBuilder::default()
        .per_second(settings.per_second)
        .burst_size(settings.burst_size)
        .use_headers()
        .finish()
        .map(Arc::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_governor_config() {
        let settings = RateLimitSettings {
            enabled: true,
            per_second: 2,
            burst_size: 5,
        };
        assert!(create_governor_config(&settings).is_some());
    }

    #[test]
    fn test_zero_burst_is_rejected() {
        let settings = RateLimitSettings {
            enabled: true,
            per_second: 1,
            burst_size: 0,
        };
        assert!(create_governor_config(&settings).is_none());
    }
}
