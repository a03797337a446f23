use std::time::Duration;

use timeline_core::{ScopeFilter, DEFAULT_THROTTLE_INTERVAL};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum spacing between projection snapshots handed to the consumer.
    pub throttle_interval: Duration,
    pub initial_scope: ScopeFilter,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            throttle_interval: DEFAULT_THROTTLE_INTERVAL,
            initial_scope: ScopeFilter::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_scope(scope: ScopeFilter) -> Self {
        Self {
            initial_scope: scope,
            ..Self::default()
        }
    }
}
