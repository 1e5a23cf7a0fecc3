use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Propagation and barrier settings shared by every replica on a network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Upper bound on `await_consistency`.
    pub consistency_timeout_ms: u64,
    /// Each delivery is delayed by a random 0..=max_jitter_ms.
    pub max_jitter_ms: u64,
    /// Probability that a delivery is sent twice.
    pub duplicate_probability: f64,
    /// Retries after a failed delivery attempt.
    pub redelivery_attempts: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            consistency_timeout_ms: 5_000,
            max_jitter_ms: 5,
            duplicate_probability: 0.0,
            redelivery_attempts: 3,
        }
    }
}

impl NetworkConfig {
    pub fn consistency_timeout(&self) -> Duration {
        Duration::from_millis(self.consistency_timeout_ms)
    }

    /// Deterministic delivery for tests: no jitter, no duplicates.
    pub fn immediate() -> Self {
        Self {
            max_jitter_ms: 0,
            duplicate_probability: 0.0,
            ..Self::default()
        }
    }
}
