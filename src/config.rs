use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry behavior for transient settlement failures.
///
/// `max_retries` counts re-deliveries after the first attempt, so the
/// settlement step runs at most `max_retries + 1` times per payout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 60_000,
        }
    }
}

impl RetryPolicy {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Tuning for the simulated settlement rail.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Probability in `[0, 1]` that an attempt signals a transient failure.
    pub failure_rate: f64,
    pub latency_min_ms: u64,
    pub latency_max_ms: u64,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            failure_rate: 0.1,
            latency_min_ms: 2_000,
            latency_max_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub retry: RetryPolicy,
    pub settlement: SettlementConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.retry_delay(), Duration::from_secs(60));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.settlement.failure_rate, 0.1);
        assert_eq!(parsed.retry.max_retries, 3);
    }
}
