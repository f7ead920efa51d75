use crate::config::SettlementConfig;
use crate::domain::payout::PayoutRecord;
use crate::domain::ports::{SettlementError, SettlementGateway};
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

/// Stand-in for the real banking rail: sleeps for a random latency
/// inside the configured window, then fails transiently with the
/// configured probability. Rates of 0.0 and 1.0 make it deterministic
/// for tests.
pub struct SimulatedSettlement {
    config: SettlementConfig,
}

impl SimulatedSettlement {
    pub fn new(config: SettlementConfig) -> Self {
        Self { config }
    }

    /// No latency, configurable failure rate.
    pub fn instant(failure_rate: f64) -> Self {
        Self::new(SettlementConfig {
            failure_rate,
            latency_min_ms: 0,
            latency_max_ms: 0,
        })
    }
}

#[async_trait]
impl SettlementGateway for SimulatedSettlement {
    async fn attempt_settlement(
        &self,
        record: &PayoutRecord,
    ) -> std::result::Result<(), SettlementError> {
        // ThreadRng is not Send; draw everything before awaiting.
        let (latency, failed) = {
            let mut rng = rand::rng();
            let latency = if self.config.latency_max_ms > self.config.latency_min_ms {
                rng.random_range(self.config.latency_min_ms..=self.config.latency_max_ms)
            } else {
                self.config.latency_min_ms
            };
            (latency, rng.random_bool(self.config.failure_rate))
        };

        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if failed {
            return Err(SettlementError::Transient(format!(
                "bank rail error while settling payout {}",
                record.id
            )));
        }
        Ok(())
    }
}
