use crate::application::retry::{OutcomeReceiver, PayoutProcessor};
use crate::application::worker::ProcessingWorker;
use crate::config::EngineConfig;
use crate::domain::payout::{Currency, PayoutId, PayoutRecord, PayoutStatus, RecipientDetails};
use crate::domain::ports::{PayoutStoreRef, SettlementGatewayRef};
use crate::error::{PayoutError, Result};
use rust_decimal::Decimal;
use tracing::info;

/// Intake data for a new payout request.
#[derive(Debug, Clone)]
pub struct PayoutDraft {
    pub amount: Decimal,
    pub currency: Currency,
    pub recipient: RecipientDetails,
    pub description: Option<String>,
}

/// The boundary surface the external collaborator (an HTTP layer, an
/// admin tool) calls into. Owns the store and the retry processor; the
/// worker and controller are wired internally.
pub struct PayoutEngine {
    store: PayoutStoreRef,
    processor: PayoutProcessor,
}

impl PayoutEngine {
    pub fn new(store: PayoutStoreRef, gateway: SettlementGatewayRef, config: EngineConfig) -> Self {
        let worker = ProcessingWorker::new(store.clone(), gateway);
        let processor = PayoutProcessor::spawn(worker, store.clone(), config.retry);
        Self { store, processor }
    }

    /// Validates intake data, creates the record in `Pending` and
    /// enqueues processing. The receiver resolves with the final outcome.
    pub async fn submit(&self, draft: PayoutDraft) -> Result<(PayoutRecord, OutcomeReceiver)> {
        if draft.amount < Decimal::new(1, 2) {
            return Err(PayoutError::Validation(format!(
                "amount must be at least 0.01, got {}",
                draft.amount
            )));
        }
        draft.recipient.validate_format()?;

        let record = PayoutRecord::new(
            draft.amount,
            draft.currency,
            draft.recipient,
            draft.description,
        );
        self.store.create(record.clone()).await?;
        info!(payout = %record.id, amount = %record.amount, currency = %record.currency,
            "payout submitted");

        let receiver = self.processor.submit(record.id);
        Ok((record, receiver))
    }

    /// Re-delivery entry point for an already created record.
    pub fn enqueue(&self, id: PayoutId) -> OutcomeReceiver {
        self.processor.submit(id)
    }

    /// Externally requested status change, validated against the
    /// transition table under the row lock. Denial names the offending
    /// `(from, to)` pair. A `Failed` target records the supplied message;
    /// any other target clears the diagnostic.
    pub async fn request_status(
        &self,
        id: PayoutId,
        to: PayoutStatus,
        error_message: Option<String>,
    ) -> Result<PayoutRecord> {
        let Some((mut record, _row_lock)) = self.store.acquire_exclusive(id).await? else {
            return Err(PayoutError::NotFound(id));
        };

        if to == PayoutStatus::Failed {
            let message = error_message.unwrap_or_else(|| "marked failed by operator".into());
            record.fail(message)?;
        } else {
            record.transition(to)?;
        }
        self.store.save(&record).await?;
        info!(payout = %id, status = %to, "status changed by request");
        Ok(record)
    }

    /// Updates the free-form description without touching lifecycle state.
    pub async fn update_description(
        &self,
        id: PayoutId,
        description: Option<String>,
    ) -> Result<PayoutRecord> {
        let Some((mut record, _row_lock)) = self.store.acquire_exclusive(id).await? else {
            return Err(PayoutError::NotFound(id));
        };
        record.description = description;
        self.store.save(&record).await?;
        Ok(record)
    }

    pub async fn get(&self, id: PayoutId) -> Result<PayoutRecord> {
        self.store
            .get(id)
            .await?
            .ok_or(PayoutError::NotFound(id))
    }

    pub async fn all(&self) -> Result<Vec<PayoutRecord>> {
        self.store.all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payout::{Outcome, test_recipient};
    use crate::domain::ports::PayoutStore;
    use crate::infrastructure::in_memory::InMemoryPayoutStore;
    use crate::infrastructure::settlement::SimulatedSettlement;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn engine(failure_rate: f64) -> (PayoutEngine, Arc<InMemoryPayoutStore>) {
        let store = Arc::new(InMemoryPayoutStore::new());
        let gateway = Arc::new(SimulatedSettlement::instant(failure_rate));
        let engine = PayoutEngine::new(store.clone(), gateway, EngineConfig::default());
        (engine, store)
    }

    fn draft() -> PayoutDraft {
        PayoutDraft {
            amount: dec!(50.00),
            currency: Currency::Rub,
            recipient: test_recipient(),
            description: Some("invoice 42".into()),
        }
    }

    #[tokio::test]
    async fn test_submit_creates_pending_and_completes() {
        let (engine, _store) = engine(0.0);
        let (record, receiver) = engine.submit(draft()).await.unwrap();
        assert_eq!(record.status, PayoutStatus::Pending);

        assert_eq!(receiver.await.unwrap(), Outcome::Completed);
        let committed = engine.get(record.id).await.unwrap();
        assert_eq!(committed.status, PayoutStatus::Completed);
        assert_eq!(committed.description.as_deref(), Some("invoice 42"));
    }

    #[tokio::test]
    async fn test_submit_rejects_sub_minimum_amount() {
        let (engine, store) = engine(0.0);
        let mut bad = draft();
        bad.amount = dec!(0.00);
        let err = engine.submit(bad).await.unwrap_err();
        assert!(matches!(err, PayoutError::Validation(_)));
        assert!(store.all().await.unwrap().is_empty(), "no record created");
    }

    #[tokio::test]
    async fn test_submit_rejects_malformed_recipient() {
        let (engine, store) = engine(0.0);
        let mut bad = draft();
        bad.recipient.bik = "123".into();
        assert!(engine.submit(bad).await.is_err());
        assert!(store.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_request_status_cancels_pending() {
        let (engine, store) = engine(0.0);
        let record = PayoutRecord::new(dec!(10.00), Currency::Usd, test_recipient(), None);
        let id = record.id;
        store.create(record).await.unwrap();

        let updated = engine
            .request_status(id, PayoutStatus::Cancelled, None)
            .await
            .unwrap();
        assert_eq!(updated.status, PayoutStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_request_status_rejects_illegal_pair() {
        let (engine, store) = engine(0.0);
        let record = PayoutRecord::new(dec!(10.00), Currency::Usd, test_recipient(), None);
        let id = record.id;
        store.create(record).await.unwrap();

        let err = engine
            .request_status(id, PayoutStatus::Completed, None)
            .await
            .unwrap_err();
        match err {
            PayoutError::InvalidTransition { from, to } => {
                assert_eq!(from, PayoutStatus::Pending);
                assert_eq!(to, PayoutStatus::Completed);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Rejection performs no mutation.
        assert_eq!(
            engine.get(id).await.unwrap().status,
            PayoutStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_request_status_unknown_id() {
        let (engine, _store) = engine(0.0);
        let err = engine
            .request_status(PayoutId::new(), PayoutStatus::Cancelled, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PayoutError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_description() {
        let (engine, store) = engine(0.0);
        let record = PayoutRecord::new(dec!(10.00), Currency::Usd, test_recipient(), None);
        let id = record.id;
        store.create(record).await.unwrap();

        let updated = engine
            .update_description(id, Some("corrected".into()))
            .await
            .unwrap();
        assert_eq!(updated.description.as_deref(), Some("corrected"));
        assert_eq!(updated.status, PayoutStatus::Pending);
    }
}
