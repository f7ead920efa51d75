use crate::domain::payout::{Outcome, PayoutId, PayoutRecord, PayoutStatus};
use crate::domain::ports::{PayoutStoreRef, SettlementError, SettlementGatewayRef};
use crate::error::{PayoutError, Result};
use tracing::{info, warn};

/// Outcome of a terminal write that raced an external cancellation.
enum Finalized {
    Done,
    CancelledMeanwhile,
}

/// The unit of work executed per payout: claim the record under the row
/// lock, run field validation, invoke settlement, finalize state.
///
/// `process` is idempotent with respect to re-delivery: once a record has
/// left `Pending`, a second invocation reports `Skipped` and mutates
/// nothing.
pub struct ProcessingWorker {
    store: PayoutStoreRef,
    gateway: SettlementGatewayRef,
}

impl ProcessingWorker {
    pub fn new(store: PayoutStoreRef, gateway: SettlementGatewayRef) -> Self {
        Self { store, gateway }
    }

    /// Runs one processing attempt on a `Pending` record.
    ///
    /// Permanent results come back as `Ok(outcome)`. A transient
    /// settlement failure is the only `Err` path the caller should see:
    /// the record is left in `Processing` because the external
    /// operation's true outcome is unknown until retries are exhausted.
    pub async fn process(&self, id: PayoutId) -> Result<Outcome> {
        let Some((mut record, row_lock)) = self.store.acquire_exclusive(id).await? else {
            warn!(payout = %id, "payout not found");
            return Ok(Outcome::NotFound);
        };

        if record.status != PayoutStatus::Pending {
            warn!(payout = %id, status = %record.status, "payout not pending, skipping");
            return Ok(Outcome::Skipped);
        }

        record.transition(PayoutStatus::Processing)?;
        self.store.save(&record).await?;
        // Release the row before the slow settlement call so a re-delivery
        // (which will observe non-Pending and skip) is never blocked.
        drop(row_lock);

        info!(payout = %id, amount = %record.amount, currency = %record.currency,
            "payout processing started");

        if let Err(reason) = record.validate_fields() {
            warn!(payout = %id, %reason, "payout failed validation");
            return match self.finalize(id, PayoutStatus::Failed, Some(reason)).await? {
                Finalized::Done => Ok(Outcome::ValidationFailed),
                Finalized::CancelledMeanwhile => Ok(Outcome::Cancelled),
            };
        }

        self.settle(record).await
    }

    /// Re-delivery entry for a record a transient failure left in
    /// `Processing`. Goes straight back to settlement: field validation
    /// ran before the first attempt and is not repeated. A record
    /// cancelled during the retry delay gets no further attempts.
    pub(crate) async fn resume(&self, id: PayoutId) -> Result<Outcome> {
        let Some((record, row_lock)) = self.store.acquire_exclusive(id).await? else {
            warn!(payout = %id, "payout not found on retry");
            return Ok(Outcome::NotFound);
        };

        match record.status {
            PayoutStatus::Processing => {}
            PayoutStatus::Cancelled => {
                warn!(payout = %id, "payout cancelled during retry window");
                return Ok(Outcome::Cancelled);
            }
            status => {
                warn!(payout = %id, %status, "payout no longer in flight, skipping retry");
                return Ok(Outcome::Skipped);
            }
        }
        drop(row_lock);

        info!(payout = %id, "retrying settlement");
        self.settle(record).await
    }

    async fn settle(&self, record: PayoutRecord) -> Result<Outcome> {
        let id = record.id;
        match self.gateway.attempt_settlement(&record).await {
            Ok(()) => match self.finalize(id, PayoutStatus::Completed, None).await? {
                Finalized::Done => {
                    info!(payout = %id, "payout completed");
                    Ok(Outcome::Completed)
                }
                Finalized::CancelledMeanwhile => Ok(Outcome::Cancelled),
            },
            Err(SettlementError::Rejected(reason)) => {
                warn!(payout = %id, %reason, "settlement rejected payout");
                match self.finalize(id, PayoutStatus::Failed, Some(reason)).await? {
                    Finalized::Done => Ok(Outcome::Failed),
                    Finalized::CancelledMeanwhile => Ok(Outcome::Cancelled),
                }
            }
            Err(SettlementError::Transient(reason)) => {
                Err(PayoutError::TransientSettlement(reason))
            }
        }
    }

    /// Writes a terminal status under a re-acquired row lock, validating
    /// against the current committed state. A record cancelled while
    /// settlement was in flight is left untouched and reported as such;
    /// cancellation cannot abort a call already in progress, only future
    /// transitions.
    async fn finalize(
        &self,
        id: PayoutId,
        to: PayoutStatus,
        error_message: Option<String>,
    ) -> Result<Finalized> {
        let Some((mut record, _row_lock)) = self.store.acquire_exclusive(id).await? else {
            return Err(PayoutError::NotFound(id));
        };

        if record.status == PayoutStatus::Cancelled {
            warn!(payout = %id, "payout was cancelled mid-flight, leaving terminal state");
            return Ok(Finalized::CancelledMeanwhile);
        }

        match error_message {
            Some(message) => record.fail(message)?,
            None => record.transition(to)?,
        }
        self.store.save(&record).await?;
        Ok(Finalized::Done)
    }
}
