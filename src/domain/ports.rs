use super::payout::{PayoutId, PayoutRecord};
use crate::error::Result;
use async_trait::async_trait;
use std::any::Any;
use thiserror::Error;

/// Token standing for a held row lock. Implementations return whatever
/// keeps their exclusivity alive; dropping it releases the row.
pub type RowLock = Box<dyn Any + Send>;

/// Durable record of payout state with row-level exclusivity.
///
/// `acquire_exclusive` followed by `save` is the single read-modify-write
/// step the engine relies on: the second acquirer of an id blocks until
/// the first drops its [`RowLock`], so at most one caller observes a
/// record between its load and its write.
#[async_trait]
pub trait PayoutStore: Send + Sync {
    /// Inserts a new record; an existing id is rejected.
    async fn create(&self, record: PayoutRecord) -> Result<()>;

    /// Non-exclusive read of the committed record.
    async fn get(&self, id: PayoutId) -> Result<Option<PayoutRecord>>;

    /// Acquires the row lock for `id`, blocking until any current holder
    /// releases, and returns the committed record with the lock.
    async fn acquire_exclusive(&self, id: PayoutId) -> Result<Option<(PayoutRecord, RowLock)>>;

    /// Persists the record. Callers mutate the copy handed out by
    /// `acquire_exclusive` and save it back while still holding the lock.
    async fn save(&self, record: &PayoutRecord) -> Result<()>;

    /// All committed records, unordered.
    async fn all(&self) -> Result<Vec<PayoutRecord>>;
}

#[derive(Error, Debug)]
pub enum SettlementError {
    /// The rail misbehaved; the true outcome is unknown and the attempt
    /// may be retried.
    #[error("transient settlement failure: {0}")]
    Transient(String),
    /// The rail refused the payout outright; retrying cannot help.
    #[error("settlement rejected: {0}")]
    Rejected(String),
}

/// The external action that actually moves funds. Simulated in this
/// crate; a real rail client implements the same capability without
/// touching the state machine.
#[async_trait]
pub trait SettlementGateway: Send + Sync {
    async fn attempt_settlement(&self, record: &PayoutRecord)
    -> std::result::Result<(), SettlementError>;
}

pub type PayoutStoreRef = std::sync::Arc<dyn PayoutStore>;
pub type SettlementGatewayRef = std::sync::Arc<dyn SettlementGateway>;
