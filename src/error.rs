use crate::domain::payout::{PayoutId, PayoutStatus};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PayoutError>;

#[derive(Error, Debug)]
pub enum PayoutError {
    #[error("payout {0} not found")]
    NotFound(PayoutId),
    #[error("cannot transition payout from {from} to {to}")]
    InvalidTransition {
        from: PayoutStatus,
        to: PayoutStatus,
    },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("transient settlement failure: {0}")]
    TransientSettlement(String),
    #[error("settlement rejected: {0}")]
    SettlementRejected(String),
    #[error("payout {0} already exists")]
    DuplicateId(PayoutId),
    #[error("internal error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl PayoutError {
    /// Transient errors are the only ones the retry controller re-delivers.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientSettlement(_))
    }
}
