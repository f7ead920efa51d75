//! The legal payout state graph.
//!
//! The table is closed: anything not listed here is denied, including
//! self-transitions and any move out of a terminal status. Every mutation
//! of `PayoutRecord::status` goes through [`validate`], both the worker's
//! internal progression and externally requested status changes.

use crate::domain::payout::PayoutStatus;
use crate::error::{PayoutError, Result};

/// Returns whether `from -> to` is a legal transition.
pub fn is_allowed(from: PayoutStatus, to: PayoutStatus) -> bool {
    use PayoutStatus::*;
    matches!(
        (from, to),
        (Pending, Processing)
            | (Pending, Cancelled)
            | (Processing, Completed)
            | (Processing, Failed)
            | (Processing, Cancelled)
    )
}

/// Checks `from -> to` against the table. Denial is a rejected request
/// carrying the offending pair, not a fatal error.
pub fn validate(from: PayoutStatus, to: PayoutStatus) -> Result<()> {
    if is_allowed(from, to) {
        Ok(())
    } else {
        Err(PayoutError::InvalidTransition { from, to })
    }
}
