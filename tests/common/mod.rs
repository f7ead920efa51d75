#![allow(dead_code)]

use async_trait::async_trait;
use payrun::domain::payout::{PayoutRecord, RecipientDetails};
use payrun::domain::ports::{SettlementError, SettlementGateway};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Complete, format-valid recipient details.
pub fn complete_recipient() -> RecipientDetails {
    RecipientDetails {
        full_name: "ООО ТехноСфера".into(),
        bank_name: "Сбербанк".into(),
        account_number: "40817810900000000001".into(),
        inn: "7701000001".into(),
        kpp: "770101001".into(),
        bik: "044525225".into(),
        corr_account: "30101810400000000225".into(),
    }
}

pub enum Script {
    AlwaysOk,
    AlwaysTransient,
    /// Transient failures for the first `n` calls, success afterwards.
    FailFirst(usize),
}

/// Settlement test double that counts invocations and answers from a
/// fixed script.
pub struct RecordingGateway {
    calls: AtomicUsize,
    script: Script,
}

impl RecordingGateway {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettlementGateway for RecordingGateway {
    async fn attempt_settlement(
        &self,
        _record: &PayoutRecord,
    ) -> Result<(), SettlementError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            Script::AlwaysOk => Ok(()),
            Script::AlwaysTransient => Err(SettlementError::Transient("rail down".into())),
            Script::FailFirst(n) if call < n => {
                Err(SettlementError::Transient("rail down".into()))
            }
            Script::FailFirst(_) => Ok(()),
        }
    }
}
