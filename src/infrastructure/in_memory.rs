use crate::domain::payout::{PayoutId, PayoutRecord};
use crate::domain::ports::{PayoutStore, RowLock};
use crate::error::{PayoutError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// In-memory payout store with per-record row locks.
///
/// Records live behind an `Arc<RwLock<HashMap>>` as shared committed
/// state; a separate lock table holds one `Arc<Mutex<()>>` per id, and
/// `acquire_exclusive` hands out the owned guard as the [`RowLock`]
/// token. This is the explicit stand-in for a relational store's
/// `SELECT ... FOR UPDATE`: two acquirers of the same id serialize,
/// distinct ids never contend.
#[derive(Default, Clone)]
pub struct InMemoryPayoutStore {
    records: Arc<RwLock<HashMap<PayoutId, PayoutRecord>>>,
    row_locks: Arc<Mutex<HashMap<PayoutId, Arc<Mutex<()>>>>>,
}

impl InMemoryPayoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn row_lock(&self, id: PayoutId) -> Arc<Mutex<()>> {
        let mut table = self.row_locks.lock().await;
        table.entry(id).or_default().clone()
    }
}

#[async_trait]
impl PayoutStore for InMemoryPayoutStore {
    async fn create(&self, record: PayoutRecord) -> Result<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(PayoutError::DuplicateId(record.id));
        }
        records.insert(record.id, record);
        Ok(())
    }

    async fn get(&self, id: PayoutId) -> Result<Option<PayoutRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&id).cloned())
    }

    async fn acquire_exclusive(&self, id: PayoutId) -> Result<Option<(PayoutRecord, RowLock)>> {
        let lock = self.row_lock(id).await;
        let guard = lock.lock_owned().await;
        // Read the committed state only after the lock is held, so a
        // blocked acquirer observes the previous holder's writes.
        let records = self.records.read().await;
        match records.get(&id) {
            Some(record) => Ok(Some((record.clone(), Box::new(guard)))),
            None => Ok(None),
        }
    }

    async fn save(&self, record: &PayoutRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn all(&self) -> Result<Vec<PayoutRecord>> {
        let records = self.records.read().await;
        Ok(records.values().cloned().collect())
    }
}
