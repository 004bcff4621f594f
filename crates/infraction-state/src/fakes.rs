//! In-memory fakes for storage traits (testing and local runs)
//!
//! `MemoryInfractionStore` satisfies the `InfractionStore` contract without
//! any external dependencies. It also lets tests simulate a data-service
//! outage and count how often the workflow reached the store.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::StorageError;
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// MemoryInfractionStore
// ---------------------------------------------------------------------------

/// In-memory infraction store backed by a `Vec<Infraction>` in insertion order.
#[derive(Debug, Default)]
pub struct MemoryInfractionStore {
    records: Mutex<Vec<Infraction>>,
    unavailable: AtomicBool,
    active_lookups: AtomicUsize,
    posts: AtomicUsize,
    deactivations: AtomicUsize,
}

impl MemoryInfractionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with existing records.
    pub fn with_records(records: Vec<Infraction>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Make every subsequent `post` and `deactivate` fail with
    /// `StorageError::Unavailable` (reads keep working).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `active` lookups served.
    pub fn active_lookups(&self) -> usize {
        self.active_lookups.load(Ordering::SeqCst)
    }

    /// Number of `post` calls received, including failed ones.
    pub fn posts(&self) -> usize {
        self.posts.load(Ordering::SeqCst)
    }

    /// Number of `deactivate` calls received, including failed ones.
    pub fn deactivations(&self) -> usize {
        self.deactivations.load(Ordering::SeqCst)
    }

    /// Snapshot of every stored record.
    pub fn records(&self) -> Vec<Infraction> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Infraction>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "simulated outage".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl InfractionStore for MemoryInfractionStore {
    async fn active(
        &self,
        user_id: UserId,
        kind: InfractionKind,
    ) -> StorageResult<Option<Infraction>> {
        self.active_lookups.fetch_add(1, Ordering::SeqCst);
        let records = self.lock();
        Ok(records
            .iter()
            .find(|r| r.active && r.user_id == user_id && r.kind == kind)
            .cloned())
    }

    async fn post(&self, draft: NewInfraction) -> StorageResult<Infraction> {
        self.posts.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        // Check and insert under one lock so concurrent posts cannot both win.
        let mut records = self.lock();
        if draft.active
            && records
                .iter()
                .any(|r| r.active && r.user_id == draft.user_id && r.kind == draft.kind)
        {
            return Err(StorageError::DuplicateActive {
                user_id: draft.user_id.0,
                kind: draft.kind.as_str().to_string(),
            });
        }

        let record = Infraction::from_draft(draft);
        records.push(record.clone());
        Ok(record)
    }

    async fn deactivate(&self, id: &InfractionId) -> StorageResult<Infraction> {
        self.deactivations.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut records = self.lock();
        let record = records
            .iter_mut()
            .find(|r| r.id == *id)
            .ok_or_else(|| StorageError::NotFound {
                id: id.as_str().to_string(),
            })?;
        record.active = false;
        Ok(record.clone())
    }

    async fn get(&self, id: &InfractionId) -> StorageResult<Infraction> {
        let records = self.lock();
        records
            .iter()
            .find(|r| r.id == *id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                id: id.as_str().to_string(),
            })
    }

    async fn history(&self, user_id: UserId) -> StorageResult<Vec<Infraction>> {
        let records = self.lock();
        Ok(records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }
}
