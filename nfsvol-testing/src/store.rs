// SPDX-License-Identifier: GPL-3.0-only

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use nfsvol_contracts::{StateStore, VolumeError};
use nfsvol_types::VolumeRecord;

/// State store that keeps the last snapshot in memory
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    records: Mutex<Vec<VolumeRecord>>,
    persists: AtomicUsize,
    fail_persist: AtomicBool,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with records, as if written by an earlier run
    pub fn with_records(records: Vec<VolumeRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn fail_persists(&self, fail: bool) {
        self.fail_persist.store(fail, Ordering::SeqCst);
    }

    pub fn persist_count(&self) -> usize {
        self.persists.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Vec<VolumeRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl StateStore for MemoryStateStore {
    fn persist(&self, records: &[VolumeRecord]) -> Result<(), VolumeError> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(VolumeError::io("state store is read-only"));
        }
        self.persists.fetch_add(1, Ordering::SeqCst);
        // Mirror the serialized form: counts never reach the store.
        let mut stored = records.to_vec();
        for record in &mut stored {
            record.ref_count = 0;
        }
        *self.records.lock().unwrap_or_else(|e| e.into_inner()) = stored;
        Ok(())
    }

    fn load(&self) -> Result<Vec<VolumeRecord>, VolumeError> {
        Ok(self.snapshot())
    }
}
