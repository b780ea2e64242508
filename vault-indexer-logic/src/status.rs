use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

const NEVER_SYNCED: i64 = i64::MIN;

/// Time of the last poll cycle that completed without error.
#[derive(Debug)]
pub struct SyncStatus {
    last_sync_millis: AtomicI64,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            last_sync_millis: AtomicI64::new(NEVER_SYNCED),
        }
    }
}

impl SyncStatus {
    pub fn mark_synced(&self, at: DateTime<Utc>) {
        self.last_sync_millis
            .store(at.timestamp_millis(), Ordering::Release);
    }

    pub fn last_sync_timestamp(&self) -> Option<DateTime<Utc>> {
        match self.last_sync_millis.load(Ordering::Acquire) {
            NEVER_SYNCED => None,
            millis => DateTime::from_timestamp_millis(millis),
        }
    }
}
