//! Bounds for the on-disk record inventory

use crate::errors::Result;
use crate::file_store::FileStore;
use buildlens_core::BuildSessionId;
use tracing::{debug, warn};

/// How many saved records to keep around
///
/// There is no age-based expiry: records only leave the store through
/// explicit deletion or through this policy evicting the oldest ones once a
/// limit is exceeded.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    /// Maximum number of stored records
    pub max_records: Option<usize>,
    /// Maximum total size of stored records in bytes
    pub max_bytes: Option<u64>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_records: Some(30),
            max_bytes: None,
        }
    }
}

impl RetentionPolicy {
    /// Keep everything forever
    pub fn unbounded() -> Self {
        Self {
            max_records: None,
            max_bytes: None,
        }
    }

    fn exceeded(&self, records: usize, bytes: u64) -> bool {
        self.max_records.is_some_and(|limit| records > limit)
            || self.max_bytes.is_some_and(|limit| bytes > limit)
    }

    /// Delete oldest-first until the store is within both limits
    ///
    /// A record that fails to delete is skipped, not retried; the sweep
    /// carries on with the next one. Returns the ids actually evicted.
    pub fn enforce(&self, store: &FileStore) -> Result<Vec<BuildSessionId>> {
        if self.max_records.is_none() && self.max_bytes.is_none() {
            return Ok(vec![]);
        }

        let mut records = store.list()?;
        records.sort_by_key(|record| record.modified);

        let mut remaining = records.len();
        let mut total_bytes: u64 = records.iter().map(|record| record.len).sum();
        let mut evicted = Vec::new();

        for record in &records {
            if !self.exceeded(remaining, total_bytes) {
                break;
            }
            match store.delete(&record.session_id) {
                Ok(_) => {
                    debug!(session_id = %record.session_id, "evicted analysis record");
                    remaining -= 1;
                    total_bytes -= record.len;
                    evicted.push(record.session_id.clone());
                }
                Err(error) => {
                    warn!(session_id = %record.session_id, %error, "failed to evict record, skipping");
                    remaining -= 1;
                    total_bytes -= record.len;
                }
            }
        }
        Ok(evicted)
    }
}
