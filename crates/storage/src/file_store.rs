//! Flat-directory store of encoded analysis records

use crate::atomic::write_atomic;
use crate::errors::{Result, StoreError};
use buildlens_core::BuildSessionId;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// File extension for stored records
const RECORD_EXT: &str = "bin";

/// One stored record as seen on disk
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub session_id: BuildSessionId,
    pub len: u64,
    pub modified: SystemTime,
}

/// Durable bytes on disk, one file per build session id
///
/// All operations block on file I/O; callers on latency-sensitive threads
/// are expected to schedule them onto a background worker.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn record_path(&self, id: &BuildSessionId) -> PathBuf {
        self.data_dir.join(format!("{id}.{RECORD_EXT}"))
    }

    /// Write `bytes` as the record for `id`, creating the data directory on
    /// first use and overwriting any previous record under the same id
    pub fn save(&self, id: &BuildSessionId, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|source| StoreError::Io {
            path: self.data_dir.clone(),
            operation: "create data directory",
            source,
        })?;
        write_atomic(&self.record_path(id), bytes)?;
        debug!(session_id = %id, bytes = bytes.len(), "saved analysis record");
        Ok(())
    }

    /// Read back the record for `id`
    pub fn load(&self, id: &BuildSessionId) -> Result<Vec<u8>> {
        let path = self.record_path(id);
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(source) if source.kind() == ErrorKind::NotFound => Err(StoreError::NotFound {
                session_id: id.clone(),
            }),
            Err(source) => Err(StoreError::Io {
                path,
                operation: "read record",
                source,
            }),
        }
    }

    /// Delete the record for `id`; `Ok(false)` when none was stored
    pub fn delete(&self, id: &BuildSessionId) -> Result<bool> {
        let path = self.record_path(id);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(session_id = %id, "deleted analysis record");
                Ok(true)
            }
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io {
                path,
                operation: "delete record",
                source,
            }),
        }
    }

    pub fn contains(&self, id: &BuildSessionId) -> bool {
        self.record_path(id).is_file()
    }

    /// Total size of all stored records in bytes
    ///
    /// An O(n) directory scan on every call; nothing is cached.
    pub fn size_on_disk(&self) -> Result<u64> {
        Ok(self.list()?.iter().map(|record| record.len).sum())
    }

    /// Every stored record with its length and modification time
    pub fn list(&self) -> Result<Vec<StoredRecord>> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            // A store that was never written to is simply empty.
            Err(source) if source.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.data_dir.clone(),
                    operation: "list data directory",
                    source,
                })
            }
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: self.data_dir.clone(),
                operation: "list data directory",
                source,
            })?;
            let path = entry.path();
            let session_id = match record_id_of(&path) {
                Some(id) => id,
                None => continue,
            };
            let metadata = entry.metadata().map_err(|source| StoreError::Io {
                path: path.clone(),
                operation: "stat record",
                source,
            })?;
            if !metadata.is_file() {
                continue;
            }
            records.push(StoredRecord {
                session_id,
                len: metadata.len(),
                modified: metadata.modified().map_err(|source| StoreError::Io {
                    path,
                    operation: "stat record",
                    source,
                })?,
            });
        }
        Ok(records)
    }
}

/// The session id a store file belongs to, `None` for anything else in the
/// directory (temp files included)
fn record_id_of(path: &Path) -> Option<BuildSessionId> {
    if path.extension()? != RECORD_EXT {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() || stem.starts_with('.') {
        return None;
    }
    Some(BuildSessionId::new(stem))
}
