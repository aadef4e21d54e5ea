//! Atomic file operations to prevent corrupted record files

use crate::errors::{Result, StoreError};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

/// Write data to a file atomically by writing to a temporary file and renaming
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| StoreError::Configuration {
        message: format!("record path {} has no parent directory", path.display()),
    })?;

    // Temporary file in the same directory so the rename stays atomic.
    let temp_name = format!(".{}.tmp", Uuid::new_v4());
    let temp_path = parent.join(&temp_name);

    let result = (|| -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|source| StoreError::Io {
                path: temp_path.clone(),
                operation: "create temporary file",
                source,
            })?;

        file.write_all(content).map_err(|source| StoreError::Io {
            path: temp_path.clone(),
            operation: "write temporary file",
            source,
        })?;

        file.sync_all().map_err(|source| StoreError::Io {
            path: temp_path.clone(),
            operation: "sync temporary file",
            source,
        })?;

        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
        return result;
    }

    fs::rename(&temp_path, path).map_err(|source| {
        let _ = fs::remove_file(&temp_path);
        StoreError::Io {
            path: path.to_path_buf(),
            operation: "rename temporary file into place",
            source,
        }
    })?;

    Ok(())
}
