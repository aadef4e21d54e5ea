//! Storage configuration

use crate::errors::{Result, StoreError};
use crate::retention::RetentionPolicy;
use std::path::PathBuf;

/// Configuration for the analysis storage subsystem
///
/// Owned by whoever constructs the [`crate::StorageManager`]; there is no
/// ambient or global configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding one encoded record per build session
    pub data_dir: PathBuf,
    /// Also keep every recorded result in memory, keyed by session id
    ///
    /// Independent of file persistence, which is always explicit.
    pub keep_history_in_memory: bool,
    /// Bounds for the on-disk inventory, applied after each persist
    pub retention: RetentionPolicy,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            keep_history_in_memory: false,
            retention: RetentionPolicy::default(),
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(StoreError::Configuration {
                message: "data directory must not be empty".to_string(),
            });
        }
        if let Some(0) = self.retention.max_records {
            return Err(StoreError::Configuration {
                message: "retention must allow at least one record".to_string(),
            });
        }
        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("buildlens")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        StorageConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_data_dir_is_rejected() {
        let config = StorageConfig {
            data_dir: PathBuf::new(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(StoreError::Configuration { .. })
        ));
    }

    #[test]
    fn zero_record_retention_is_rejected() {
        let config = StorageConfig {
            retention: RetentionPolicy {
                max_records: Some(0),
                max_bytes: None,
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(StoreError::Configuration { .. })
        ));
    }
}
