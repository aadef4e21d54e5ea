//! The storage manager: latest result, historic cache, persistence

use crate::config::StorageConfig;
use crate::errors::{Result, StoreError};
use crate::file_store::FileStore;
use buildlens_core::{BuildSessionId, DataChangeNotifier, NewDataSubscriber};
use buildlens_model::{AnalysisOutcome, BuildAnalysisResults, FailureKind, FailureResult};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Summary of one stored build, cheap enough to list in bulk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDescriptor {
    pub session_id: BuildSessionId,
    pub build_finished_timestamp_ms: i64,
    pub total_build_time_ms: i64,
}

/// Orchestrates the in-memory "latest" result, the optional historic cache
/// and explicit persistence through the file store
///
/// An owned component: construct one per embedding application and pass it
/// around. Recording happens on whatever thread completes a build and is
/// assumed externally serialized; the locks here only make the individual
/// replace-on-write steps atomic. File-store traffic blocks and belongs on
/// a background worker, which is the caller's concern.
pub struct StorageManager {
    latest: RwLock<Option<AnalysisOutcome>>,
    history: RwLock<IndexMap<BuildSessionId, Arc<BuildAnalysisResults>>>,
    notifier: DataChangeNotifier,
    store: FileStore,
    config: StorageConfig,
}

impl StorageManager {
    pub fn new(config: StorageConfig) -> Result<Self> {
        config.validate()?;
        let store = FileStore::new(&config.data_dir);
        Ok(Self {
            latest: RwLock::new(None),
            history: RwLock::new(IndexMap::new()),
            notifier: DataChangeNotifier::new(),
            store,
            config,
        })
    }

    /// Register for the payload-free "new data available" signal
    pub fn subscribe(&self, subscriber: Arc<dyn NewDataSubscriber>) {
        self.notifier.subscribe(subscriber);
    }

    /// Record the results of a just-finished build
    ///
    /// Unconditionally replaces "latest"; additionally caches the result in
    /// the in-memory historic map when that switch is on. Does not touch
    /// the file store: persistence is a separate, explicit call.
    pub fn record_new_result(&self, results: BuildAnalysisResults) -> Arc<BuildAnalysisResults> {
        let results = Arc::new(results);
        *self.latest.write() = Some(AnalysisOutcome::Results(Arc::clone(&results)));
        if self.config.keep_history_in_memory {
            self.history
                .write()
                .insert(results.session_id().clone(), Arc::clone(&results));
        }
        debug!(session_id = %results.session_id(), "recorded new analysis results");
        self.notifier.publish();
        results
    }

    /// Record that a build attempt produced no usable results
    pub fn record_new_failure(&self, session_id: BuildSessionId, kind: FailureKind) {
        warn!(session_id = %session_id, ?kind, "recorded analysis failure");
        *self.latest.write() = Some(AnalysisOutcome::Failure(FailureResult {
            session_id,
            kind,
        }));
        self.notifier.publish();
    }

    /// The latest successful results
    pub fn latest(&self) -> Result<Arc<BuildAnalysisResults>> {
        match &*self.latest.read() {
            Some(AnalysisOutcome::Results(results)) => Ok(Arc::clone(results)),
            _ => Err(StoreError::NoDataRecorded),
        }
    }

    /// The latest outcome, failure markers included
    pub fn latest_outcome(&self) -> Option<AnalysisOutcome> {
        self.latest.read().clone()
    }

    /// Whether a successful result is currently available
    pub fn has_data(&self) -> bool {
        matches!(
            &*self.latest.read(),
            Some(AnalysisOutcome::Results(_))
        )
    }

    /// Results for a specific session, from memory if cached, otherwise
    /// loaded and decoded from the file store
    pub fn historic(&self, session_id: &BuildSessionId) -> Result<Arc<BuildAnalysisResults>> {
        if let Some(results) = self.in_memory(session_id) {
            return Ok(results);
        }
        let bytes = self.store.load(session_id)?;
        let results =
            buildlens_codec::decode(&bytes).map_err(|source| StoreError::Corruption {
                session_id: session_id.clone(),
                source,
            })?;
        Ok(Arc::new(results))
    }

    /// Every known session id, in memory or on disk
    pub fn list_historic_ids(&self) -> Result<BTreeSet<BuildSessionId>> {
        let mut ids: BTreeSet<_> = self.history.read().keys().cloned().collect();
        for record in self.store.list()? {
            ids.insert(record.session_id);
        }
        Ok(ids)
    }

    /// Summaries for every known session, most recent build first
    ///
    /// A record that no longer decodes is skipped with a warning; one bad
    /// file must not hide the others.
    pub fn list_historic_descriptors(&self) -> Result<Vec<BuildDescriptor>> {
        let mut descriptors = Vec::new();
        for session_id in self.list_historic_ids()? {
            match self.historic(&session_id) {
                Ok(results) => descriptors.push(BuildDescriptor {
                    session_id,
                    build_finished_timestamp_ms: results
                        .critical_path()
                        .build_finished_timestamp_ms,
                    total_build_time_ms: results.total_build_time_ms(),
                }),
                Err(error) => {
                    warn!(session_id = %session_id, %error, "skipping unreadable record");
                }
            }
        }
        descriptors.sort_by_key(|d| std::cmp::Reverse(d.build_finished_timestamp_ms));
        Ok(descriptors)
    }

    /// Persist the in-memory results for `session_id` to the file store
    ///
    /// Encoding or I/O failures are returned to the caller and logged; the
    /// in-memory state is left untouched either way. On success the
    /// retention policy sweeps the store.
    pub fn persist(&self, session_id: &BuildSessionId) -> Result<()> {
        let results = self
            .in_memory(session_id)
            .ok_or_else(|| StoreError::NotFound {
                session_id: session_id.clone(),
            })?;
        let bytes = buildlens_codec::encode(&results).map_err(|source| StoreError::Encode {
            session_id: session_id.clone(),
            source,
        })?;
        if let Err(store_error) = self.store.save(session_id, &bytes) {
            error!(session_id = %session_id, error = %store_error, "failed to persist analysis results");
            return Err(store_error);
        }
        let evicted = self.config.retention.enforce(&self.store)?;
        if !evicted.is_empty() {
            debug!(count = evicted.len(), "retention evicted old records");
        }
        Ok(())
    }

    /// Drop a session from the historic cache and the file store
    pub fn delete_historic(&self, session_id: &BuildSessionId) -> Result<bool> {
        let cached = self.history.write().shift_remove(session_id).is_some();
        let stored = self.store.delete(session_id)?;
        Ok(cached || stored)
    }

    /// Total size of the stored records in bytes (O(n) scan)
    pub fn size_on_disk(&self) -> Result<u64> {
        self.store.size_on_disk()
    }

    pub fn stored_record_count(&self) -> Result<usize> {
        Ok(self.store.list()?.len())
    }

    pub fn file_store(&self) -> &FileStore {
        &self.store
    }

    fn in_memory(&self, session_id: &BuildSessionId) -> Option<Arc<BuildAnalysisResults>> {
        if let Some(AnalysisOutcome::Results(results)) = &*self.latest.read() {
            if results.session_id() == session_id {
                return Some(Arc::clone(results));
            }
        }
        self.history.read().get(session_id).cloned()
    }
}
