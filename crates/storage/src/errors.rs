//! Error types for the storage layer

use buildlens_codec::CodecError;
use buildlens_core::BuildSessionId;
use std::path::PathBuf;

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Why a storage operation failed
///
/// Failures are local to one record or operation; none of these corrupt or
/// block access to other stored records.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record stored under the given session id
    #[error("no analysis results found for build session {session_id}")]
    NotFound { session_id: BuildSessionId },

    /// Nothing has been recorded in memory yet
    #[error("no analysis results have been recorded yet")]
    NoDataRecorded,

    /// The stored bytes for this session did not decode
    #[error("stored analysis results for build session {session_id} are corrupted")]
    Corruption {
        session_id: BuildSessionId,
        #[source]
        source: CodecError,
    },

    /// The in-memory results for this session did not encode
    #[error("failed to encode analysis results for build session {session_id}")]
    Encode {
        session_id: BuildSessionId,
        #[source]
        source: CodecError,
    },

    /// Directory or file I/O failed
    #[error("failed to {operation} {path}")]
    Io {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The storage configuration is unusable
    #[error("invalid storage configuration: {message}")]
    Configuration { message: String },
}
