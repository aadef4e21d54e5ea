//! Error types for record encoding and decoding

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Why a record could not be encoded or decoded
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("record is truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("invalid record magic: expected {expected:08x}, got {actual:08x}")]
    BadMagic { expected: u32, actual: u32 },

    #[error("unsupported record format version {version}, current version is {current}")]
    UnsupportedVersion { version: u16, current: u16 },

    #[error("{section} checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        section: &'static str,
        expected: u32,
        actual: u32,
    },

    #[error("payload length mismatch: header says {expected} bytes, got {actual}")]
    LengthMismatch { expected: u64, actual: u64 },

    #[error("failed to {operation} record payload")]
    Compression {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize record payload")]
    Encode {
        #[source]
        source: bincode::Error,
    },

    #[error("failed to deserialize record payload")]
    Decode {
        #[source]
        source: bincode::Error,
    },

    /// A wire tag outside the known space: the record was written by a
    /// newer, forward-incompatible writer and must not decode silently.
    #[error("unrecognized {field} tag {tag}")]
    UnrecognizedTag { field: &'static str, tag: u32 },

    /// The explicit "unspecified" sentinel on a field that requires a value
    #[error("missing required value for {field}")]
    MissingValue { field: &'static str },

    /// A descriptor reference with no entry in the record's tables
    #[error("record references unknown {kind} {key:?}")]
    MissingPoolEntry { kind: &'static str, key: String },
}
