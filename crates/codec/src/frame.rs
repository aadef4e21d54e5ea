//! Record framing: fixed checksummed header plus compressed payload
//!
//! Layout is a fixed-size header followed by the payload bytes the header
//! describes. Headers carry their own CRC and the payload's, so corruption
//! is detected before any payload parsing. Records are self-delimiting,
//! which permits concatenating several into one buffer even though the
//! store writes one record per file.

use crate::errors::{CodecError, Result};
use crc32c::crc32c;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Magic number identifying an analysis record: "BLNS"
const RECORD_MAGIC: u32 = 0x424C_4E53;

/// Current record format version
const FORMAT_VERSION: u16 = 1;

/// Serialized header size in bytes
const HEADER_LEN: usize = 32;

/// Fixed header preceding every record payload
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RecordHeader {
    /// Magic number for validation
    magic: u32,
    /// Record format version
    version: u16,
    /// Flags (bit 0: compressed)
    flags: u16,
    /// CRC32C of the header with this field zeroed
    header_crc: u32,
    /// Length of the payload as stored
    stored_len: u64,
    /// Length of the payload after decompression
    uncompressed_len: u64,
    /// CRC32C of the stored payload bytes
    payload_crc: u32,
}

impl RecordHeader {
    const FLAG_COMPRESSED: u16 = 1 << 0;

    fn new(stored_len: u64, uncompressed_len: u64, payload_crc: u32, compressed: bool) -> Self {
        let mut header = Self {
            magic: RECORD_MAGIC,
            version: FORMAT_VERSION,
            flags: if compressed { Self::FLAG_COMPRESSED } else { 0 },
            header_crc: 0,
            stored_len,
            uncompressed_len,
            payload_crc,
        };
        header.header_crc = header.calculate_crc();
        header
    }

    fn calculate_crc(&self) -> u32 {
        let mut temp = *self;
        temp.header_crc = 0;
        let bytes = match bincode::serialize(&temp) {
            Ok(b) => b,
            Err(_) => return 0,
        };
        crc32c(&bytes)
    }

    fn validate(&self) -> Result<()> {
        if self.magic != RECORD_MAGIC {
            return Err(CodecError::BadMagic {
                expected: RECORD_MAGIC,
                actual: self.magic,
            });
        }
        if self.version > FORMAT_VERSION {
            return Err(CodecError::UnsupportedVersion {
                version: self.version,
                current: FORMAT_VERSION,
            });
        }
        let expected = self.calculate_crc();
        if self.header_crc != expected {
            return Err(CodecError::ChecksumMismatch {
                section: "header",
                expected,
                actual: self.header_crc,
            });
        }
        Ok(())
    }

    fn is_compressed(&self) -> bool {
        self.flags & Self::FLAG_COMPRESSED != 0
    }
}

/// Frame `payload` into one self-describing record
pub(crate) fn write_record(payload: &[u8]) -> Result<Vec<u8>> {
    let compressed = compress(payload)?;
    // Compression only pays when it actually shrinks the payload.
    let (stored, is_compressed) = if compressed.len() < payload.len() {
        (compressed, true)
    } else {
        (payload.to_vec(), false)
    };

    let header = RecordHeader::new(
        stored.len() as u64,
        payload.len() as u64,
        crc32c(&stored),
        is_compressed,
    );
    let mut record = bincode::serialize(&header).map_err(|source| CodecError::Encode { source })?;
    debug_assert_eq!(record.len(), HEADER_LEN);
    record.extend_from_slice(&stored);
    Ok(record)
}

/// Read one record from the front of `bytes`
///
/// Returns the decompressed payload and the total number of bytes the
/// record occupies; trailing bytes are left alone.
pub(crate) fn read_record(bytes: &[u8]) -> Result<(Vec<u8>, usize)> {
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::Truncated {
            needed: HEADER_LEN,
            available: bytes.len(),
        });
    }
    let header: RecordHeader = bincode::deserialize(&bytes[..HEADER_LEN])
        .map_err(|source| CodecError::Decode { source })?;
    header.validate()?;

    let stored_len = header.stored_len as usize;
    let end = HEADER_LEN.saturating_add(stored_len);
    if bytes.len() < end {
        return Err(CodecError::Truncated {
            needed: end,
            available: bytes.len(),
        });
    }

    let stored = &bytes[HEADER_LEN..end];
    let actual_crc = crc32c(stored);
    if actual_crc != header.payload_crc {
        return Err(CodecError::ChecksumMismatch {
            section: "payload",
            expected: header.payload_crc,
            actual: actual_crc,
        });
    }

    let payload = if header.is_compressed() {
        let mut decoder = ZlibDecoder::new(stored);
        let mut decompressed = Vec::with_capacity(header.uncompressed_len as usize);
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|source| CodecError::Compression {
                operation: "decompress",
                source,
            })?;
        decompressed
    } else {
        stored.to_vec()
    };
    if payload.len() as u64 != header.uncompressed_len {
        return Err(CodecError::LengthMismatch {
            expected: header.uncompressed_len,
            actual: payload.len() as u64,
        });
    }
    Ok((payload, end))
}

fn compress(payload: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(payload)
        .map_err(|source| CodecError::Compression {
            operation: "compress",
            source,
        })?;
    encoder.finish().map_err(|source| CodecError::Compression {
        operation: "compress",
        source,
    })
}
