//! Lossless binary codec for persisted build analysis results
//!
//! A [`buildlens_model::BuildAnalysisResults`] graph is flattened into one
//! self-describing byte record: a fixed checksummed header followed by a
//! bincode payload in which every task and plugin descriptor lives exactly
//! once in an ordered table and analyzer payloads reference descriptors by
//! identity key. Decoding rebuilds the tables first and then reconstructs
//! each analyzer result by key lookup, tolerating records written by older
//! writers (missing analyzer sections decode to that analyzer's empty
//! result) while rejecting records from newer, incompatible ones.

mod decode;
mod encode;
mod errors;
mod frame;
mod wire;

pub use decode::{decode, decode_prefix};
pub use encode::encode;
pub use errors::{CodecError, Result};
