//! Error taxonomy (§7) realized as concrete `thiserror` types.
//!
//! Lower layers (storage, chain, manager) return [`StorageError`] or
//! [`CryptoError`](crate::crypto::CryptoError). The dispatcher is the one
//! place that lowers any of these into a wire status code plus a
//! human-readable message; nothing is retried or silently patched.

use thiserror::Error;

use crate::crypto::CryptoError;

/// Failures from the per-chain KV store and the chain/manager layers built
/// on top of it.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("store already exists at {0}")]
    AlreadyExists(String),

    #[error("store not found at {0}")]
    NotFound(String),

    #[error("rocksdb error: {0}")]
    Rocksdb(#[from] rocksdb::Error),

    #[error("missing key {0:?}")]
    MissingKey(String),

    #[error("header decode failed: {0}")]
    HeaderDecode(String),

    #[error("block decode failed (index {index}): {reason}")]
    BlockDecode { index: u64, reason: String },

    #[error("unsupported schema version {found} (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("invalid block index {0}")]
    InvalidIndex(u64),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by the request dispatcher (§4.C10) before a status code
/// is chosen. This is the taxonomy of §7, given concrete Rust shape.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("can't parse data")]
    Decode,

    #[error("data field size is too large")]
    DataTooLarge,

    #[error("no authorization data")]
    AuthMissing,

    #[error("invalid password")]
    AuthMismatch,

    #[error("method isn't supported")]
    UnknownRequest,

    #[error("chain is not valid")]
    Corruption,

    #[error(transparent)]
    Storage(#[from] StorageError),
}
