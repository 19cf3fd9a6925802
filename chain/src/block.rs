//! Block record (C6): the immutable five-field tuple `(hash, prev_hash,
//! nonce, data, signature)`, with pack/unpack to the wire encoding.

use prost::Message as _;

use crate::crypto::{Hash32, Nonce8, Signature64};
use crate::error::StorageError;
use crate::pb;

/// Maximum length, in bytes, of a block or chain-header seed payload.
pub const MAX_DATA_LENGTH: usize = 8192;

/// A single signed log entry. Block IDs are natural numbers starting at 1;
/// the `Block` value itself does not carry its own index — that lives in
/// the KV store key (`"block_<i>"`) and the chain header's `index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub hash: Hash32,
    pub prev_hash: Hash32,
    pub nonce: Nonce8,
    pub data: Vec<u8>,
    pub signature: Signature64,
}

impl Block {
    /// Packs this block into its length-delimited, tag-prefixed wire
    /// encoding (forward/backward compatible via unknown-field skipping).
    pub fn pack(&self) -> Vec<u8> {
        let wire = pb::Block {
            hash: self.hash.to_vec(),
            prev_hash: self.prev_hash.to_vec(),
            nonce: self.nonce.to_vec(),
            data: self.data.clone(),
            signature: self.signature.to_vec(),
        };
        wire.encode_to_vec()
    }

    /// Unpacks a block, rejecting records where any fixed-width field has
    /// the wrong length.
    pub fn unpack(bytes: &[u8]) -> Result<Self, StorageError> {
        let wire = pb::Block::decode(bytes)
            .map_err(|e| StorageError::BlockDecode { index: 0, reason: e.to_string() })?;

        let hash = Hash32::try_from(wire.hash.as_slice())
            .map_err(|e| StorageError::BlockDecode { index: 0, reason: e.to_string() })?;
        let prev_hash = Hash32::try_from(wire.prev_hash.as_slice())
            .map_err(|e| StorageError::BlockDecode { index: 0, reason: e.to_string() })?;
        let nonce = Nonce8::try_from(wire.nonce.as_slice())
            .map_err(|e| StorageError::BlockDecode { index: 0, reason: e.to_string() })?;
        let signature = Signature64::try_from(wire.signature.as_slice())
            .map_err(|e| StorageError::BlockDecode { index: 0, reason: e.to_string() })?;

        Ok(Self {
            hash,
            prev_hash,
            nonce,
            data: wire.data,
            signature,
        })
    }
}
