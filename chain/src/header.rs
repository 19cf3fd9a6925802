//! Chain header (C7): version, next-index counter, seed payload, and the
//! chain's signing keypair.

use prost::Message as _;

use crate::crypto::{PrivateKey32, PublicKey33};
use crate::error::StorageError;
use crate::pb;

/// Current on-disk schema version. Opening a header with a different
/// version is a hard failure (I refuse to guess at forward migration).
pub const DB_VERSION: u32 = 0;

/// Metadata record stored once per chain under key `"header"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainHeader {
    pub version: u32,
    pub index: u64,
    pub data: Vec<u8>,
    pub private_key: PrivateKey32,
    pub public_key: PublicKey33,
}

impl ChainHeader {
    /// Constructs the header for a brand-new chain: `version = DB_VERSION`,
    /// `index = 0`.
    pub fn new(data: Vec<u8>, private_key: PrivateKey32, public_key: PublicKey33) -> Self {
        Self {
            version: DB_VERSION,
            index: 0,
            data,
            private_key,
            public_key,
        }
    }

    /// Returns a copy of this header with `index` advanced by one, for the
    /// append path.
    pub fn with_index(&self, index: u64) -> Self {
        Self {
            index,
            ..self.clone()
        }
    }

    pub fn pack(&self) -> Vec<u8> {
        let wire = pb::Header {
            version: self.version,
            index: self.index,
            data: self.data.clone(),
            private_key: self.private_key.to_vec(),
            public_key: self.public_key.to_vec(),
        };
        wire.encode_to_vec()
    }

    pub fn unpack(bytes: &[u8]) -> Result<Self, StorageError> {
        let wire = pb::Header::decode(bytes).map_err(|e| StorageError::HeaderDecode(e.to_string()))?;

        let private_key = PrivateKey32::try_from(wire.private_key.as_slice())
            .map_err(|e| StorageError::HeaderDecode(e.to_string()))?;
        let public_key = PublicKey33::try_from(wire.public_key.as_slice())
            .map_err(|e| StorageError::HeaderDecode(e.to_string()))?;

        Ok(Self {
            version: wire.version,
            index: wire.index,
            data: wire.data,
            private_key,
            public_key,
        })
    }

    /// Fails unless `version` matches the code's current `DB_VERSION`.
    pub fn check_version(&self) -> Result<(), StorageError> {
        if self.version != DB_VERSION {
            return Err(StorageError::VersionMismatch {
                found: self.version,
                expected: DB_VERSION,
            });
        }
        Ok(())
    }
}
