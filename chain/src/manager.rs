//! Chain manager (C9): filesystem layout across chain IDs, keypair
//! minting, nonce generation, hash-chain assembly, and end-to-end
//! verification. This is the cryptographic core of the append protocol.

use std::path::{Path, PathBuf};

use crate::block::Block;
use crate::chain::Chain;
use crate::crypto::{ecdsa, hash, random, Nonce8};
use crate::error::StorageError;
use crate::header::ChainHeader;

/// Owns the storage root directory and assigns exactly one sub-path per
/// chain ID: `<root>/<chain_id>.blockchain/`.
pub struct Manager {
    storage_dir: PathBuf,
}

impl Manager {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
        }
    }

    fn chain_path(&self, chain_id: u64) -> PathBuf {
        self.storage_dir.join(format!("{chain_id}.blockchain"))
    }

    fn chain(&self, chain_id: u64) -> Chain {
        Chain::new(self.chain_path(chain_id))
    }

    /// Generates a fresh keypair and creates the chain's store seeded with
    /// `data`. Failure at any step leaves no partial directory, because
    /// the KV store's own `create` is atomic.
    pub fn create_chain(&self, chain_id: u64, data: Vec<u8>) -> Result<(), StorageError> {
        let private_key = ecdsa::generate_private_key();
        let public_key = ecdsa::derive_public_key(&private_key)?;

        self.chain(chain_id).create(data, private_key, public_key)
    }

    /// The genesis seed (I3): `SHA256(SHA256(header.data ∥ header.sk ∥
    /// header.pk))`, the virtual `prev_hash` of block 1.
    fn genesis_seed(header: &ChainHeader) -> crate::crypto::Hash32 {
        hash::hash_n(
            [
                header.data.as_slice(),
                header.private_key.as_slice(),
                header.public_key.as_slice(),
            ],
            2,
        )
    }

    /// Appends a new block to `chain_id` carrying `data`. This is the
    /// cryptographic core described in §4.C9: computes `prev_hash`,
    /// generates a fresh nonce, signs the body hash, computes the block
    /// hash, and writes the block atomically with the advanced header.
    pub fn add_block(&self, chain_id: u64, data: Vec<u8>) -> Result<Block, StorageError> {
        let chain = self.chain(chain_id);
        let header = chain.get_header()?;

        let prev_hash = if header.index == 0 {
            Self::genesis_seed(&header)
        } else {
            chain.get_block(header.index)?.hash
        };

        let mut nonce_bytes = [0u8; 8];
        random::fill(&mut nonce_bytes, false);
        let nonce = Nonce8::from(nonce_bytes);

        let body_hash = hash::hash([prev_hash.as_slice(), nonce.as_slice(), data.as_slice()]);
        let signature = ecdsa::sign(&body_hash, &header.private_key)?;
        let block_hash = hash::hash([
            prev_hash.as_slice(),
            nonce.as_slice(),
            data.as_slice(),
            signature.as_slice(),
        ]);

        let block = Block {
            hash: block_hash,
            prev_hash,
            nonce,
            data,
            signature,
        };

        chain.add_block(block.clone())?;
        Ok(block)
    }

    pub fn get_block(&self, chain_id: u64, index: u64) -> Result<Block, StorageError> {
        self.chain(chain_id).get_block(index)
    }

    pub fn get_blocks(&self, chain_id: u64) -> Result<Vec<Block>, StorageError> {
        self.chain(chain_id).get_blocks()
    }

    /// Idempotent: removing an absent chain is still a success (§9a).
    pub fn remove_chain(&self, chain_id: u64) -> Result<(), StorageError> {
        self.chain(chain_id).remove()
    }

    pub fn get_chain_header(&self, chain_id: u64) -> Result<ChainHeader, StorageError> {
        self.chain(chain_id).get_header()
    }

    pub fn get_chain_info(&self, chain_id: u64) -> Result<(u32, u64), StorageError> {
        let header = self.chain(chain_id).get_header()?;
        Ok((header.version, header.index))
    }

    /// Recomputes I3–I5 for every stored block and succeeds iff all
    /// equalities hold and every signature verifies under `header.pk`.
    /// An empty chain (index 0) verifies trivially. A chain that doesn't
    /// exist is a verification failure, surfaced as the same
    /// [`StorageError`] that opening it would produce.
    pub fn verify_chain(&self, chain_id: u64) -> Result<bool, StorageError> {
        let chain = self.chain(chain_id);
        let header = chain.get_header()?;
        let blocks = chain.get_blocks()?;

        let mut prev_hash = Self::genesis_seed(&header);

        for block in &blocks {
            if block.prev_hash != prev_hash {
                return Ok(false);
            }

            let body_hash = hash::hash([
                prev_hash.as_slice(),
                block.nonce.as_slice(),
                block.data.as_slice(),
            ]);

            if !ecdsa::verify(&body_hash, &header.public_key, &block.signature) {
                return Ok(false);
            }

            let expected_hash = hash::hash([
                prev_hash.as_slice(),
                block.nonce.as_slice(),
                block.data.as_slice(),
                block.signature.as_slice(),
            ]);

            if expected_hash != block.hash {
                return Ok(false);
            }

            prev_hash = block.hash;
        }

        Ok(true)
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }
}
