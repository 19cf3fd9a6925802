//! Chain (C8): binds a per-chain KV store to the append protocol. Every
//! operation opens the store, acts, and closes it — no state is cached
//! across calls.

use std::path::{Path, PathBuf};

use crate::block::Block;
use crate::crypto::{PrivateKey32, PublicKey33};
use crate::error::StorageError;
use crate::header::ChainHeader;
use crate::storage::KvStore;

const HEADER_KEY: &str = "header";

fn block_key(index: u64) -> String {
    format!("block_{index}")
}

/// A handle bound to one chain's storage path. Carries no open file
/// descriptors between calls.
pub struct Chain {
    path: PathBuf,
}

impl Chain {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `store.create(path)`; writes the initial header in one batch.
    /// Fails if the store already exists.
    pub fn create(
        &self,
        data: Vec<u8>,
        private_key: PrivateKey32,
        public_key: PublicKey33,
    ) -> Result<(), StorageError> {
        let header = ChainHeader::new(data, private_key, public_key);
        let store = KvStore::create(&self.path)?;
        store.write_batch([(HEADER_KEY, header.pack())])?;
        Ok(())
    }

    /// Opens the store, reads and unpacks `"header"`, checks its schema
    /// version.
    pub fn get_header(&self) -> Result<ChainHeader, StorageError> {
        let store = KvStore::open(&self.path)?;
        self.read_header(&store)
    }

    fn read_header(&self, store: &KvStore) -> Result<ChainHeader, StorageError> {
        let bytes = store.get(HEADER_KEY)?;
        let header = ChainHeader::unpack(&bytes)?;
        header.check_version()?;
        Ok(header)
    }

    /// Advances the header's index by one and writes the new block record
    /// in the same atomic batch: after a crash the index and the block
    /// appear together, or neither does.
    pub fn add_block(&self, block: Block) -> Result<(), StorageError> {
        let store = KvStore::open(&self.path)?;
        let header = self.read_header(&store)?;
        let next_header = header.with_index(header.index + 1);

        store.write_batch([
            (HEADER_KEY.to_string(), next_header.pack()),
            (block_key(next_header.index), block.pack()),
        ])?;

        Ok(())
    }

    /// Reads the block at `index`. Rejects `index == 0` or `index >
    /// header.index`.
    pub fn get_block(&self, index: u64) -> Result<Block, StorageError> {
        let store = KvStore::open(&self.path)?;
        let header = self.read_header(&store)?;

        if index == 0 || index > header.index {
            return Err(StorageError::InvalidIndex(index));
        }

        let bytes = store.get(block_key(index))?;
        Block::unpack(&bytes).map_err(|e| match e {
            StorageError::BlockDecode { reason, .. } => StorageError::BlockDecode { index, reason },
            other => other,
        })
    }

    /// Reads every block in ascending index order. Any missing or
    /// undecodable entry is a hard failure (it would violate I1).
    pub fn get_blocks(&self) -> Result<Vec<Block>, StorageError> {
        let store = KvStore::open(&self.path)?;
        let header = self.read_header(&store)?;

        let mut blocks = Vec::with_capacity(header.index as usize);
        for index in 1..=header.index {
            let bytes = store.get(block_key(index))?;
            let block = Block::unpack(&bytes).map_err(|e| match e {
                StorageError::BlockDecode { reason, .. } => {
                    StorageError::BlockDecode { index, reason }
                }
                other => other,
            })?;
            blocks.push(block);
        }

        Ok(blocks)
    }

    /// Removes the entire store directory. Idempotent.
    pub fn remove(&self) -> Result<(), StorageError> {
        KvStore::destroy(&self.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
