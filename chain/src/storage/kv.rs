//! Ordered KV store adapter (C5): a thin façade over RocksDB providing
//! create-exclusive, open, get-one, atomic durable write-batch, and
//! destroy. One directory per chain, not a single shared database with
//! column families — each [`KvStore`] owns exactly one chain's directory.

use std::path::{Path, PathBuf};

use rocksdb::{DBCompressionType, Options, WriteBatch, WriteOptions, DB};

use crate::error::StorageError;

/// An open handle to a single chain's on-disk key-value store.
pub struct KvStore {
    db: Option<DB>,
    path: PathBuf,
}

impl KvStore {
    fn base_options(paranoid_checks: bool) -> Options {
        let mut opts = Options::default();
        opts.set_paranoid_checks(paranoid_checks);
        opts.set_compression_type(DBCompressionType::None);
        opts
    }

    /// Creates a new store at `path`. Fails if `path` already exists.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();

        if path.exists() {
            return Err(StorageError::AlreadyExists(path.display().to_string()));
        }

        let mut opts = Self::base_options(true);
        opts.create_if_missing(true);
        opts.set_error_if_exists(true);

        let db = DB::open(&opts, path)?;

        Ok(Self {
            db: Some(db),
            path: path.to_path_buf(),
        })
    }

    /// Opens an existing store at `path`. Fails if it is not present.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(StorageError::NotFound(path.display().to_string()));
        }

        let mut opts = Self::base_options(true);
        opts.create_if_missing(false);

        let db = DB::open(&opts, path)?;

        Ok(Self {
            db: Some(db),
            path: path.to_path_buf(),
        })
    }

    /// Releases the underlying handle. Subsequent operations fail until
    /// the store is re-opened.
    pub fn close(&mut self) {
        self.db = None;
    }

    fn handle(&self) -> Result<&DB, StorageError> {
        self.db
            .as_ref()
            .ok_or_else(|| StorageError::NotFound(self.path.display().to_string()))
    }

    /// Reads a single value. A missing key is a failure, not an empty
    /// value — `get("header")` on a store that was never created is a
    /// hard error, not `None`.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<Vec<u8>, StorageError> {
        let db = self.handle()?;
        db.get(key.as_ref())?
            .ok_or_else(|| StorageError::MissingKey(String::from_utf8_lossy(key.as_ref()).into_owned()))
    }

    /// Atomically writes every `(key, value)` pair with a durability fence
    /// on commit (`sync = true`). All-or-nothing: this is the atomicity
    /// point of the append protocol (§4.C8).
    pub fn write_batch<K, V>(&self, pairs: impl IntoIterator<Item = (K, V)>) -> Result<(), StorageError>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let db = self.handle()?;

        let mut batch = WriteBatch::default();
        for (key, value) in pairs {
            batch.put(key.as_ref(), value.as_ref());
        }

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(true);

        db.write_opt(batch, &write_opts)?;
        Ok(())
    }

    /// Removes the entire store directory recursively. Idempotent:
    /// removing an already-absent store is still a success.
    pub fn destroy(path: impl AsRef<Path>) -> Result<(), StorageError> {
        let path = path.as_ref();
        match std::fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
