//! Chain library crate.
//!
//! A multi-tenant, append-only, cryptographically-verifiable log server
//! core. Each chain is a linear, hash-chained, secp256k1-signed sequence
//! of blocks persisted to its own embedded key-value store, served over a
//! request/reply wire protocol:
//!
//! - fixed-width byte containers and the hashing/signing primitives
//!   (`crypto`),
//! - the wire-encoded block and chain-header records (`block`, `header`),
//! - a RocksDB-backed key-value store, one directory per chain
//!   (`storage`),
//! - the per-chain append protocol (`chain`) and the cross-chain registry
//!   that mints keypairs and assembles the hash chain (`manager`),
//! - the generated protobuf wire types (`pb`) and the request dispatcher
//!   built on top of them (`dispatcher`),
//! - the ZeroMQ request/reply server and client (`server`, `client`),
//! - Prometheus metrics and the error taxonomy (`metrics`, `error`),
//! - and command-line configuration for the server binary (`config`).

pub mod block;
pub mod chain;
pub mod client;
pub mod config;
pub mod crypto;
pub mod dispatcher;
pub mod error;
pub mod header;
pub mod manager;
pub mod metrics;
pub mod pb;
pub mod server;
pub mod storage;

pub use block::{Block, MAX_DATA_LENGTH};
pub use chain::Chain;
pub use client::Client;
pub use config::ServerConfig;
pub use crypto::{FixedBytes, Hash32, Nonce8, PrivateKey32, PublicKey33, Signature64};
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, StorageError};
pub use header::{ChainHeader, DB_VERSION};
pub use manager::Manager;
pub use metrics::{MetricsRegistry, run_prometheus_http_server};
pub use server::Server;
