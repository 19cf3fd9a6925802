//! Server configuration (§12, ambient): command-line flags for the
//! `chain-server` binary, parsed with `clap`'s derive API.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

fn default_metrics_addr() -> SocketAddr {
    "127.0.0.1:9898"
        .parse()
        .expect("hard-coded metrics listen address should parse")
}

/// Flags accepted by `chain-server`, matching §6's server flag set.
#[derive(Debug, Clone, Parser)]
#[command(name = "chain-server", about = "Multi-tenant append-only log server")]
pub struct ServerConfig {
    /// Detach from the controlling terminal and run in the background.
    #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
    pub daemonize: bool,

    /// Path to the rotating log file sink.
    #[arg(long, default_value = "chaindb.log")]
    pub log_path: PathBuf,

    /// Root directory under which each chain gets its own store.
    #[arg(long, default_value = "storage")]
    pub storage_path: PathBuf,

    /// Shared secret required of clients. Empty disables authorization.
    #[arg(long, default_value = "")]
    pub password: String,

    /// TCP port for the request/reply socket.
    #[arg(long, default_value_t = 8888)]
    pub port: u16,

    /// Listen address for the Prometheus `/metrics` exporter.
    #[arg(long, default_value_t = default_metrics_addr())]
    pub metrics_addr: SocketAddr,
}
