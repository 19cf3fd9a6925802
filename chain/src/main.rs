//! `chain-server` binary: parses flags, optionally daemonizes, initializes
//! structured logging, checks the random source is ready, then wires up
//! the manager, dispatcher, metrics exporter, and request/reply server.
//!
//! Mirrors the reference `ChainDB::initialize`/`run` boot sequence: flag
//! parsing, daemonization, logger initialization, random-generator
//! readiness, then server startup with signal-driven shutdown.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use clap::Parser;
use daemonize::Daemonize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use chain::config::ServerConfig;
use chain::crypto::random;
use chain::dispatcher::Dispatcher;
use chain::manager::Manager;
use chain::metrics::{MetricsRegistry, run_prometheus_http_server};
use chain::server::Server;

fn main() {
    let config = ServerConfig::parse();

    if config.daemonize {
        if let Err(e) = Daemonize::new().start() {
            eprintln!("failed to daemonize: {e}");
            std::process::exit(-1);
        }
    }

    init_logging(&config.log_path);

    if !random::status() && !random::poll() {
        tracing::error!("random generator is not ready, refusing to start");
        std::process::exit(-1);
    }

    let manager = Manager::new(&config.storage_path);
    let metrics = Arc::new(MetricsRegistry::new().expect("failed to initialize metrics registry"));
    let dispatcher = Dispatcher::new(manager, config.password.clone()).with_metrics(metrics.clone());

    let server = Server::new(dispatcher, config.port);
    let stop = server.stop_flag();

    ctrlc::set_handler(move || {
        tracing::info!("shutdown signal received");
        stop.store(true, Ordering::SeqCst);
    })
    .expect("failed to install signal handler");

    let metrics_addr = config.metrics_addr;
    let runtime = tokio::runtime::Runtime::new().expect("failed to start metrics runtime");
    runtime.spawn(async move {
        if let Err(e) = run_prometheus_http_server(metrics, metrics_addr).await {
            tracing::error!("metrics exporter failed: {e}");
        }
    });
    tracing::info!("metrics exporter listening on http://{metrics_addr}/metrics");

    tracing::info!(
        port = config.port,
        storage_path = %config.storage_path.display(),
        "chain-server starting"
    );

    if let Err(e) = server.run() {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }

    tracing::info!("chain-server exiting");
}

fn init_logging(log_path: &std::path::Path) {
    let directory = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| std::path::PathBuf::from("."));
    let file_name = log_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "chaindb.log".to_string());

    let file_appender = tracing_appender::rolling::daily(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    // Leaked intentionally: the guard must outlive the process for buffered
    // log lines to be flushed, and `main` never returns an owned scope for it.
    std::mem::forget(guard);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking.and(std::io::stderr))
        .init();
}
