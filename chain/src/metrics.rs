//! Prometheus metrics and HTTP exporter (§14, ambient).
//!
//! Tracks request volume by kind and status, handling latency, and
//! authorization failures. Served on a separate listener from the
//! request/reply socket so scraping never competes with traffic.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Method, Request, Response, StatusCode, body::Incoming, header, server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Dispatcher-related Prometheus metrics.
#[derive(Clone)]
pub struct DispatcherMetrics {
    /// Total requests handled, labeled by request kind and status name.
    pub requests_total: IntCounterVec,
    /// Latency of a full decode-auth-dispatch-encode cycle, in seconds.
    pub request_seconds: Histogram,
    /// Total requests rejected for missing or mismatched authorization.
    pub auth_failures_total: IntCounter,
}

impl DispatcherMetrics {
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let requests_total = IntCounterVec::new(
            Opts::new(
                "requests_total",
                "Total requests handled, labeled by kind and status",
            ),
            &["kind", "status"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let request_seconds = Histogram::with_opts(
            HistogramOpts::new("request_seconds", "Request handling latency in seconds").buckets(
                vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5, 1.0],
            ),
        )?;
        registry.register(Box::new(request_seconds.clone()))?;

        let auth_failures_total = IntCounter::with_opts(Opts::new(
            "auth_failures_total",
            "Total requests rejected for missing or invalid authorization",
        ))?;
        registry.register(Box::new(auth_failures_total.clone()))?;

        Ok(Self {
            requests_total,
            request_seconds,
            auth_failures_total,
        })
    }
}

/// Wrapper around a Prometheus registry and the dispatcher metrics. Wrap in
/// an `Arc` and share between the server's poll loop and the exporter task.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub dispatcher: DispatcherMetrics,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("chaindb".to_string()), None)?;
        let dispatcher = DispatcherMetrics::register(&registry)?;
        Ok(Self {
            registry,
            dispatcher,
        })
    }

    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            eprintln!("failed to encode Prometheus metrics: {e}");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Runs an HTTP server exposing `GET /metrics` in Prometheus text format.
/// All other paths return 404. Intended to be spawned on a Tokio runtime
/// separate from the zmq poll loop.
pub async fn run_prometheus_http_server(
    metrics: Arc<MetricsRegistry>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let svc = service_fn(move |req| {
                let metrics = metrics.clone();
                handle_request(req, metrics)
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                eprintln!("metrics HTTP server error: {err}");
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    metrics: Arc<MetricsRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            let body = metrics.gather_text();
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
                .body(Full::new(Bytes::from(body)))
                .unwrap())
        }
        _ => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("not found")))
            .unwrap()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn dispatcher_metrics_register_and_record() {
        let registry = Registry::new();
        let metrics = DispatcherMetrics::register(&registry).expect("register metrics");

        metrics
            .requests_total
            .with_label_values(&["ping", "Success"])
            .inc();
        metrics.request_seconds.observe(0.002);
        metrics.auth_failures_total.inc();

        let families = registry.gather();
        assert!(!families.is_empty());
    }

    #[test]
    fn metrics_registry_gather_text_contains_metric_names() {
        let registry = MetricsRegistry::new().expect("create metrics registry");
        registry
            .dispatcher
            .requests_total
            .with_label_values(&["ping", "Success"])
            .inc();
        let text = registry.gather_text();
        assert!(text.contains("requests_total"));
    }
}
