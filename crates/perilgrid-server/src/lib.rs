#![forbid(unsafe_code)]

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

mod config;
mod engine;
mod http;
mod middleware;

pub const CRATE_NAME: &str = "perilgrid-server";

/// Failures on the adjustment path. Both kinds surface as HTTP 500 with
/// the `Display` string as the error message; the message is what
/// distinguishes a missing input from a failed run.
#[derive(Debug)]
pub enum AdjustError {
    MissingInput { label: &'static str, path: PathBuf },
    Engine(String),
}

impl fmt::Display for AdjustError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInput { label, path } => {
                write!(f, "{label} not found: {}", path.display())
            }
            Self::Engine(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for AdjustError {}

#[derive(Default)]
pub struct RequestMetrics {
    counts: Mutex<HashMap<(String, u16), u64>>,
    latency_ns: Mutex<HashMap<String, Vec<u64>>>,
}

impl RequestMetrics {
    pub(crate) async fn observe_request(&self, route: &str, status: StatusCode, latency: Duration) {
        let mut counts = self.counts.lock().await;
        *counts
            .entry((route.to_string(), status.as_u16()))
            .or_insert(0) += 1;
        drop(counts);
        let mut latency_map = self.latency_ns.lock().await;
        latency_map
            .entry(route.to_string())
            .or_insert_with(Vec::new)
            .push(latency.as_nanos() as u64);
    }

    pub(crate) async fn render_text(&self) -> String {
        let counts = self.counts.lock().await;
        let mut keys: Vec<(String, u16)> = counts.keys().cloned().collect();
        keys.sort();
        let mut out = String::new();
        for key in keys {
            let n = counts[&key];
            let (route, status) = key;
            out.push_str(&format!(
                "perilgrid_requests_total{{route=\"{route}\",status=\"{status}\"}} {n}\n"
            ));
        }
        drop(counts);
        let latency = self.latency_ns.lock().await;
        let mut routes: Vec<String> = latency.keys().cloned().collect();
        routes.sort();
        for route in routes {
            let samples = &latency[&route];
            let sum_secs = samples.iter().copied().sum::<u64>() as f64 / 1e9;
            out.push_str(&format!(
                "perilgrid_request_latency_seconds_sum{{route=\"{route}\"}} {sum_secs}\n"
            ));
            out.push_str(&format!(
                "perilgrid_request_latency_seconds_count{{route=\"{route}\"}} {}\n",
                samples.len()
            ));
        }
        out
    }
}

#[derive(Clone)]
pub struct AppState {
    pub api: ApiConfig,
    pub paths: Arc<AdjustPaths>,
    pub engine: Arc<dyn AdjustEngine>,
    pub(crate) metrics: Arc<RequestMetrics>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(paths: AdjustPaths, engine: Arc<dyn AdjustEngine>) -> Self {
        Self::with_config(paths, engine, ApiConfig::default())
    }

    #[must_use]
    pub fn with_config(paths: AdjustPaths, engine: Arc<dyn AdjustEngine>, api: ApiConfig) -> Self {
        Self {
            api,
            paths: Arc::new(paths),
            engine,
            metrics: Arc::new(RequestMetrics::default()),
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(http::handlers::landing_handler))
        .route("/healthz", get(http::handlers::healthz_handler))
        .route("/metrics", get(http::handlers::metrics_handler))
        .route("/adjust", post(http::handlers::adjust_handler))
        .route("/get-image/:filename", get(http::images::image_handler))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::request_tracing::request_tracing_middleware,
        ))
        .layer(from_fn(middleware::preflight::preflight_middleware))
        .layer(DefaultBodyLimit::max(state.api.max_body_bytes))
        .with_state(state)
}

pub use config::{validate_startup_config_contract, AdjustPaths, ApiConfig};
pub use engine::fake::FakeEngine;
pub use engine::process::ProcessEngine;
pub use engine::AdjustEngine;
