#![forbid(unsafe_code)]

use perilgrid_server::{
    build_router, validate_startup_config_contract, AdjustPaths, ApiConfig, AppState,
    ProcessEngine,
};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn required_env(name: &str) -> Result<String, String> {
    let value = env::var(name).unwrap_or_default();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{name} is required"));
    }
    Ok(trimmed.to_string())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("PERILGRID_LOG_JSON", true) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let bind_addr = env::var("PERILGRID_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let data_dir = PathBuf::from(required_env("PERILGRID_DATA_DIR")?);
    let paths = AdjustPaths::resolve(
        data_dir,
        &required_env("PERILGRID_INPUT_YLT_FILE")?,
        &required_env("PERILGRID_COUNTS_FILE")?,
        &required_env("PERILGRID_METRICS_FILE")?,
        &required_env("PERILGRID_GATES_FILE")?,
        PathBuf::from(required_env("PERILGRID_SAVE_DIR")?),
    );

    let api = ApiConfig {
        max_body_bytes: env_usize("PERILGRID_MAX_BODY_BYTES", 16 * 1024),
        preview_rows: env_usize("PERILGRID_PREVIEW_ROWS", 5),
    };
    validate_startup_config_contract(&api, &paths)?;

    let engine = Arc::new(ProcessEngine::new(PathBuf::from(required_env(
        "PERILGRID_ADJUST_BIN",
    )?)));

    let state = AppState::with_config(paths, engine, api);
    let app = build_router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("bind {bind_addr} failed: {e}"))?;
    info!("perilgrid-server listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            let drain_ms = env_u64("PERILGRID_SHUTDOWN_DRAIN_MS", 5000);
            tokio::time::sleep(Duration::from_millis(drain_ms)).await;
        })
        .await
        .map_err(|e| format!("server failed: {e}"))
}
