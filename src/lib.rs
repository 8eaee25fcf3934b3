pub mod types;
pub mod config;
pub mod error;
pub mod snapshot;
pub mod scores;
pub mod outcome;
pub mod swiss;
pub mod bracket;
pub mod view;
pub mod fetch;

use types::*;
use config::*;
use snapshot::CompetitionSnapshot;
use view::derive_view;

use std::{
    fs,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::SystemTime,
};
use axum::{
    extract::State as AxumState,
    response::IntoResponse,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// ── Overlay payload ────────────────────────────────────────────────────

/// Derives the view for the cached snapshot. Derivation runs on every call
/// so the overlay always reflects the latest fetch.
pub fn build_overlay_payload(
    snapshot: Option<&CompetitionSnapshot>,
    last_error: Option<String>,
    last_fetch: Option<SystemTime>,
) -> OverlayStatePayload {
    let view = snapshot.and_then(derive_view);
    let mut messages = Vec::new();
    for failed in view.iter().flat_map(|view| &view.errors) {
        error!("{:?} section does not follow the scoring rules: {}", failed.section, failed.error);
        messages.push(failed.error.to_string());
    }
    let derive_error = (!messages.is_empty()).then(|| messages.join("; "));
    OverlayStatePayload {
        view,
        derive_error,
        last_error,
        last_fetch_ms: last_fetch.and_then(system_time_ms),
    }
}

// ── Overlay HTTP server ────────────────────────────────────────────────

fn overlay_router(state: OverlayServerState, static_dir: PathBuf) -> Router {
    Router::new()
        .route("/state.json", get(get_overlay_state_json))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}

async fn start_overlay_server(state: OverlayServerState, static_dir: PathBuf, addr: &str) {
    let app = overlay_router(state, static_dir);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("overlay server failed to bind {addr}: {e}");
            return;
        }
    };
    info!("overlay server listening at http://{addr}/");
    if let Err(e) = axum::serve(listener, app).await {
        error!("overlay server error: {e}");
    }
}

async fn get_overlay_state_json(AxumState(state): AxumState<OverlayServerState>) -> impl IntoResponse {
    let live = state.live_snapshot.clone();
    let refreshed = tokio::task::spawn_blocking(move || {
        let config = load_config_inner().unwrap_or_else(|_| AppConfig::default());
        fetch::maybe_refresh_snapshot(&config, &live, false)
    })
    .await;
    let snapshot = match refreshed {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!("snapshot refresh task failed: {e}");
            let guard = state.live_snapshot.lock().unwrap_or_else(|e| e.into_inner());
            guard.snapshot.clone()
        }
    };
    let (last_error, last_fetch) = {
        let guard = state.live_snapshot.lock().unwrap_or_else(|e| e.into_inner());
        (guard.last_error.clone(), guard.last_fetch)
    };

    let payload = build_overlay_payload(snapshot.as_ref(), last_error, last_fetch);
    let body = serde_json::to_string(&payload).unwrap_or_else(|_| "{}".to_string());
    (
        [
            ("Content-Type", "application/json"),
            ("Cache-Control", "no-store"),
            ("Pragma", "no-cache"),
            ("Expires", "0"),
        ],
        body,
    )
}

// ── Entry point ────────────────────────────────────────────────────────

pub async fn run() {
    load_env_file();

    // Initialize tracing with a daily rolling log file
    let logs_dir = repo_root().join("logs");
    fs::create_dir_all(&logs_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    info!("Robot competition display starting");
    ensure_config_file();
    log_env_warnings();

    let config = match load_config_inner() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}; falling back to defaults");
            apply_env_defaults(AppConfig::default())
        }
    };
    if let Some(source) = snapshot_source(&config) {
        info!("reading competition snapshot from {}", source.describe());
    }

    let live_snapshot: SharedLiveSnapshot = Arc::new(Mutex::new(LiveSnapshotState::default()));
    fetch::spawn_snapshot_polling(live_snapshot.clone());

    let overlay_state = OverlayServerState { live_snapshot };
    start_overlay_server(overlay_state, overlay_dir(&config), &config.overlay_addr).await;
}
