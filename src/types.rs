use serde::{Deserialize, Serialize};
use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::SystemTime,
};

use crate::snapshot::CompetitionSnapshot;
use crate::view::CompetitionView;

// ── Constants ──────────────────────────────────────────────────────────

pub const DEFAULT_OVERLAY_ADDR: &str = "127.0.0.1:17890";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const SNAPSHOT_IDLE_REFRESH_MS: u64 = 10_000;
pub const SNAPSHOT_FETCH_ATTEMPTS: u32 = 3;
pub const SNAPSHOT_USER_AGENT: &str = "robot-competition-display";

// ── Shared state type aliases ──────────────────────────────────────────

pub type SharedLiveSnapshot = Arc<Mutex<LiveSnapshotState>>;

// ── Snapshot cache ─────────────────────────────────────────────────────

/// Where the competition snapshot comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
    Url(String),
    File(PathBuf),
}

impl SnapshotSource {
    pub fn describe(&self) -> String {
        match self {
            SnapshotSource::Url(url) => url.clone(),
            SnapshotSource::File(path) => path.display().to_string(),
        }
    }
}

#[derive(Default)]
pub struct LiveSnapshotState {
    pub snapshot: Option<CompetitionSnapshot>,
    pub last_fetch: Option<SystemTime>,
    pub last_error: Option<String>,
    pub source: Option<SnapshotSource>,
    pub fetch_in_flight: bool,
}

#[derive(Clone)]
pub struct OverlayServerState {
    pub live_snapshot: SharedLiveSnapshot,
}

// ── Overlay payload ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayStatePayload {
    pub view: Option<CompetitionView>,
    pub derive_error: Option<String>,
    pub last_error: Option<String>,
    pub last_fetch_ms: Option<u64>,
}

// ── Config types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub snapshot_url: String,
    pub polling: bool,
    pub poll_interval_ms: u64,
    pub overlay_addr: String,
    pub overlay_dir: String,
    pub test_mode: bool,
    pub test_snapshot_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            snapshot_url: String::new(),
            polling: true,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            overlay_addr: DEFAULT_OVERLAY_ADDR.to_string(),
            overlay_dir: "overlay".to_string(),
            test_mode: false,
            test_snapshot_path: "test_snapshots/sample_competition.json".to_string(),
        }
    }
}
