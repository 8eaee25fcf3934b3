use crate::types::*;
use chrono::Local;
use std::{
    env,
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::{info, warn};

pub fn repo_root() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn resolve_repo_path(raw: &str) -> PathBuf {
  let path = PathBuf::from(raw);
  if path.is_absolute() {
    path
  } else {
    repo_root().join(path)
  }
}

pub fn config_path() -> PathBuf {
  repo_root().join("config.json")
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

pub fn apply_env_defaults(mut config: AppConfig) -> AppConfig {
  if config.snapshot_url.trim().is_empty() {
    if let Some(value) = env_default("COMPETITION_SNAPSHOT_URL") {
      config.snapshot_url = value;
    }
  }
  if config.overlay_addr.trim().is_empty() {
    config.overlay_addr = env_default("OVERLAY_ADDR").unwrap_or_else(|| DEFAULT_OVERLAY_ADDR.to_string());
  }
  if config.overlay_dir.trim().is_empty() {
    if let Some(value) = env_default("OVERLAY_DIR") {
      config.overlay_dir = value;
    }
  }
  if config.test_snapshot_path.trim().is_empty() {
    if let Some(value) = env_default("TEST_SNAPSHOT_PATH") {
      config.test_snapshot_path = value;
    }
  }
  if config.poll_interval_ms == 0 {
    config.poll_interval_ms = DEFAULT_POLL_INTERVAL_MS;
  }
  config
}

pub fn load_config_inner() -> Result<AppConfig, String> {
  load_config_from(&config_path())
}

pub fn save_config_inner(config: AppConfig) -> Result<AppConfig, String> {
  save_config_to(&config_path(), config)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig, String> {
  if !path.is_file() {
    return Ok(apply_env_defaults(AppConfig::default()));
  }
  let data = fs::read_to_string(path).map_err(|e| format!("read config {}: {e}", path.display()))?;
  let config =
    serde_json::from_str::<AppConfig>(&data).map_err(|e| format!("parse config {}: {e}", path.display()))?;
  Ok(apply_env_defaults(config))
}

pub fn save_config_to(path: &Path, config: AppConfig) -> Result<AppConfig, String> {
  let payload = serde_json::to_string_pretty(&config).map_err(|e| e.to_string())?;
  fs::write(path, payload).map_err(|e| format!("write config {}: {e}", path.display()))?;
  Ok(config)
}

/// Writes a default `config.json` on first start so there is a file to edit.
pub fn ensure_config_file() {
  if config_path().is_file() {
    return;
  }
  match save_config_inner(AppConfig::default()) {
    Ok(_) => info!("wrote default config to {}", config_path().display()),
    Err(e) => warn!("{e}"),
  }
}

/// Exports `.env` entries that are not already set in the environment.
pub fn load_env_file() {
  let Ok(contents) = fs::read_to_string(repo_root().join(".env")) else {
    return;
  };
  for (key, value) in contents.lines().filter_map(parse_env_line) {
    if env::var_os(&key).is_none() {
      env::set_var(key, value);
    }
  }
}

/// `KEY=value` with optional `export`, quotes, and trailing comments on
/// unquoted values. Blank and comment lines yield `None`.
pub fn parse_env_line(line: &str) -> Option<(String, String)> {
  let line = line.trim();
  if line.starts_with('#') {
    return None;
  }
  let (key, raw) = line.strip_prefix("export ").unwrap_or(line).split_once('=')?;
  let key = key.trim();
  if key.is_empty() {
    return None;
  }
  Some((key.to_string(), env_value(raw.trim()).to_string()))
}

fn env_value(raw: &str) -> &str {
  for quote in ['"', '\''] {
    if let Some(inner) = raw.strip_prefix(quote).and_then(|rest| rest.strip_suffix(quote)) {
      return inner;
    }
  }
  raw.split_once('#').map_or(raw, |(value, _)| value.trim_end())
}

pub fn system_time_ms(time: SystemTime) -> Option<u64> {
  time
    .duration_since(UNIX_EPOCH)
    .ok()
    .map(|duration| duration.as_millis() as u64)
}

pub fn fetch_log_path() -> PathBuf {
  repo_root().join("logs").join("snapshot_fetch.log")
}

/// Appends a raw request/response record next to the tracing output.
pub fn append_fetch_log(label: &str, payload: &str) {
  let dir = repo_root().join("logs");
  if fs::create_dir_all(&dir).is_err() {
    return;
  }
  let path = fetch_log_path();
  let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
  let entry = format!("[{timestamp}] {label}\n{payload}\n\n");
  if let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(&path) {
    let _ = file.write_all(entry.as_bytes());
  }
}

/// Test mode reads a local snapshot file; otherwise the configured URL is
/// fetched. `None` when neither is configured.
pub fn snapshot_source(config: &AppConfig) -> Option<SnapshotSource> {
  if config.test_mode {
    let trimmed = config.test_snapshot_path.trim();
    if trimmed.is_empty() {
      return None;
    }
    return Some(SnapshotSource::File(resolve_repo_path(trimmed)));
  }
  let url = config.snapshot_url.trim();
  if url.is_empty() {
    return None;
  }
  Some(SnapshotSource::Url(url.to_string()))
}

pub fn overlay_dir(config: &AppConfig) -> PathBuf {
  resolve_repo_path(config.overlay_dir.trim())
}

/// Drops cached data when the configured source no longer matches it.
pub fn sync_live_snapshot_from_config(guard: &mut LiveSnapshotState, config: &AppConfig) {
  let source = snapshot_source(config);
  if guard.source != source {
    guard.snapshot = None;
    guard.last_fetch = None;
    guard.last_error = None;
    guard.source = source;
  }
}

pub fn log_env_warnings() {
  let config = load_config_inner().unwrap_or_else(|_| AppConfig::default());
  let mut warnings = Vec::new();

  if config.test_mode {
    let path = resolve_repo_path(config.test_snapshot_path.trim());
    if !path.is_file() {
      warnings.push(format!("Test mode is on but {} does not exist", path.display()));
    }
  } else if config.snapshot_url.trim().is_empty() {
    warnings.push("COMPETITION_SNAPSHOT_URL not set and no snapshot URL in config — nothing will be displayed".to_string());
  }
  if !overlay_dir(&config).is_dir() {
    warnings.push(format!("Overlay directory {} not found — only state.json will be served", overlay_dir(&config).display()));
  }

  for msg in warnings {
    warn!("{}", msg);
  }
}
