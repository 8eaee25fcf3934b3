use crate::config::*;
use crate::snapshot::CompetitionSnapshot;
use crate::types::*;
use reqwest::StatusCode;
use std::{
  fs,
  path::Path,
  thread::sleep,
  time::{Duration, SystemTime},
};
use tracing::{debug, info, warn};

/// Fetches the competition snapshot. A 404 means the competition has not
/// been published yet and yields an empty snapshot; any other failure is
/// returned to the caller.
pub fn fetch_snapshot(url: &str) -> Result<CompetitionSnapshot, String> {
  let client = reqwest::blocking::Client::new();
  append_fetch_log("Snapshot request", &format!("url: {url}\nUser-Agent: {SNAPSHOT_USER_AGENT}"));
  let mut last_send_err = String::new();
  let mut resp = None;
  for attempt in 0..SNAPSHOT_FETCH_ATTEMPTS {
    if attempt > 0 {
      sleep(Duration::from_millis(500 * u64::from(attempt)));
    }
    match client.get(url).header("User-Agent", SNAPSHOT_USER_AGENT).send() {
      Ok(r) => {
        resp = Some(r);
        break;
      }
      Err(e) => {
        last_send_err = format!("Snapshot request failed (attempt {}): {e}", attempt + 1);
        append_fetch_log("Snapshot error", &last_send_err);
        warn!("{last_send_err}");
      }
    }
  }
  let resp = resp.ok_or_else(|| last_send_err.clone())?;
  let status = resp.status();
  let body = resp.text().map_err(|e| {
    append_fetch_log("Snapshot error", &format!("read failed: {e}"));
    format!("Snapshot read failed: {e}")
  })?;
  append_fetch_log("Snapshot response", &format!("status: {status}\nbody:\n{body}"));
  snapshot_from_response(status, &body)
}

pub fn snapshot_from_response(status: StatusCode, body: &str) -> Result<CompetitionSnapshot, String> {
  if status == StatusCode::NOT_FOUND {
    debug!("snapshot not published yet (404)");
    return Ok(CompetitionSnapshot::default());
  }
  if !status.is_success() {
    return Err(format!("Snapshot error {status}: {body}"));
  }
  parse_snapshot_body(body)
}

pub fn parse_snapshot_body(body: &str) -> Result<CompetitionSnapshot, String> {
  serde_json::from_str::<CompetitionSnapshot>(body).map_err(|e| format!("Snapshot parse failed: {e}"))
}

pub fn load_snapshot_file(path: &Path) -> Result<CompetitionSnapshot, String> {
  if !path.is_file() {
    return Ok(CompetitionSnapshot::default());
  }
  let data = fs::read_to_string(path).map_err(|e| format!("read snapshot {}: {e}", path.display()))?;
  parse_snapshot_body(&data).map_err(|e| format!("{e} ({})", path.display()))
}

pub fn fetch_from_source(source: &SnapshotSource) -> Result<CompetitionSnapshot, String> {
  match source {
    SnapshotSource::Url(url) => fetch_snapshot(url),
    SnapshotSource::File(path) => load_snapshot_file(path),
  }
}

/// Returns the cached snapshot, refreshing it first when forced, when the
/// cache is empty or stale, or when the configured source changed. Only one
/// fetch runs at a time; a failed fetch keeps the previous snapshot.
pub fn maybe_refresh_snapshot(
  config: &AppConfig,
  live_state: &SharedLiveSnapshot,
  force: bool,
) -> Option<CompetitionSnapshot> {
  let source = snapshot_source(config)?;
  {
    let mut guard = live_state.lock().unwrap_or_else(|e| e.into_inner());
    sync_live_snapshot_from_config(&mut guard, config);
    if guard.fetch_in_flight || !needs_refresh(&guard, config, force) {
      return guard.snapshot.clone();
    }
    guard.fetch_in_flight = true;
  }

  let result = fetch_from_source(&source);
  let mut guard = live_state.lock().unwrap_or_else(|e| e.into_inner());
  store_fetch_result(&mut guard, &source, result)
}

fn needs_refresh(state: &LiveSnapshotState, config: &AppConfig, force: bool) -> bool {
  if force || state.snapshot.is_none() {
    return true;
  }
  if config.polling {
    return false;
  }
  match state.last_fetch {
    Some(last) => {
      last.elapsed().map(|age| age.as_millis() as u64).unwrap_or(u64::MAX) > SNAPSHOT_IDLE_REFRESH_MS
    }
    None => true,
  }
}

/// Records a finished fetch. Results for a source that has since been
/// replaced in the config are dropped.
fn store_fetch_result(
  state: &mut LiveSnapshotState,
  source: &SnapshotSource,
  result: Result<CompetitionSnapshot, String>,
) -> Option<CompetitionSnapshot> {
  state.fetch_in_flight = false;
  if state.source.as_ref() != Some(source) {
    debug!("dropping snapshot from {}; source changed during fetch", source.describe());
    return state.snapshot.clone();
  }
  match result {
    Ok(snapshot) => {
      if state.last_error.is_some() {
        info!("snapshot source {} recovered", source.describe());
      }
      state.last_fetch = Some(SystemTime::now());
      state.last_error = None;
      state.snapshot = Some(snapshot.clone());
      Some(snapshot)
    }
    Err(err) => {
      warn!("snapshot refresh from {} failed: {err}", source.describe());
      state.last_error = Some(err);
      state.snapshot.clone()
    }
  }
}

pub fn spawn_snapshot_polling(live_state: SharedLiveSnapshot) {
  std::thread::spawn(move || loop {
    let config = load_config_inner().unwrap_or_else(|_| AppConfig::default());
    let interval = Duration::from_millis(config.poll_interval_ms.max(1));
    if !config.polling || snapshot_source(&config).is_none() {
      sleep(interval);
      continue;
    }
    maybe_refresh_snapshot(&config, &live_state, true);
    sleep(interval);
  });
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::{Arc, Mutex};

  fn sample_path() -> std::path::PathBuf {
    repo_root().join("test_snapshots").join("sample_competition.json")
  }

  fn file_config() -> AppConfig {
    AppConfig {
      test_mode: true,
      test_snapshot_path: sample_path().display().to_string(),
      ..AppConfig::default()
    }
  }

  #[test]
  fn not_found_is_empty_snapshot() {
    let snapshot = snapshot_from_response(StatusCode::NOT_FOUND, "<html>missing</html>").unwrap();
    assert_eq!(snapshot, CompetitionSnapshot::default());
  }

  #[test]
  fn other_failures_propagate() {
    let err = snapshot_from_response(StatusCode::INTERNAL_SERVER_ERROR, "oops").unwrap_err();
    assert!(err.contains("500"));
    assert!(snapshot_from_response(StatusCode::FORBIDDEN, "").is_err());
  }

  #[test]
  fn successful_body_is_parsed() {
    let snapshot = snapshot_from_response(StatusCode::OK, r#"{"name": "Cup", "robots": []}"#).unwrap();
    assert_eq!(snapshot.name.as_deref(), Some("Cup"));
    assert!(snapshot_from_response(StatusCode::OK, "not json").is_err());
  }

  #[test]
  fn file_source_loads_sample() {
    let snapshot = load_snapshot_file(&sample_path()).unwrap();
    assert_eq!(snapshot.name.as_deref(), Some("Spring Robot Cup"));
    let missing = load_snapshot_file(&repo_root().join("test_snapshots/does_not_exist.json")).unwrap();
    assert!(missing.name.is_none());
  }

  #[test]
  fn refresh_fills_cache_and_reuses_it() {
    let live: SharedLiveSnapshot = Arc::new(Mutex::new(LiveSnapshotState::default()));
    let config = file_config();
    let snapshot = maybe_refresh_snapshot(&config, &live, false).unwrap();
    assert_eq!(snapshot.name.as_deref(), Some("Spring Robot Cup"));
    let fetched_at = live.lock().unwrap().last_fetch;
    assert!(fetched_at.is_some());

    let again = maybe_refresh_snapshot(&config, &live, false).unwrap();
    assert_eq!(again, snapshot);
    assert_eq!(live.lock().unwrap().last_fetch, fetched_at);
  }

  #[test]
  fn failed_refresh_keeps_previous_snapshot() {
    let live: SharedLiveSnapshot = Arc::new(Mutex::new(LiveSnapshotState::default()));
    let config = file_config();
    maybe_refresh_snapshot(&config, &live, false).unwrap();

    let broken = std::env::temp_dir().join(format!("robot-snapshot-{}.json", std::process::id()));
    fs::write(&broken, "{ not json").unwrap();
    let broken_config = AppConfig {
      test_snapshot_path: broken.display().to_string(),
      ..config
    };
    {
      let mut guard = live.lock().unwrap();
      guard.source = snapshot_source(&broken_config);
    }
    let kept = maybe_refresh_snapshot(&broken_config, &live, true);
    let _ = fs::remove_file(&broken);
    assert_eq!(kept.and_then(|snapshot| snapshot.name), Some("Spring Robot Cup".to_string()));
    assert!(live.lock().unwrap().last_error.is_some());
  }

  #[test]
  fn fetch_in_flight_is_not_doubled() {
    let config = file_config();
    let live: SharedLiveSnapshot = Arc::new(Mutex::new(LiveSnapshotState {
      source: snapshot_source(&config),
      fetch_in_flight: true,
      ..LiveSnapshotState::default()
    }));
    assert!(maybe_refresh_snapshot(&config, &live, true).is_none());
    let guard = live.lock().unwrap();
    assert!(guard.fetch_in_flight);
    assert!(guard.last_fetch.is_none());
    assert!(guard.snapshot.is_none());
  }

  #[test]
  fn result_for_replaced_source_is_dropped() {
    let old = SnapshotSource::Url("http://old/c.json".to_string());
    let mut state = LiveSnapshotState {
      source: Some(SnapshotSource::Url("http://new/c.json".to_string())),
      fetch_in_flight: true,
      ..LiveSnapshotState::default()
    };
    let fetched = CompetitionSnapshot { name: Some("Old Cup".to_string()), ..CompetitionSnapshot::default() };
    assert!(store_fetch_result(&mut state, &old, Ok(fetched)).is_none());
    assert!(state.snapshot.is_none());
    assert!(state.last_fetch.is_none());
    assert!(!state.fetch_in_flight);

    let err = store_fetch_result(&mut state, &old, Err("Snapshot error 500".to_string()));
    assert!(err.is_none());
    assert!(state.last_error.is_none());
  }

  #[test]
  fn nothing_configured_means_nothing_cached() {
    let live: SharedLiveSnapshot = Arc::new(Mutex::new(LiveSnapshotState::default()));
    assert!(maybe_refresh_snapshot(&AppConfig::default(), &live, true).is_none());
  }
}
