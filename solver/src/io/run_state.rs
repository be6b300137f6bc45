//! Run state for the once-per-day guard (`.solver/state/run_state.json`).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of the latest invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunState {
    /// Local date the run happened on.
    pub date: NaiveDate,
    /// True once that day's problem was accepted.
    pub success: bool,
    /// When the state was written.
    pub timestamp: DateTime<Local>,
}

impl RunState {
    pub fn new(date: NaiveDate, success: bool) -> Self {
        Self {
            date,
            success,
            timestamp: Local::now(),
        }
    }
}

/// True unless `state` records a success for `today`.
///
/// Advisory only: two concurrent invocations can both pass this check.
pub fn should_run(state: Option<&RunState>, today: NaiveDate) -> bool {
    match state {
        Some(state) => !(state.date == today && state.success),
        None => true,
    }
}

/// Load run state from disk; `None` when no run has been recorded yet.
pub fn load_run_state(path: &Path) -> Result<Option<RunState>> {
    if !path.exists() {
        debug!(path = %path.display(), "no run state yet");
        return Ok(None);
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("read run state {}", path.display()))?;
    let state: RunState = serde_json::from_str(&contents)
        .with_context(|| format!("parse run state {}", path.display()))?;
    debug!(date = %state.date, success = state.success, "run state loaded");
    Ok(Some(state))
}

/// Atomically write run state to disk (temp file + rename).
pub fn write_run_state(path: &Path, state: &RunState) -> Result<()> {
    debug!(path = %path.display(), date = %state.date, success = state.success, "writing run state");
    let mut buf = serde_json::to_string_pretty(state)?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("run state path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp run state {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace run state {}", path.display()))?;
    Ok(())
}
