//! Git adapter for the solutions repository.
//!
//! A small, explicit wrapper around `git` subprocess calls. Every call runs
//! with a timeout so a hung remote cannot stall the run.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::{debug, instrument};

use super::process::{CapturedOutput, run_with_timeout};

const GIT_OUTPUT_LIMIT_BYTES: usize = 64 * 1024;

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
    timeout: Duration,
    /// Secret to scrub from error messages.
    redact: Option<String>,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            workdir: workdir.into(),
            timeout,
            redact: None,
        }
    }

    /// Scrub `secret` from any error this wrapper reports.
    pub fn with_redaction(mut self, secret: Option<String>) -> Self {
        self.redact = secret.filter(|s| !s.is_empty());
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Clone `url` into this wrapper's workdir.
    #[instrument(skip_all, fields(dest = %self.workdir.display()))]
    pub fn clone_remote(&self, url: &str) -> Result<()> {
        let parent = self
            .workdir
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let dest = self.workdir.to_string_lossy().to_string();
        debug!("cloning solutions repository");
        self.run_checked_in(parent, &["clone", url, &dest])?;
        Ok(())
    }

    /// Fast-forward the current branch from its upstream.
    #[instrument(skip_all)]
    pub fn pull(&self) -> Result<()> {
        debug!("pulling solutions repository");
        self.run_checked(&["pull", "--ff-only"])?;
        Ok(())
    }

    /// Set the local commit identity.
    pub fn config_user(&self, name: &str, email: &str) -> Result<()> {
        self.run_checked(&["config", "user.name", name])?;
        self.run_checked(&["config", "user.email", email])?;
        Ok(())
    }

    /// Stage a single path relative to the workdir.
    pub fn add_path(&self, path: &Path) -> Result<()> {
        let path = path.to_string_lossy();
        self.run_checked(&["add", "--", &path])?;
        Ok(())
    }

    /// True if there is anything staged for commit.
    pub fn has_staged_changes(&self) -> Result<bool> {
        let out = self.run_checked(&["diff", "--cached", "--name-only"])?;
        Ok(!out.stdout.trim().is_empty())
    }

    /// Commit staged changes with a message.
    ///
    /// If there are no staged changes, this returns Ok(false) and does nothing.
    #[instrument(skip_all)]
    pub fn commit_staged(&self, message: &str) -> Result<bool> {
        if !self.has_staged_changes()? {
            debug!("no staged changes, skipping commit");
            return Ok(false);
        }
        debug!("committing staged changes");
        self.run_checked(&["commit", "-m", message])?;
        Ok(true)
    }

    #[instrument(skip_all)]
    pub fn push(&self) -> Result<()> {
        debug!("pushing solutions repository");
        self.run_checked(&["push"])?;
        Ok(())
    }

    /// Current HEAD commit subject.
    pub fn head_subject(&self) -> Result<String> {
        let out = self.run_checked(&["log", "-1", "--format=%s"])?;
        Ok(out.stdout.trim().to_string())
    }

    fn run_checked(&self, args: &[&str]) -> Result<CapturedOutput> {
        self.run_checked_in(&self.workdir, args)
    }

    fn run_checked_in(&self, dir: &Path, args: &[&str]) -> Result<CapturedOutput> {
        let mut cmd = Command::new("git");
        cmd.args(args)
            .current_dir(dir)
            .env("GIT_TERMINAL_PROMPT", "0");
        let label = format!("git {}", args.join(" "));
        run_with_timeout(cmd, &label, self.timeout, GIT_OUTPUT_LIMIT_BYTES)
            .map_err(|e| anyhow!(self.scrub(&format!("{e:#}"))))
    }

    fn scrub(&self, message: &str) -> String {
        match &self.redact {
            Some(secret) => message.replace(secret.as_str(), "***"),
            None => message.to_string(),
        }
    }
}

/// Inject `token` into an https remote URL (`https://<token>@host/...`).
///
/// Non-https URLs and an absent token return the URL unchanged.
pub fn authenticated_url(remote: &str, token: Option<&str>) -> String {
    match (remote.strip_prefix("https://"), token) {
        (Some(rest), Some(token)) if !token.is_empty() => {
            let host_and_path = rest.split_once('@').map_or(rest, |(_, after)| after);
            format!("https://{token}@{host_and_path}")
        }
        _ => remote.to_string(),
    }
}
