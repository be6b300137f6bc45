//! Persistence sink for accepted solutions.
//!
//! [`FileSink`] writes into a local directory. [`GitSink`] writes into a
//! clone of a remote repository and commits/pushes. Once a checkout exists,
//! a failed pull, commit or push is reported in the receipt rather than as an
//! error, so the solution is always on disk.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use crate::error::{SolveError, SolveResult};
use crate::io::config::{GitConfig, Layout};
use crate::io::git::{Git, authenticated_url};

/// What gets persisted after acceptance.
#[derive(Debug, Clone, Copy)]
pub struct SolutionRecord<'a> {
    pub date: NaiveDate,
    pub title: &'a str,
    pub code: &'a str,
}

/// Where the solution ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistReceipt {
    pub path: PathBuf,
    pub committed: bool,
    pub pushed: bool,
}

pub trait SolutionSink {
    fn persist(&self, record: &SolutionRecord<'_>) -> SolveResult<PersistReceipt>;
}

/// Deterministic date-derived location of a solution file.
///
/// `Monthly`: `<base>/<Mon>/<Mon><DD>.<ext>`; `Dated`: `<base>/leetcode-<Mon><DD>-<YY>.<ext>`.
/// `.` components in `base_dir` are dropped.
pub fn solution_path(layout: Layout, base_dir: &Path, date: NaiveDate, ext: &str) -> PathBuf {
    let base_dir: PathBuf = base_dir
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    match layout {
        Layout::Monthly => {
            let month = date.format("%b").to_string();
            base_dir
                .join(&month)
                .join(format!("{month}{}.{ext}", date.format("%d")))
        }
        Layout::Dated => base_dir.join(format!("leetcode-{}.{ext}", date.format("%b%d-%y"))),
    }
}

/// Commit message for a solution.
pub fn commit_message(title: &str, date: NaiveDate) -> String {
    format!("Add LeetCode solution: {title} ({})", date.format("%b %d"))
}

fn write_solution(path: &Path, code: &str) -> SolveResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            SolveError::Persistence(format!("create directory {}: {e}", parent.display()))
        })?;
    }
    let mut contents = code.to_string();
    if !contents.ends_with('\n') {
        contents.push('\n');
    }
    fs::write(path, contents)
        .map_err(|e| SolveError::Persistence(format!("write {}: {e}", path.display())))
}

/// Writes solutions under a local directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    layout: Layout,
    base_dir: PathBuf,
    extension: String,
}

impl FileSink {
    pub fn new(layout: Layout, base_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            layout,
            base_dir: base_dir.into(),
            extension: extension.into(),
        }
    }
}

impl SolutionSink for FileSink {
    #[instrument(skip_all, fields(date = %record.date))]
    fn persist(&self, record: &SolutionRecord<'_>) -> SolveResult<PersistReceipt> {
        let path = solution_path(self.layout, &self.base_dir, record.date, &self.extension);
        write_solution(&path, record.code)?;
        info!(path = %path.display(), "solution saved");
        Ok(PersistReceipt {
            path,
            committed: false,
            pushed: false,
        })
    }
}

/// Writes solutions into a git checkout and publishes them.
#[derive(Debug, Clone)]
pub struct GitSink {
    git: Git,
    remote_url: Option<String>,
    token: Option<String>,
    layout: Layout,
    base_dir: PathBuf,
    extension: String,
    user: Option<(String, String)>,
    push: bool,
}

impl GitSink {
    /// `base_dir` is relative to the checkout.
    pub fn new(
        cfg: &GitConfig,
        token: Option<String>,
        layout: Layout,
        base_dir: impl Into<PathBuf>,
        extension: impl Into<String>,
    ) -> Self {
        let git = Git::new(&cfg.repo_dir, Duration::from_secs(cfg.timeout_secs))
            .with_redaction(token.clone());
        let user = match (&cfg.user_name, &cfg.user_email) {
            (Some(name), Some(email)) => Some((name.clone(), email.clone())),
            _ => None,
        };
        Self {
            git,
            remote_url: cfg.remote_url.clone(),
            token,
            layout,
            base_dir: base_dir.into(),
            extension: extension.into(),
            user,
            push: cfg.push,
        }
    }

    /// Make sure a checkout exists. Returns false when an existing checkout
    /// could not be brought up to date; pushing is skipped in that case.
    fn prepare_checkout(&self) -> SolveResult<bool> {
        let workdir = self.git.workdir();
        if workdir.join(".git").exists() {
            if self.remote_url.is_some()
                && let Err(err) = self.git.pull()
            {
                warn!(err = %format!("{err:#}"), "git pull failed, committing locally");
                return Ok(false);
            }
            return Ok(true);
        }
        let remote = self.remote_url.as_deref().ok_or_else(|| {
            SolveError::Persistence(format!(
                "{} is not a git checkout and no remote_url is configured",
                workdir.display()
            ))
        })?;
        let url = authenticated_url(remote, self.token.as_deref());
        self.git
            .clone_remote(&url)
            .map_err(|e| SolveError::Persistence(format!("{e:#}")))?;
        Ok(true)
    }

    /// Commit and push; failures are logged and reflected in the flags.
    fn publish(&self, relative: &Path, message: &str, push: bool) -> (bool, bool) {
        if let Some((name, email)) = &self.user
            && let Err(err) = self.git.config_user(name, email)
        {
            warn!(err = %format!("{err:#}"), "git identity not set");
        }
        let committed = match self
            .git
            .add_path(relative)
            .and_then(|()| self.git.commit_staged(message))
        {
            Ok(committed) => committed,
            Err(err) => {
                warn!(err = %format!("{err:#}"), "git commit failed");
                return (false, false);
            }
        };
        if !committed || !push {
            return (committed, false);
        }
        match self.git.push() {
            Ok(()) => (true, true),
            Err(err) => {
                warn!(err = %format!("{err:#}"), "git push failed");
                (true, false)
            }
        }
    }
}

impl SolutionSink for GitSink {
    #[instrument(skip_all, fields(date = %record.date, repo = %self.git.workdir().display()))]
    fn persist(&self, record: &SolutionRecord<'_>) -> SolveResult<PersistReceipt> {
        let synced = self.prepare_checkout()?;
        let relative = solution_path(self.layout, &self.base_dir, record.date, &self.extension);
        let path = self.git.workdir().join(&relative);
        write_solution(&path, record.code)?;
        info!(path = %path.display(), "solution saved");

        let message = commit_message(record.title, record.date);
        let (committed, pushed) = self.publish(&relative, &message, self.push && synced);
        info!(committed, pushed, "solution published");
        Ok(PersistReceipt {
            path,
            committed,
            pushed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn dec(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, d).expect("date")
    }

    #[test]
    fn monthly_and_dated_layouts() {
        assert_eq!(
            solution_path(Layout::Monthly, Path::new("leetcode_daily"), dec(10), "java"),
            PathBuf::from("leetcode_daily/Dec/Dec10.java")
        );
        assert_eq!(
            solution_path(Layout::Dated, Path::new("."), dec(10), "java"),
            PathBuf::from("leetcode-Dec10-25.java")
        );
        assert_eq!(
            solution_path(Layout::Dated, Path::new("repo/./daily"), dec(10), "java"),
            PathBuf::from("repo/daily/leetcode-Dec10-25.java")
        );
        assert_eq!(
            solution_path(Layout::Monthly, Path::new("x"), dec(3), "py"),
            PathBuf::from("x/Dec/Dec03.py")
        );
    }

    #[test]
    fn commit_message_names_title_and_day() {
        assert_eq!(
            commit_message("Two Sum", dec(10)),
            "Add LeetCode solution: Two Sum (Dec 10)"
        );
    }

    #[test]
    fn file_sink_writes_code_with_trailing_newline() {
        let temp = tempfile::tempdir().expect("tempdir");
        let sink = FileSink::new(Layout::Monthly, temp.path(), "java");
        let receipt = sink
            .persist(&SolutionRecord {
                date: dec(10),
                title: "Two Sum",
                code: "class Solution {}",
            })
            .expect("persist");
        assert_eq!(receipt.path, temp.path().join("Dec/Dec10.java"));
        assert!(!receipt.pushed);
        let contents = fs::read_to_string(&receipt.path).expect("read");
        assert_eq!(contents, "class Solution {}\n");
    }

    #[test]
    fn git_sink_without_checkout_or_remote_fails() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = GitConfig {
            enabled: true,
            repo_dir: temp.path().join("solutions"),
            ..GitConfig::default()
        };
        let sink = GitSink::new(&cfg, None, Layout::Dated, ".", "java");
        let err = sink
            .persist(&SolutionRecord {
                date: dec(10),
                title: "Two Sum",
                code: "class Solution {}",
            })
            .unwrap_err();
        assert!(matches!(err, SolveError::Persistence(_)));
    }

    fn init_checkout(repo: &Path) {
        fs::create_dir_all(repo).expect("repo dir");
        let status = Command::new("git")
            .args(["init", "-q"])
            .current_dir(repo)
            .status()
            .expect("git init");
        assert!(status.success());
    }

    fn git_config(repo: &Path, push: bool) -> GitConfig {
        GitConfig {
            enabled: true,
            repo_dir: repo.to_path_buf(),
            user_name: Some("Solver Bot".to_string()),
            user_email: Some("solver@example.com".to_string()),
            push,
            ..GitConfig::default()
        }
    }

    fn two_sum() -> SolutionRecord<'static> {
        SolutionRecord {
            date: dec(10),
            title: "Two Sum",
            code: "class Solution {}",
        }
    }

    #[test]
    fn git_sink_commits_into_local_checkout() {
        let temp = tempfile::tempdir().expect("tempdir");
        let repo = temp.path().join("solutions");
        init_checkout(&repo);

        let sink = GitSink::new(&git_config(&repo, false), None, Layout::Dated, ".", "java");
        let receipt = sink.persist(&two_sum()).expect("persist");
        assert!(receipt.committed);
        assert!(!receipt.pushed);
        assert_eq!(receipt.path, repo.join("leetcode-Dec10-25.java"));
        assert!(receipt.path.is_file());

        let subject = Git::new(&repo, Duration::from_secs(30))
            .head_subject()
            .expect("subject");
        assert_eq!(subject, "Add LeetCode solution: Two Sum (Dec 10)");
    }

    #[test]
    fn rejected_push_still_commits_locally() {
        let temp = tempfile::tempdir().expect("tempdir");
        let repo = temp.path().join("solutions");
        init_checkout(&repo);

        let sink = GitSink::new(&git_config(&repo, true), None, Layout::Monthly, "daily", "java");
        let receipt = sink.persist(&two_sum()).expect("push failure is not an error");
        assert!(receipt.committed);
        assert!(!receipt.pushed);
        assert!(repo.join("daily/Dec/Dec10.java").is_file());
    }

    #[test]
    fn failed_pull_still_saves_and_commits() {
        let temp = tempfile::tempdir().expect("tempdir");
        let repo = temp.path().join("solutions");
        init_checkout(&repo);

        let mut cfg = git_config(&repo, true);
        cfg.remote_url = Some(temp.path().join("missing-remote").display().to_string());
        let sink = GitSink::new(&cfg, None, Layout::Dated, ".", "java");
        let receipt = sink.persist(&two_sum()).expect("pull failure is not an error");
        assert!(receipt.committed);
        assert!(!receipt.pushed);
        assert!(repo.join("leetcode-Dec10-25.java").is_file());
    }
}
