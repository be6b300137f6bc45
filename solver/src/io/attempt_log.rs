//! Attempt artifacts under `.solver/attempts/<date>/<n>/`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::core::types::HandleSource;

#[derive(Debug, Clone, Serialize)]
pub struct AttemptMeta {
    pub attempt: u32,
    pub max_attempts: u32,
    pub slug: String,
    pub handle: Option<String>,
    pub handle_source: Option<HandleSource>,
    pub state: Option<String>,
    pub status: Option<String>,
    pub runtime: Option<String>,
    pub memory: Option<String>,
    /// Error kind when the attempt failed before a verdict.
    pub error: Option<String>,
    pub accepted: bool,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct AttemptPaths {
    pub dir: PathBuf,
    pub code_path: PathBuf,
    pub meta_path: PathBuf,
    pub feedback_path: PathBuf,
}

impl AttemptPaths {
    pub fn new(attempts_dir: &Path, date: NaiveDate, attempt: u32, ext: &str) -> Self {
        let dir = attempts_dir
            .join(date.format("%Y-%m-%d").to_string())
            .join(attempt.to_string());
        Self {
            code_path: dir.join(format!("code.{ext}")),
            meta_path: dir.join("meta.json"),
            feedback_path: dir.join("feedback.md"),
            dir,
        }
    }
}

pub struct AttemptWriteRequest<'a> {
    pub attempts_dir: &'a Path,
    pub date: NaiveDate,
    pub extension: &'a str,
    pub meta: &'a AttemptMeta,
    pub code: Option<&'a str>,
    pub feedback: Option<&'a str>,
}

pub fn write_attempt(request: &AttemptWriteRequest<'_>) -> Result<AttemptPaths> {
    let paths = AttemptPaths::new(
        request.attempts_dir,
        request.date,
        request.meta.attempt,
        request.extension,
    );
    fs::create_dir_all(&paths.dir)
        .with_context(|| format!("create attempt dir {}", paths.dir.display()))?;

    write_json(&paths.meta_path, request.meta)?;
    if let Some(code) = request.code {
        write_text(&paths.code_path, code)?;
    }
    if let Some(feedback) = request.feedback {
        write_text(&paths.feedback_path, &format!("{}\n", feedback.trim_end()))?;
    }
    Ok(paths)
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(value)?;
    buf.push('\n');
    write_text(path, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(attempt: u32) -> AttemptMeta {
        AttemptMeta {
            attempt,
            max_attempts: 5,
            slug: "two-sum".to_string(),
            handle: Some("42".to_string()),
            handle_source: Some(HandleSource::SubmissionId),
            state: Some("SUCCESS".to_string()),
            status: Some("Wrong Answer".to_string()),
            runtime: None,
            memory: None,
            error: None,
            accepted: false,
            duration_ms: 12,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 10).expect("date")
    }

    #[test]
    fn attempt_paths_are_stable() {
        let paths = AttemptPaths::new(Path::new(".solver/attempts"), date(), 3, "java");
        assert_eq!(paths.dir, PathBuf::from(".solver/attempts/2025-12-10/3"));
        assert!(paths.code_path.ends_with("code.java"));
        assert!(paths.meta_path.ends_with("meta.json"));
        assert!(paths.feedback_path.ends_with("feedback.md"));
    }

    #[test]
    fn writes_meta_code_and_feedback() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = write_attempt(&AttemptWriteRequest {
            attempts_dir: temp.path(),
            date: date(),
            extension: "java",
            meta: &meta(1),
            code: Some("class Solution {}"),
            feedback: Some("Status: Wrong Answer"),
        })
        .expect("write attempt");

        assert!(paths.code_path.is_file());
        let meta_json = fs::read_to_string(&paths.meta_path).expect("meta");
        assert!(meta_json.contains("\"handle_source\": \"submission_id\""));
        let feedback = fs::read_to_string(&paths.feedback_path).expect("feedback");
        assert_eq!(feedback, "Status: Wrong Answer\n");
    }

    #[test]
    fn accepted_attempt_has_no_feedback_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = write_attempt(&AttemptWriteRequest {
            attempts_dir: temp.path(),
            date: date(),
            extension: "java",
            meta: &AttemptMeta {
                accepted: true,
                ..meta(2)
            },
            code: Some("class Solution {}"),
            feedback: None,
        })
        .expect("write attempt");
        assert!(!paths.feedback_path.exists());
    }
}
