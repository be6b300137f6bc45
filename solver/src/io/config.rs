//! Solver configuration stored under `.solver/config.toml`, plus secrets from
//! the environment.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::backoff::{Backoff, BackoffKind};

/// Solver configuration (TOML).
///
/// Missing fields fall back to the defaults below, so an empty file is valid.
/// Credentials never live here; see [`Secrets`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SolverConfig {
    pub judge: JudgeConfig,
    pub model: ModelConfig,
    pub retry: RetryConfig,
    pub poll: PollConfig,
    pub persist: PersistConfig,
    pub mail: MailConfig,
    pub guard: GuardConfig,
}

/// What the judge receives as `question_id` on submit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuestionRef {
    /// Numeric backend id.
    Id,
    /// Problem slug.
    Slug,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JudgeConfig {
    pub base_url: String,
    /// Language slug sent on submit (e.g. `java`).
    pub lang: String,
    /// Language name as it appears in the code snippets (e.g. `Java`).
    pub snippet_lang: String,
    /// File extension for saved solutions.
    pub extension: String,
    pub question_ref: QuestionRef,
    /// Optional HTTP(S) proxy for all judge traffic.
    pub proxy: Option<String>,
    pub timeout_secs: u64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://leetcode.com".to_string(),
            lang: "java".to_string(),
            snippet_lang: "Java".to_string(),
            extension: "java".to_string(),
            question_ref: QuestionRef::Id,
            proxy: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub endpoint: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gemini-2.5-pro".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.9,
            max_output_tokens: 32_768,
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff: BackoffKind,
    pub backoff_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: BackoffKind::Fixed,
            backoff_secs: 10,
        }
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> Backoff {
        Backoff {
            kind: self.backoff,
            base: Duration::from_secs(self.backoff_secs),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollConfig {
    pub interval_secs: u64,
    pub max_polls: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 2,
            max_polls: 30,
        }
    }
}

/// File naming scheme for accepted solutions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// `<base>/<Mon>/<Mon><DD>.<ext>`
    Monthly,
    /// `<base>/leetcode-<Mon><DD>-<YY>.<ext>`
    Dated,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PersistConfig {
    pub layout: Layout,
    /// Directory (relative to the repo dir, or the project root without git).
    pub base_dir: PathBuf,
    pub git: GitConfig,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            layout: Layout::Monthly,
            base_dir: PathBuf::from("leetcode_daily"),
            git: GitConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GitConfig {
    pub enabled: bool,
    /// Clone source when `repo_dir` does not exist yet.
    pub remote_url: Option<String>,
    /// Working copy that receives solutions.
    pub repo_dir: PathBuf,
    /// Env var holding a token injected into https remote URLs.
    pub token_env: String,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub push: bool,
    pub timeout_secs: u64,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            remote_url: None,
            repo_dir: PathBuf::from("solutions"),
            token_env: "GH_PAT".to_string(),
            user_name: None,
            user_email: None,
            push: true,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MailConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GuardConfig {
    /// Skip the run when today's problem was already accepted.
    pub run_once_per_day: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            run_once_per_day: true,
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            judge: JudgeConfig::default(),
            model: ModelConfig::default(),
            retry: RetryConfig::default(),
            poll: PollConfig::default(),
            persist: PersistConfig::default(),
            mail: MailConfig::default(),
            guard: GuardConfig::default(),
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(anyhow!("retry.max_attempts must be > 0"));
        }
        if self.poll.max_polls == 0 {
            return Err(anyhow!("poll.max_polls must be > 0"));
        }
        if self.judge.base_url.trim().is_empty() {
            return Err(anyhow!("judge.base_url must be set"));
        }
        if self.judge.lang.trim().is_empty() || self.judge.snippet_lang.trim().is_empty() {
            return Err(anyhow!("judge.lang and judge.snippet_lang must be set"));
        }
        if self.judge.timeout_secs == 0 || self.model.timeout_secs == 0 {
            return Err(anyhow!("judge.timeout_secs and model.timeout_secs must be > 0"));
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(anyhow!("model.temperature must be within 0.0..=2.0"));
        }
        if self.model.max_output_tokens == 0 {
            return Err(anyhow!("model.max_output_tokens must be > 0"));
        }
        if self.persist.git.enabled && self.persist.git.timeout_secs == 0 {
            return Err(anyhow!("persist.git.timeout_secs must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SolverConfig::default()`.
pub fn load_config(path: &Path) -> Result<SolverConfig> {
    if !path.exists() {
        let cfg = SolverConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SolverConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &SolverConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

/// SMTP login and addressing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSecrets {
    pub user: String,
    pub password: String,
    pub to: String,
}

/// Credentials read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Secrets {
    pub leetcode_session: String,
    pub leetcode_csrf: Option<String>,
    pub gemini_api_key: String,
    pub mail: Option<MailSecrets>,
    pub git_token: Option<String>,
}

impl Secrets {
    /// Gather secrets from the process environment.
    pub fn from_env(cfg: &SolverConfig) -> Result<Self> {
        Self::from_lookup(cfg, |key| env::var(key).ok())
    }

    /// Gather secrets through `lookup`, treating empty values as unset.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(cfg: &SolverConfig, lookup: F) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let leetcode_session = get("LEETCODE_SESSION")
            .ok_or_else(|| anyhow!("LEETCODE_SESSION is not set"))?;
        let gemini_api_key =
            get("GEMINI_API_KEY").ok_or_else(|| anyhow!("GEMINI_API_KEY is not set"))?;
        let mail = match (get("EMAIL_USER"), get("EMAIL_PASS"), get("EMAIL_TO")) {
            (Some(user), Some(password), Some(to)) => Some(MailSecrets { user, password, to }),
            _ => None,
        };
        Ok(Self {
            leetcode_session,
            leetcode_csrf: get("LEETCODE_CSRF"),
            gemini_api_key,
            mail,
            git_token: get(&cfg.persist.git.token_env),
        })
    }

    /// Judge credentials only, for commands that never call the model.
    pub fn judge_from_env() -> Result<Self> {
        let get = |key: &str| env::var(key).ok().filter(|v| !v.trim().is_empty());
        Ok(Self {
            leetcode_session: get("LEETCODE_SESSION")
                .ok_or_else(|| anyhow!("LEETCODE_SESSION is not set"))?,
            leetcode_csrf: get("LEETCODE_CSRF"),
            ..Self::default()
        })
    }
}

/// Apply `SMTP_HOST` / `SMTP_PORT` overrides from the environment.
pub fn apply_env_overrides(cfg: &mut SolverConfig) -> Result<()> {
    if let Ok(host) = env::var("SMTP_HOST")
        && !host.trim().is_empty()
    {
        cfg.mail.smtp_host = host;
    }
    if let Ok(port) = env::var("SMTP_PORT")
        && !port.trim().is_empty()
    {
        cfg.mail.smtp_port = port
            .trim()
            .parse()
            .with_context(|| format!("parse SMTP_PORT '{port}'"))?;
    }
    Ok(())
}
