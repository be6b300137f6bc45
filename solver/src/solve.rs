//! Run driver for `solver solve`.
//!
//! Wires the collaborators for one invocation: run-once guard, fetch,
//! orchestrate, persist, notify, and record the run state.

use std::path::Path;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use crate::core::types::{Problem, RunOutcome};
use crate::io::attempt_log::{AttemptMeta, AttemptWriteRequest, write_attempt};
use crate::io::config::SolverConfig;
use crate::io::generator::Generator;
use crate::io::init::SolverPaths;
use crate::io::judge::Judge;
use crate::io::notify::{Notifier, exhausted_email, send_best_effort, success_email};
use crate::io::persist::{PersistReceipt, SolutionRecord, SolutionSink};
use crate::io::run_state::{RunState, load_run_state, should_run, write_run_state};
use crate::orchestrator::{AttemptReport, RetryPolicy, run_attempts};

#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Ignore the run-once-per-day guard.
    pub force: bool,
    /// Local date the guard and run state use.
    pub today: NaiveDate,
}

/// Everything that happened in a run that reached the orchestrator.
#[derive(Debug, Clone)]
pub struct SolveSummary {
    pub problem: Problem,
    pub outcome: RunOutcome,
    /// `None` when not accepted or when persistence failed.
    pub receipt: Option<PersistReceipt>,
    pub notified: bool,
}

#[derive(Debug, Clone)]
pub enum SolveReport {
    /// Today's problem was already accepted; nothing was done.
    AlreadySolved { date: NaiveDate },
    Finished(Box<SolveSummary>),
}

/// Collaborators for one run.
pub struct Collaborators<'a, J: ?Sized, G: ?Sized, S: ?Sized, N: ?Sized> {
    pub judge: &'a J,
    pub generator: &'a G,
    pub sink: &'a S,
    pub notifier: &'a N,
}

/// Solve today's problem once.
///
/// A fetch failure aborts with an error (run state recorded as failed, no
/// email). Every run that reaches the orchestrator sends exactly one email;
/// persistence and notification failures are logged and never fail the run.
#[instrument(skip_all, fields(root = %root.display(), today = %options.today, force = options.force))]
pub fn run_solve<J, G, S, N>(
    root: &Path,
    cfg: &SolverConfig,
    collaborators: &Collaborators<'_, J, G, S, N>,
    options: &SolveOptions,
) -> Result<SolveReport>
where
    J: Judge + ?Sized,
    G: Generator + ?Sized,
    S: SolutionSink + ?Sized,
    N: Notifier + ?Sized,
{
    let paths = SolverPaths::new(root);

    if cfg.guard.run_once_per_day && !options.force {
        let state = match load_run_state(&paths.run_state_path) {
            Ok(state) => state,
            Err(err) => {
                warn!(err = %format!("{err:#}"), "ignoring unreadable run state");
                None
            }
        };
        if !should_run(state.as_ref(), options.today) {
            info!("already solved today, skipping");
            return Ok(SolveReport::AlreadySolved {
                date: options.today,
            });
        }
    }

    let problem = match collaborators
        .judge
        .fetch_daily()
        .and_then(|daily| daily.into_problem(&cfg.judge.snippet_lang))
    {
        Ok(problem) => problem,
        Err(err) => {
            record_run_state(&paths, options.today, false);
            return Err(anyhow!(err).context("fetch daily problem"));
        }
    };
    info!(
        title = %problem.title,
        slug = %problem.slug,
        question_id = %problem.question_id,
        date = %problem.date,
        "problem fetched"
    );

    let policy = RetryPolicy::from(cfg);
    let outcome = run_attempts(
        &problem,
        collaborators.generator,
        collaborators.judge,
        &policy,
        |report| write_attempt_artifacts(&paths, cfg, &problem, report),
    );

    let (receipt, email) = match &outcome {
        RunOutcome::Accepted(attempt) => {
            let record = SolutionRecord {
                date: problem.date,
                title: &problem.title,
                code: &attempt.code,
            };
            let receipt = match collaborators.sink.persist(&record) {
                Ok(receipt) => Some(receipt),
                Err(err) => {
                    warn!(err = %err, "solution not persisted");
                    None
                }
            };
            let email = success_email(&problem, attempt, receipt.as_ref());
            (receipt, email)
        }
        RunOutcome::Exhausted(failures) => (None, exhausted_email(&problem, failures)),
    };
    let notified = send_best_effort(collaborators.notifier, &email);

    record_run_state(&paths, options.today, outcome.is_accepted());

    Ok(SolveReport::Finished(Box::new(SolveSummary {
        problem,
        outcome,
        receipt,
        notified,
    })))
}

fn record_run_state(paths: &SolverPaths, today: NaiveDate, success: bool) {
    if let Err(err) = write_run_state(&paths.run_state_path, &RunState::new(today, success)) {
        warn!(err = %format!("{err:#}"), "run state not written");
    }
}

fn write_attempt_artifacts(
    paths: &SolverPaths,
    cfg: &SolverConfig,
    problem: &Problem,
    report: &AttemptReport<'_>,
) {
    let verdict = report.result.verdict();
    let handle = report.result.handle();
    let meta = AttemptMeta {
        attempt: report.index,
        max_attempts: report.max_attempts,
        slug: problem.slug.clone(),
        handle: handle.map(|h| h.id.clone()),
        handle_source: handle.map(|h| h.source),
        state: verdict.map(|v| v.state.clone()),
        status: verdict.map(|v| v.status_msg.clone()),
        runtime: verdict.and_then(|v| v.runtime.clone()),
        memory: verdict.and_then(|v| v.memory.clone()),
        error: report.result.error().map(|e| e.kind().to_string()),
        accepted: report.result.is_accepted(),
        duration_ms: u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
    };
    let request = AttemptWriteRequest {
        attempts_dir: &paths.attempts_dir,
        date: problem.date,
        extension: &cfg.judge.extension,
        meta: &meta,
        code: report.result.code(),
        feedback: report.feedback.map(|f| f.text.as_str()),
    };
    if let Err(err) = write_attempt(&request) {
        warn!(err = %format!("{err:#}"), attempt = report.index, "attempt artifacts not written");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{STATE_SUCCESS, STATUS_ACCEPTED, Verdict};
    use crate::test_support::{MemorySink, RecordingNotifier, ScriptedGenerator, ScriptedJudge};

    fn accepted() -> Verdict {
        Verdict {
            state: STATE_SUCCESS.to_string(),
            status_msg: STATUS_ACCEPTED.to_string(),
            ..Verdict::default()
        }
    }

    fn options(force: bool) -> SolveOptions {
        SolveOptions {
            force,
            today: NaiveDate::from_ymd_opt(2025, 12, 10).expect("date"),
        }
    }

    fn fast_config() -> SolverConfig {
        let mut cfg = SolverConfig::default();
        cfg.retry.backoff_secs = 0;
        cfg.poll.interval_secs = 0;
        cfg.poll.max_polls = 2;
        cfg
    }

    #[test]
    fn guard_skips_after_success_unless_forced() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = SolverPaths::new(temp.path());
        write_run_state(&paths.run_state_path, &RunState::new(options(false).today, true))
            .expect("state");

        let judge = ScriptedJudge::new();
        let generator = ScriptedGenerator::repeating("class Solution {}");
        let sink = MemorySink::default();
        let notifier = RecordingNotifier::new();
        let collaborators = Collaborators {
            judge: &judge,
            generator: &generator,
            sink: &sink,
            notifier: &notifier,
        };

        let report =
            run_solve(temp.path(), &fast_config(), &collaborators, &options(false)).expect("run");
        assert!(matches!(report, SolveReport::AlreadySolved { .. }));
        assert_eq!(generator.calls(), 0);

        let judge = ScriptedJudge::new().with_checks(vec![Ok(accepted())]);
        let collaborators = Collaborators {
            judge: &judge,
            ..collaborators
        };
        let report =
            run_solve(temp.path(), &fast_config(), &collaborators, &options(true)).expect("run");
        assert!(matches!(report, SolveReport::Finished(_)));
        assert_eq!(generator.calls(), 1);
    }

    #[test]
    fn attempt_artifacts_are_written() {
        let temp = tempfile::tempdir().expect("tempdir");
        let judge = ScriptedJudge::new().with_checks(vec![Ok(accepted())]);
        let generator = ScriptedGenerator::repeating("class Solution {}");
        let sink = MemorySink::default();
        let notifier = RecordingNotifier::new();
        let collaborators = Collaborators {
            judge: &judge,
            generator: &generator,
            sink: &sink,
            notifier: &notifier,
        };
        run_solve(temp.path(), &fast_config(), &collaborators, &options(false)).expect("run");

        let dir = SolverPaths::new(temp.path())
            .attempts_dir
            .join("2025-12-10")
            .join("1");
        assert!(dir.join("code.java").is_file());
        assert!(dir.join("meta.json").is_file());
        assert!(!dir.join("feedback.md").exists());
    }
}
