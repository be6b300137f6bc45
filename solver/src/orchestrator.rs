//! Retry loop: generate, submit, poll, and carry feedback into the next try.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use crate::core::backoff::Backoff;
use crate::core::feedback::FeedbackRecord;
use crate::core::types::{Attempt, FailureSummary, Problem, RunOutcome, SubmissionHandle, Verdict};
use crate::error::SolveError;
use crate::io::config::SolverConfig;
use crate::io::generator::{GenerationRequest, Generator};
use crate::io::judge::Judge;
use crate::io::poller::{PollPolicy, poll_verdict};

/// Budgets for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
    pub poll: PollPolicy,
}

impl From<&SolverConfig> for RetryPolicy {
    fn from(cfg: &SolverConfig) -> Self {
        Self {
            max_attempts: cfg.retry.max_attempts,
            backoff: cfg.retry.backoff(),
            poll: PollPolicy::from(&cfg.poll),
        }
    }
}

/// How far one attempt got.
#[derive(Debug)]
pub enum AttemptResult {
    GenerationFailed(SolveError),
    SubmissionFailed {
        code: String,
        error: SolveError,
    },
    /// The judge returned a verdict (possibly the synthetic timeout).
    Judged {
        code: String,
        handle: SubmissionHandle,
        verdict: Verdict,
    },
}

impl AttemptResult {
    pub fn code(&self) -> Option<&str> {
        match self {
            AttemptResult::GenerationFailed(_) => None,
            AttemptResult::SubmissionFailed { code, .. } | AttemptResult::Judged { code, .. } => {
                Some(code)
            }
        }
    }

    pub fn handle(&self) -> Option<&SubmissionHandle> {
        match self {
            AttemptResult::Judged { handle, .. } => Some(handle),
            _ => None,
        }
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            AttemptResult::Judged { verdict, .. } => Some(verdict),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&SolveError> {
        match self {
            AttemptResult::GenerationFailed(error)
            | AttemptResult::SubmissionFailed { error, .. } => Some(error),
            AttemptResult::Judged { .. } => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.verdict().is_some_and(Verdict::is_accepted)
    }

    fn feedback(&self, attempt: u32) -> Option<FeedbackRecord> {
        match self {
            AttemptResult::GenerationFailed(error)
            | AttemptResult::SubmissionFailed { error, .. } => {
                Some(FeedbackRecord::from_error(attempt, error))
            }
            AttemptResult::Judged { verdict, .. } if verdict.is_accepted() => None,
            AttemptResult::Judged { verdict, .. } => {
                Some(FeedbackRecord::from_verdict(attempt, verdict))
            }
        }
    }
}

/// Passed to the observer after every attempt.
#[derive(Debug)]
pub struct AttemptReport<'a> {
    pub index: u32,
    pub max_attempts: u32,
    pub result: &'a AttemptResult,
    /// Feedback derived from this attempt; `None` when it was accepted.
    pub feedback: Option<&'a FeedbackRecord>,
    pub elapsed: Duration,
}

/// Run up to `policy.max_attempts` attempts for `problem`.
///
/// Generation and submission errors count as failed attempts; only running
/// out of attempts ends the loop without an acceptance. `on_attempt` sees
/// every attempt before the backoff sleep.
#[instrument(skip_all, fields(slug = %problem.slug, max_attempts = policy.max_attempts))]
pub fn run_attempts<G, J, F>(
    problem: &Problem,
    generator: &G,
    judge: &J,
    policy: &RetryPolicy,
    mut on_attempt: F,
) -> RunOutcome
where
    G: Generator + ?Sized,
    J: Judge + ?Sized,
    F: FnMut(&AttemptReport<'_>),
{
    let mut feedback: Option<FeedbackRecord> = None;
    let mut failures = Vec::new();

    for index in 1..=policy.max_attempts {
        info!(attempt = index, max_attempts = policy.max_attempts, "attempt started");
        let started = Instant::now();
        let result = run_attempt(problem, generator, judge, &policy.poll, feedback.as_ref());
        let next = result.feedback(index);

        on_attempt(&AttemptReport {
            index,
            max_attempts: policy.max_attempts,
            result: &result,
            feedback: next.as_ref(),
            elapsed: started.elapsed(),
        });

        if let AttemptResult::Judged {
            code,
            handle,
            verdict,
        } = result
            && verdict.is_accepted()
        {
            info!(attempt = index, handle = %handle, "accepted");
            return RunOutcome::Accepted(Attempt {
                index,
                code,
                handle,
                verdict,
            });
        }

        if let Some(record) = next {
            warn!(attempt = index, feedback = %record.text, "attempt failed");
            failures.push(FailureSummary {
                attempt: index,
                feedback: record.text.clone(),
            });
            feedback = Some(record);
        }

        if index < policy.max_attempts {
            let delay = policy.backoff.delay(index);
            if !delay.is_zero() {
                info!(delay_secs = delay.as_secs(), "backing off before next attempt");
                thread::sleep(delay);
            }
        }
    }

    warn!(attempts = policy.max_attempts, "all attempts failed");
    RunOutcome::Exhausted(failures)
}

fn run_attempt<G, J>(
    problem: &Problem,
    generator: &G,
    judge: &J,
    poll: &PollPolicy,
    feedback: Option<&FeedbackRecord>,
) -> AttemptResult
where
    G: Generator + ?Sized,
    J: Judge + ?Sized,
{
    let request = GenerationRequest {
        statement: &problem.statement,
        template: &problem.template,
        feedback,
    };
    let code = match generator.generate(&request) {
        Ok(code) => code,
        Err(error) => return AttemptResult::GenerationFailed(error),
    };
    let handle = match judge.submit(problem, &code) {
        Ok(handle) => handle,
        Err(error) => return AttemptResult::SubmissionFailed { code, error },
    };
    let verdict = poll_verdict(judge, &handle, poll);
    info!(handle = %handle, status = %verdict.status_msg, "verdict received");
    AttemptResult::Judged {
        code,
        handle,
        verdict,
    }
}
