//! Shared types for one solve run.
//!
//! These are plain data: built by the judge/generator adapters, consumed by the
//! orchestrator and the run driver.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Today's problem. Created once per run and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    /// Backend question id (numeric, as a string).
    pub question_id: String,
    /// Id shown on the problem page.
    pub frontend_id: Option<String>,
    pub title: String,
    pub slug: String,
    /// Plain-text statement (already normalized from markup).
    pub statement: String,
    /// Code template for the configured language.
    pub template: String,
    /// Publication date of the daily challenge.
    pub date: NaiveDate,
    pub difficulty: Option<String>,
    pub example_testcases: Option<String>,
}

/// Which response field the handle was read from.
///
/// Listed in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleSource {
    SubmissionId,
    InterpretId,
    Mutation,
}

/// Opaque reference to a submission, used for polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionHandle {
    pub source: HandleSource,
    pub id: String,
}

impl SubmissionHandle {
    pub fn new(source: HandleSource, id: impl Into<String>) -> Self {
        Self {
            source,
            id: id.into(),
        }
    }
}

impl fmt::Display for SubmissionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Judge state marker for a finished check.
pub const STATE_SUCCESS: &str = "SUCCESS";
/// Synthetic state produced by the poller when the budget runs out.
pub const STATE_TIMEOUT: &str = "TIMEOUT";
pub const STATUS_ACCEPTED: &str = "Accepted";
pub const STATUS_WRONG_ANSWER: &str = "Wrong Answer";
pub const STATUS_TIME_LIMIT: &str = "Time Limit Exceeded";
pub const STATUS_TIMEOUT: &str = "Timeout";

/// Result of checking a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Judge state marker (`SUCCESS`, `PENDING`, `STARTED`, `TIMEOUT`, ...).
    pub state: String,
    /// Human status (`Accepted`, `Wrong Answer`, ...).
    pub status_msg: String,
    pub runtime: Option<String>,
    pub memory: Option<String>,
    pub compile_error: Option<String>,
    pub runtime_error: Option<String>,
    pub last_testcase: Option<String>,
    pub code_output: Option<String>,
    pub expected_output: Option<String>,
    pub total_correct: Option<u64>,
    pub total_testcases: Option<u64>,
}

impl Verdict {
    /// Synthetic verdict for a check that never completed.
    pub fn timeout() -> Self {
        Self {
            state: STATE_TIMEOUT.to_string(),
            status_msg: STATUS_TIMEOUT.to_string(),
            ..Self::default()
        }
    }

    /// True once the judge has finished grading.
    pub fn is_complete(&self) -> bool {
        self.state == STATE_SUCCESS
    }

    pub fn is_accepted(&self) -> bool {
        self.is_complete() && self.status_msg == STATUS_ACCEPTED
    }

    pub fn is_timeout(&self) -> bool {
        self.state == STATE_TIMEOUT
    }

    /// `passed/total` when the judge reported test counts.
    pub fn test_counts(&self) -> Option<String> {
        let total = self.total_testcases?;
        Some(format!("{}/{}", self.total_correct.unwrap_or(0), total))
    }
}

/// One generate/submit/poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// 1-based attempt number.
    pub index: u32,
    pub code: String,
    pub handle: SubmissionHandle,
    pub verdict: Verdict,
}

/// Feedback text recorded for a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureSummary {
    pub attempt: u32,
    pub feedback: String,
}

/// Terminal state of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Accepted(Attempt),
    Exhausted(Vec<FailureSummary>),
}

impl RunOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, RunOutcome::Accepted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_requires_success_state() {
        let verdict = Verdict {
            state: "PENDING".to_string(),
            status_msg: STATUS_ACCEPTED.to_string(),
            ..Verdict::default()
        };
        assert!(!verdict.is_accepted());

        let verdict = Verdict {
            state: STATE_SUCCESS.to_string(),
            ..verdict
        };
        assert!(verdict.is_accepted());
    }

    #[test]
    fn timeout_verdict_is_not_complete() {
        let verdict = Verdict::timeout();
        assert!(verdict.is_timeout());
        assert!(!verdict.is_complete());
        assert!(!verdict.is_accepted());
    }

    #[test]
    fn test_counts_default_passed_to_zero() {
        let verdict = Verdict {
            total_testcases: Some(12),
            ..Verdict::default()
        };
        assert_eq!(verdict.test_counts().as_deref(), Some("0/12"));
        assert_eq!(Verdict::default().test_counts(), None);
    }
}
