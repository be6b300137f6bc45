//! Verdict polling with a fixed interval and a bounded number of checks.

use std::thread;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::core::types::{SubmissionHandle, Verdict};
use crate::error::SolveError;
use crate::io::config::PollConfig;
use crate::io::judge::Judge;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_polls: u32,
}

impl From<&PollConfig> for PollPolicy {
    fn from(cfg: &PollConfig) -> Self {
        Self {
            interval: Duration::from_secs(cfg.interval_secs),
            max_polls: cfg.max_polls,
        }
    }
}

/// Poll until the judge reports a finished verdict.
///
/// Check errors are logged and polling continues. When the budget runs out a
/// synthetic [`Verdict::timeout`] is returned; this never fails.
#[instrument(skip_all, fields(handle = %handle, max_polls = policy.max_polls))]
pub fn poll_verdict<J: Judge + ?Sized>(
    judge: &J,
    handle: &SubmissionHandle,
    policy: &PollPolicy,
) -> Verdict {
    for poll in 1..=policy.max_polls {
        match judge.check(handle) {
            Ok(verdict) if verdict.is_complete() => {
                debug!(poll, status = %verdict.status_msg, "verdict ready");
                return verdict;
            }
            Ok(verdict) => debug!(poll, state = %verdict.state, "verdict pending"),
            Err(err) => warn!(poll, err = %err, "verdict check failed"),
        }
        if poll < policy.max_polls && !policy.interval.is_zero() {
            thread::sleep(policy.interval);
        }
    }
    let err = SolveError::PollTimeout {
        polls: policy.max_polls,
    };
    warn!(err = %err, "giving up on verdict");
    Verdict::timeout()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{HandleSource, STATE_SUCCESS, STATUS_ACCEPTED};
    use crate::test_support::ScriptedJudge;

    fn policy(max_polls: u32) -> PollPolicy {
        PollPolicy {
            interval: Duration::ZERO,
            max_polls,
        }
    }

    fn pending() -> Verdict {
        Verdict {
            state: "PENDING".to_string(),
            ..Verdict::default()
        }
    }

    fn accepted() -> Verdict {
        Verdict {
            state: STATE_SUCCESS.to_string(),
            status_msg: STATUS_ACCEPTED.to_string(),
            ..Verdict::default()
        }
    }

    #[test]
    fn returns_first_complete_verdict() {
        let judge = ScriptedJudge::new()
            .with_checks(vec![Ok(pending()), Ok(pending()), Ok(accepted())]);
        let handle = SubmissionHandle::new(HandleSource::SubmissionId, "1");
        let verdict = poll_verdict(&judge, &handle, &policy(5));
        assert!(verdict.is_accepted());
        assert_eq!(judge.check_count(), 3);
    }

    #[test]
    fn check_errors_are_retried() {
        let judge = ScriptedJudge::new().with_checks(vec![
            Err(SolveError::Submission("HTTP 502".to_string())),
            Ok(accepted()),
        ]);
        let handle = SubmissionHandle::new(HandleSource::SubmissionId, "1");
        assert!(poll_verdict(&judge, &handle, &policy(3)).is_accepted());
    }

    #[test]
    fn exhausted_budget_yields_timeout_verdict() {
        let judge = ScriptedJudge::new().with_checks((0..4).map(|_| Ok(pending())).collect());
        let handle = SubmissionHandle::new(HandleSource::SubmissionId, "1");
        let verdict = poll_verdict(&judge, &handle, &policy(4));
        assert!(verdict.is_timeout());
        assert_eq!(judge.check_count(), 4);
    }
}
