//! Feedback carried from one failed attempt into the next prompt.

use crate::core::types::{STATUS_TIME_LIMIT, STATUS_WRONG_ANSWER, Verdict};
use crate::error::SolveError;

const ERROR_LIMIT_CHARS: usize = 500;
const TESTCASE_LIMIT_CHARS: usize = 200;
const OUTPUT_LIMIT_CHARS: usize = 100;

/// Summary of why the previous attempt failed.
///
/// Only ever built from the attempt immediately before the one that reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRecord {
    /// Attempt the feedback was derived from.
    pub attempt: u32,
    pub text: String,
}

impl FeedbackRecord {
    /// Build feedback from a non-accepted verdict.
    pub fn from_verdict(attempt: u32, verdict: &Verdict) -> Self {
        let mut lines = vec![format!("Status: {}", verdict.status_msg)];

        if verdict.is_timeout() {
            lines.push("The judge did not return a verdict within the polling window.".to_string());
        }
        if let Some(err) = non_empty(verdict.runtime_error.as_deref()) {
            lines.push(format!(
                "Runtime Error: {}",
                truncate_chars(err, ERROR_LIMIT_CHARS)
            ));
        }
        if let Some(err) = non_empty(verdict.compile_error.as_deref()) {
            lines.push(format!(
                "Compile Error: {}",
                truncate_chars(err, ERROR_LIMIT_CHARS)
            ));
        }
        if let Some(counts) = verdict.test_counts() {
            if verdict.status_msg == STATUS_TIME_LIMIT {
                lines.push(format!("Time Limit Exceeded after {counts} test cases"));
                lines.push(
                    "You need a MORE EFFICIENT algorithm with better time complexity!"
                        .to_string(),
                );
            } else {
                lines.push(format!("Passed {counts} test cases"));
            }
        }
        if let Some(case) = non_empty(verdict.last_testcase.as_deref()) {
            lines.push(format!(
                "Failed on test case: {}",
                truncate_chars(case, TESTCASE_LIMIT_CHARS)
            ));
        }
        if verdict.status_msg == STATUS_WRONG_ANSWER
            && let (Some(actual), Some(expected)) = (
                verdict.code_output.as_deref(),
                verdict.expected_output.as_deref(),
            )
        {
            lines.push(format!(
                "Your output: {}",
                truncate_chars(actual, OUTPUT_LIMIT_CHARS)
            ));
            lines.push(format!(
                "Expected: {}",
                truncate_chars(expected, OUTPUT_LIMIT_CHARS)
            ));
        }

        Self {
            attempt,
            text: lines.join("\n"),
        }
    }

    /// Build feedback from an attempt that failed before producing a verdict.
    pub fn from_error(attempt: u32, err: &SolveError) -> Self {
        let full = err.to_string();
        let detail = truncate_chars(&full, ERROR_LIMIT_CHARS);
        let text = match err {
            SolveError::Generation(_) => format!("Code generation failed: {detail}"),
            _ => format!("Submission failed with error: {detail}"),
        };
        Self { attempt, text }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Truncate on a char boundary.
pub fn truncate_chars(value: &str, limit: usize) -> &str {
    match value.char_indices().nth(limit) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::STATE_SUCCESS;

    fn finished(status: &str) -> Verdict {
        Verdict {
            state: STATE_SUCCESS.to_string(),
            status_msg: status.to_string(),
            ..Verdict::default()
        }
    }

    #[test]
    fn wrong_answer_includes_counts_and_status() {
        let verdict = Verdict {
            total_correct: Some(3),
            total_testcases: Some(10),
            ..finished("Wrong Answer")
        };
        let feedback = FeedbackRecord::from_verdict(1, &verdict);
        assert!(feedback.text.contains("Wrong Answer"));
        assert!(feedback.text.contains("3/10"));
        assert_eq!(feedback.attempt, 1);
    }

    #[test]
    fn wrong_answer_includes_diff_when_both_outputs_present() {
        let verdict = Verdict {
            last_testcase: Some("[1,2,3]".to_string()),
            code_output: Some("5".to_string()),
            expected_output: Some("6".to_string()),
            ..finished("Wrong Answer")
        };
        let text = FeedbackRecord::from_verdict(2, &verdict).text;
        assert!(text.contains("Failed on test case: [1,2,3]"));
        assert!(text.contains("Your output: 5"));
        assert!(text.contains("Expected: 6"));
    }

    #[test]
    fn time_limit_asks_for_faster_algorithm() {
        let verdict = Verdict {
            total_correct: Some(40),
            total_testcases: Some(57),
            ..finished("Time Limit Exceeded")
        };
        let text = FeedbackRecord::from_verdict(1, &verdict).text;
        assert!(text.contains("Time Limit Exceeded after 40/57 test cases"));
        assert!(text.contains("MORE EFFICIENT"));
    }

    #[test]
    fn compile_error_is_truncated() {
        let verdict = Verdict {
            compile_error: Some("x".repeat(2_000)),
            ..finished("Compile Error")
        };
        let text = FeedbackRecord::from_verdict(1, &verdict).text;
        let line = text
            .lines()
            .find(|line| line.starts_with("Compile Error: "))
            .expect("compile error line");
        assert_eq!(line.len(), "Compile Error: ".len() + ERROR_LIMIT_CHARS);
    }

    #[test]
    fn timeout_verdict_explains_missing_result() {
        let text = FeedbackRecord::from_verdict(3, &Verdict::timeout()).text;
        assert!(text.starts_with("Status: Timeout"));
        assert!(text.contains("polling window"));
    }

    #[test]
    fn error_feedback_names_the_failure() {
        let err = SolveError::Submission("HTTP 403".to_string());
        let feedback = FeedbackRecord::from_error(4, &err);
        assert_eq!(
            feedback.text,
            "Submission failed with error: submission failed: HTTP 403"
        );

        let err = SolveError::Generation("empty response".to_string());
        let feedback = FeedbackRecord::from_error(4, &err);
        assert!(feedback.text.starts_with("Code generation failed"));
    }

    #[test]
    fn long_error_detail_is_truncated() {
        let err = SolveError::Submission("e".repeat(2_000));
        let text = FeedbackRecord::from_error(1, &err).text;
        let detail = text
            .strip_prefix("Submission failed with error: ")
            .expect("prefix");
        assert_eq!(detail.chars().count(), ERROR_LIMIT_CHARS);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
