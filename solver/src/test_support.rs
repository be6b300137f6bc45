//! Scripted collaborators and fixtures for tests.
//!
//! Each fake replays a queue of canned results and records what it was asked.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::core::types::{HandleSource, Problem, SubmissionHandle, Verdict};
use crate::error::{SolveError, SolveResult};
use crate::io::generator::{GenerationRequest, Generator};
use crate::io::judge::{CodeSnippet, DailyQuestion, Judge};
use crate::io::notify::{Email, Notifier};
use crate::io::persist::{PersistReceipt, SolutionRecord, SolutionSink};

pub const SAMPLE_TEMPLATE: &str = "class Solution {\n    public int[] twoSum(int[] nums, int target) {\n        \n    }\n}";

/// Deterministic problem used across tests.
pub fn sample_problem() -> Problem {
    Problem {
        question_id: "1".to_string(),
        frontend_id: Some("1".to_string()),
        title: "Two Sum".to_string(),
        slug: "two-sum".to_string(),
        statement: "Given an array of integers nums and an integer target, return indices of the two numbers such that they add up to target.".to_string(),
        template: SAMPLE_TEMPLATE.to_string(),
        date: NaiveDate::from_ymd_opt(2025, 12, 10).expect("valid date"),
        difficulty: Some("Easy".to_string()),
        example_testcases: Some("[2,7,11,15]\n9".to_string()),
    }
}

/// Daily question as the judge would publish [`sample_problem`].
pub fn sample_daily() -> DailyQuestion {
    DailyQuestion {
        date: "2025-12-10".to_string(),
        question_id: "1".to_string(),
        question_frontend_id: Some("1".to_string()),
        title: "Two Sum".to_string(),
        title_slug: "two-sum".to_string(),
        content: Some("<p>Given an array of integers <code>nums</code> and an integer <code>target</code>, return indices of the two numbers such that they add up to <code>target</code>.</p>".to_string()),
        code_snippets: vec![CodeSnippet {
            lang: "Java".to_string(),
            lang_slug: Some("java".to_string()),
            code: SAMPLE_TEMPLATE.to_string(),
        }],
        example_testcases: Some("[2,7,11,15]\n9".to_string()),
        difficulty: Some("Easy".to_string()),
    }
}

/// Generator that replays scripted results.
pub struct ScriptedGenerator {
    results: RefCell<VecDeque<SolveResult<String>>>,
    fallback: Option<String>,
    feedback_seen: RefCell<Vec<Option<String>>>,
}

impl ScriptedGenerator {
    pub fn new(results: Vec<SolveResult<String>>) -> Self {
        Self {
            results: RefCell::new(results.into()),
            fallback: None,
            feedback_seen: RefCell::new(Vec::new()),
        }
    }

    /// Always returns `code`.
    pub fn repeating(code: &str) -> Self {
        Self {
            fallback: Some(code.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> u32 {
        self.feedback_seen.borrow().len() as u32
    }

    /// Feedback text passed with each call, in order.
    pub fn feedback_seen(&self) -> Vec<Option<String>> {
        self.feedback_seen.borrow().clone()
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&self, request: &GenerationRequest<'_>) -> SolveResult<String> {
        self.feedback_seen
            .borrow_mut()
            .push(request.feedback.map(|f| f.text.clone()));
        match self.results.borrow_mut().pop_front() {
            Some(result) => result,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| SolveError::Generation("script exhausted".to_string())),
        }
    }
}

/// Judge that replays scripted fetch, submit and check results.
///
/// Unscripted submits succeed with handles `1`, `2`, ...; unscripted checks fail.
pub struct ScriptedJudge {
    daily: RefCell<Option<SolveResult<DailyQuestion>>>,
    submits: RefCell<VecDeque<SolveResult<SubmissionHandle>>>,
    checks: RefCell<VecDeque<SolveResult<Verdict>>>,
    submitted: RefCell<Vec<String>>,
    check_count: Cell<u32>,
}

impl ScriptedJudge {
    pub fn new() -> Self {
        Self {
            daily: RefCell::new(None),
            submits: RefCell::new(VecDeque::new()),
            checks: RefCell::new(VecDeque::new()),
            submitted: RefCell::new(Vec::new()),
            check_count: Cell::new(0),
        }
    }

    pub fn with_daily(self, daily: SolveResult<DailyQuestion>) -> Self {
        *self.daily.borrow_mut() = Some(daily);
        self
    }

    pub fn with_submits(self, submits: Vec<SolveResult<SubmissionHandle>>) -> Self {
        *self.submits.borrow_mut() = submits.into();
        self
    }

    pub fn with_checks(self, checks: Vec<SolveResult<Verdict>>) -> Self {
        *self.checks.borrow_mut() = checks.into();
        self
    }

    /// Code of every submit call, in order.
    pub fn submitted(&self) -> Vec<String> {
        self.submitted.borrow().clone()
    }

    pub fn check_count(&self) -> u32 {
        self.check_count.get()
    }
}

impl Default for ScriptedJudge {
    fn default() -> Self {
        Self::new()
    }
}

impl Judge for ScriptedJudge {
    fn fetch_daily(&self) -> SolveResult<DailyQuestion> {
        self.daily
            .borrow_mut()
            .take()
            .unwrap_or_else(|| Ok(sample_daily()))
    }

    fn submit(&self, _problem: &Problem, code: &str) -> SolveResult<SubmissionHandle> {
        self.submitted.borrow_mut().push(code.to_string());
        let n = self.submitted.borrow().len();
        match self.submits.borrow_mut().pop_front() {
            Some(result) => result,
            None => Ok(SubmissionHandle::new(
                HandleSource::SubmissionId,
                n.to_string(),
            )),
        }
    }

    fn check(&self, _handle: &SubmissionHandle) -> SolveResult<Verdict> {
        self.check_count.set(self.check_count.get() + 1);
        self.checks
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(SolveError::Submission("no scripted check".to_string())))
    }
}

/// Notifier that records every email, optionally failing each send.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: RefCell<Vec<Email>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Every email handed to the notifier, including failed sends.
    pub fn sent(&self) -> Vec<Email> {
        self.sent.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, email: &Email) -> SolveResult<()> {
        self.sent.borrow_mut().push(email.clone());
        if self.fail {
            return Err(SolveError::Notification("smtp unavailable".to_string()));
        }
        Ok(())
    }
}

/// Sink that always fails.
#[derive(Default)]
pub struct FailingSink {
    calls: Cell<u32>,
}

impl FailingSink {
    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl SolutionSink for FailingSink {
    fn persist(&self, _record: &SolutionRecord<'_>) -> SolveResult<PersistReceipt> {
        self.calls.set(self.calls.get() + 1);
        Err(SolveError::Persistence("disk full".to_string()))
    }
}

/// Sink that records the code it was given and reports a fixed path.
#[derive(Default)]
pub struct MemorySink {
    saved: RefCell<Vec<String>>,
}

impl MemorySink {
    pub fn saved(&self) -> Vec<String> {
        self.saved.borrow().clone()
    }
}

impl SolutionSink for MemorySink {
    fn persist(&self, record: &SolutionRecord<'_>) -> SolveResult<PersistReceipt> {
        self.saved.borrow_mut().push(record.code.to_string());
        Ok(PersistReceipt {
            path: PathBuf::from(format!("memory/{}.java", record.date)),
            committed: false,
            pushed: false,
        })
    }
}
