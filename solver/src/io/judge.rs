//! Judge adapter: daily problem query, submission and verdict checks.
//!
//! The [`Judge`] trait is the seam the orchestrator depends on. Tests use
//! scripted judges; [`LeetCodeJudge`] talks to the real site through a
//! [`JudgeSession`].

use chrono::NaiveDate;
use reqwest::blocking::Client;
use reqwest::header::REFERER;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::core::feedback::truncate_chars;
use crate::core::normalize::html_to_text;
use crate::core::types::{HandleSource, Problem, SubmissionHandle, Verdict};
use crate::error::{SolveError, SolveResult};
use crate::io::config::{JudgeConfig, QuestionRef};
use crate::io::session::JudgeSession;

const DAILY_QUERY: &str = r#"
query questionOfToday {
  activeDailyCodingChallengeQuestion {
    date
    question {
      questionId
      questionFrontendId
      title
      titleSlug
      content
      codeSnippets {
        lang
        langSlug
        code
      }
      exampleTestcases
      difficulty
    }
  }
}
"#;

const BODY_SNIPPET_CHARS: usize = 500;

/// Abstraction over the judging platform.
pub trait Judge {
    /// Fetch today's problem as published (statement still in markup).
    fn fetch_daily(&self) -> SolveResult<DailyQuestion>;

    /// Create a new graded submission. Never idempotent.
    fn submit(&self, problem: &Problem, code: &str) -> SolveResult<SubmissionHandle>;

    /// Check a submission once.
    fn check(&self, handle: &SubmissionHandle) -> SolveResult<Verdict>;
}

/// Code template for one language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSnippet {
    pub lang: String,
    #[serde(default)]
    pub lang_slug: Option<String>,
    pub code: String,
}

/// Daily problem exactly as the judge returns it.
///
/// `date` lives on the enclosing challenge entry and is filled in by
/// [`parse_daily_response`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyQuestion {
    #[serde(default)]
    pub date: String,
    pub question_id: String,
    #[serde(default)]
    pub question_frontend_id: Option<String>,
    pub title: String,
    pub title_slug: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub code_snippets: Vec<CodeSnippet>,
    #[serde(default)]
    pub example_testcases: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

impl DailyQuestion {
    /// Normalize the statement and pick the template for `snippet_lang`.
    pub fn into_problem(self, snippet_lang: &str) -> SolveResult<Problem> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|e| SolveError::Fetch(format!("invalid date '{}': {e}", self.date)))?;
        let template = self
            .code_snippets
            .iter()
            .find(|snippet| snippet.lang == snippet_lang)
            .map(|snippet| snippet.code.clone())
            .ok_or_else(|| {
                SolveError::Fetch(format!(
                    "no {snippet_lang} template for '{}'",
                    self.title_slug
                ))
            })?;
        let statement = html_to_text(self.content.as_deref().unwrap_or_default());
        if statement.is_empty() {
            return Err(SolveError::Fetch(format!(
                "empty statement for '{}' (premium problem or expired session?)",
                self.title_slug
            )));
        }
        Ok(Problem {
            question_id: self.question_id,
            frontend_id: self.question_frontend_id,
            title: self.title,
            slug: self.title_slug,
            statement,
            template,
            date,
            difficulty: self.difficulty,
            example_testcases: self.example_testcases,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<DailyData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyData {
    active_daily_coding_challenge_question: Option<DailyEntry>,
}

#[derive(Debug, Deserialize)]
struct DailyEntry {
    date: String,
    question: DailyQuestion,
}

/// Parse the GraphQL `questionOfToday` response body.
pub fn parse_daily_response(body: &str) -> SolveResult<DailyQuestion> {
    let response: GraphQlResponse = serde_json::from_str(body)
        .map_err(|e| SolveError::Fetch(format!("parse daily response: {e}")))?;
    if !response.errors.is_empty() {
        let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
        return Err(SolveError::Fetch(format!(
            "graphql errors: {}",
            messages.join("; ")
        )));
    }
    let entry = response
        .data
        .and_then(|data| data.active_daily_coding_challenge_question)
        .ok_or_else(|| SolveError::Fetch("no active daily question".to_string()))?;
    Ok(DailyQuestion {
        date: entry.date,
        ..entry.question
    })
}

/// Read the submission handle from a submit response.
///
/// Precedence: top-level `submission_id`, then top-level `interpret_id`, then
/// a mutation result `data.<field>.submissionId` (or `submission_id`), with
/// `data` fields visited in key order. Numbers and strings are both accepted.
pub fn parse_submit_response(body: &Value) -> SolveResult<SubmissionHandle> {
    if let Some(id) = id_field(body, "submission_id") {
        return Ok(SubmissionHandle::new(HandleSource::SubmissionId, id));
    }
    if let Some(id) = id_field(body, "interpret_id") {
        return Ok(SubmissionHandle::new(HandleSource::InterpretId, id));
    }
    if let Some(data) = body.get("data").and_then(Value::as_object) {
        for result in data.values() {
            if let Some(id) =
                id_field(result, "submissionId").or_else(|| id_field(result, "submission_id"))
            {
                return Ok(SubmissionHandle::new(HandleSource::Mutation, id));
            }
        }
    }
    Err(SolveError::Submission(format!(
        "no submission handle in response: {}",
        truncate_chars(&body.to_string(), BODY_SNIPPET_CHARS)
    )))
}

fn id_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Build a [`Verdict`] from a check response.
///
/// Missing fields stay `None`; the `full_*` error fields win over the short ones.
pub fn parse_check_response(body: &Value) -> Verdict {
    Verdict {
        state: text_field(body, "state").unwrap_or_else(|| "UNKNOWN".to_string()),
        status_msg: text_field(body, "status_msg").unwrap_or_else(|| "Unknown".to_string()),
        runtime: text_field(body, "status_runtime"),
        memory: text_field(body, "status_memory"),
        compile_error: text_field(body, "full_compile_error")
            .or_else(|| text_field(body, "compile_error")),
        runtime_error: text_field(body, "full_runtime_error")
            .or_else(|| text_field(body, "runtime_error")),
        last_testcase: text_field(body, "last_testcase"),
        code_output: text_field(body, "code_output"),
        expected_output: text_field(body, "expected_output"),
        total_correct: count_field(body, "total_correct"),
        total_testcases: count_field(body, "total_testcases"),
    }
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) if !items.is_empty() => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        _ => None,
    }
}

fn count_field(value: &Value, key: &str) -> Option<u64> {
    match value.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Judge client for leetcode.com.
pub struct LeetCodeJudge {
    session: JudgeSession,
    client: Client,
    lang: String,
    question_ref: QuestionRef,
}

impl LeetCodeJudge {
    pub fn new(session: JudgeSession, cfg: &JudgeConfig) -> anyhow::Result<Self> {
        let client = session.build_client()?;
        Ok(Self {
            session,
            client,
            lang: cfg.lang.clone(),
            question_ref: cfg.question_ref,
        })
    }

    fn question_ref_value(&self, problem: &Problem) -> String {
        match self.question_ref {
            QuestionRef::Id => problem.question_id.clone(),
            QuestionRef::Slug => problem.slug.clone(),
        }
    }
}

impl Judge for LeetCodeJudge {
    #[instrument(skip_all)]
    fn fetch_daily(&self) -> SolveResult<DailyQuestion> {
        let url = format!("{}/graphql", self.session.base_url);
        info!(%url, "fetching daily challenge");
        let response = self
            .client
            .post(&url)
            .json(&json!({ "query": DAILY_QUERY }))
            .send()
            .map_err(|e| SolveError::Fetch(format!("request {url}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SolveError::Fetch(format!("HTTP {status} from {url}")));
        }
        let body = response
            .text()
            .map_err(|e| SolveError::Fetch(format!("read daily response: {e}")))?;
        parse_daily_response(&body)
    }

    #[instrument(skip_all, fields(slug = %problem.slug))]
    fn submit(&self, problem: &Problem, code: &str) -> SolveResult<SubmissionHandle> {
        let url = format!("{}/problems/{}/submit/", self.session.base_url, problem.slug);
        let referer = format!(
            "{}/problems/{}/description/",
            self.session.base_url, problem.slug
        );
        let payload = json!({
            "lang": self.lang,
            "question_id": self.question_ref_value(problem),
            "typed_code": code,
        });
        debug!(%url, code_len = code.len(), "submitting solution");
        let response = self
            .client
            .post(&url)
            .header(REFERER, referer)
            .json(&payload)
            .send()
            .map_err(|e| SolveError::Submission(format!("request {url}: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| SolveError::Submission(format!("read submit response: {e}")))?;
        if !status.is_success() {
            warn!(%status, "submit rejected");
            return Err(SolveError::Submission(format!(
                "HTTP {status} - {}",
                truncate_chars(&body, BODY_SNIPPET_CHARS)
            )));
        }
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| SolveError::Submission(format!("parse submit response: {e}")))?;
        let handle = parse_submit_response(&value)?;
        info!(handle = %handle, source = ?handle.source, "submission created");
        Ok(handle)
    }

    fn check(&self, handle: &SubmissionHandle) -> SolveResult<Verdict> {
        let url = format!(
            "{}/submissions/detail/{}/check/",
            self.session.base_url, handle.id
        );
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| SolveError::Submission(format!("request {url}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SolveError::Submission(format!("HTTP {status} from {url}")));
        }
        let value: Value = response
            .json()
            .map_err(|e| SolveError::Submission(format!("parse check response: {e}")))?;
        Ok(parse_check_response(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAILY_BODY: &str = r#"{
      "data": {
        "activeDailyCodingChallengeQuestion": {
          "date": "2025-12-10",
          "question": {
            "questionId": "3864",
            "questionFrontendId": "3577",
            "title": "Count the Number of Computer Unlocking Permutations",
            "titleSlug": "count-the-number-of-computer-unlocking-permutations",
            "content": "<p>You are given an array <code>complexity</code>.</p>",
            "codeSnippets": [
              {"lang": "C++", "langSlug": "cpp", "code": "class Solution {};"},
              {"lang": "Java", "langSlug": "java", "code": "class Solution {\n}"}
            ],
            "exampleTestcases": "[1,2,3]",
            "difficulty": "Medium"
          }
        }
      }
    }"#;

    #[test]
    fn parses_daily_question_and_picks_template() {
        let daily = parse_daily_response(DAILY_BODY).expect("parse");
        assert_eq!(daily.question_id, "3864");
        let problem = daily.into_problem("Java").expect("problem");
        assert_eq!(problem.template, "class Solution {\n}");
        assert_eq!(problem.statement, "You are given an array complexity.");
        assert_eq!(
            problem.date,
            NaiveDate::from_ymd_opt(2025, 12, 10).expect("date")
        );
        assert_eq!(problem.difficulty.as_deref(), Some("Medium"));
    }

    #[test]
    fn missing_template_is_fetch_error() {
        let daily = parse_daily_response(DAILY_BODY).expect("parse");
        let err = daily.into_problem("Rust").unwrap_err();
        assert!(matches!(err, SolveError::Fetch(_)));
    }

    #[test]
    fn graphql_errors_are_fetch_errors() {
        let err = parse_daily_response(r#"{"data": null, "errors": [{"message": "denied"}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn submission_id_number_becomes_handle() {
        let handle = parse_submit_response(&json!({"submission_id": 42})).expect("handle");
        assert_eq!(handle, SubmissionHandle::new(HandleSource::SubmissionId, "42"));
    }

    #[test]
    fn empty_submit_response_is_error() {
        let err = parse_submit_response(&json!({})).unwrap_err();
        assert!(matches!(err, SolveError::Submission(_)));
    }

    #[test]
    fn handle_precedence_is_fixed() {
        let handle = parse_submit_response(&json!({
            "interpret_id": "run_1",
            "submission_id": 7
        }))
        .expect("handle");
        assert_eq!(handle.source, HandleSource::SubmissionId);

        let handle = parse_submit_response(&json!({"interpret_id": "run_1"})).expect("handle");
        assert_eq!(handle, SubmissionHandle::new(HandleSource::InterpretId, "run_1"));

        let handle = parse_submit_response(&json!({
            "data": {"submitCode": {"submissionId": "99"}}
        }))
        .expect("handle");
        assert_eq!(handle, SubmissionHandle::new(HandleSource::Mutation, "99"));
    }

    #[test]
    fn blank_handle_is_ignored() {
        let handle = parse_submit_response(&json!({"submission_id": "", "interpret_id": 5}))
            .expect("handle");
        assert_eq!(handle.source, HandleSource::InterpretId);
    }

    #[test]
    fn check_response_maps_fields() {
        let verdict = parse_check_response(&json!({
            "state": "SUCCESS",
            "status_msg": "Wrong Answer",
            "status_runtime": "N/A",
            "total_correct": 3,
            "total_testcases": 10,
            "last_testcase": "[1,2]",
            "code_output": "1",
            "expected_output": "2",
            "compile_error": "short",
            "full_compile_error": "long form"
        }));
        assert!(verdict.is_complete());
        assert!(!verdict.is_accepted());
        assert_eq!(verdict.test_counts().as_deref(), Some("3/10"));
        assert_eq!(verdict.compile_error.as_deref(), Some("long form"));
        assert_eq!(verdict.memory, None);
    }

    #[test]
    fn pending_check_response_is_not_complete() {
        let verdict = parse_check_response(&json!({"state": "PENDING"}));
        assert!(!verdict.is_complete());
        assert_eq!(verdict.status_msg, "Unknown");
    }
}
