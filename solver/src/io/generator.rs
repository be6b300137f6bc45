//! Solution generator seam and its Gemini-backed implementation.

use tracing::{debug, info, instrument};

use crate::core::extract::extract_code;
use crate::core::feedback::FeedbackRecord;
use crate::error::{SolveError, SolveResult};
use crate::io::gemini::GeminiClient;
use crate::io::prompt::{PromptBuilder, PromptInputs};

/// Inputs for one generation call.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub statement: &'a str,
    pub template: &'a str,
    pub feedback: Option<&'a FeedbackRecord>,
}

/// Produces source code for a problem.
pub trait Generator {
    fn generate(&self, request: &GenerationRequest<'_>) -> SolveResult<String>;
}

/// Extract code from model output; empty output is a generation error.
pub fn code_from_text(text: &str) -> SolveResult<String> {
    let code = extract_code(text);
    if code.is_empty() {
        return Err(SolveError::Generation(
            "no code could be extracted from the response".to_string(),
        ));
    }
    Ok(code)
}

/// Generator that prompts Gemini.
pub struct GeminiGenerator {
    client: GeminiClient,
    prompts: PromptBuilder,
    language: String,
}

impl GeminiGenerator {
    pub fn new(client: GeminiClient, language: impl Into<String>) -> Self {
        Self {
            client,
            prompts: PromptBuilder::new(),
            language: language.into(),
        }
    }
}

impl Generator for GeminiGenerator {
    #[instrument(skip_all, fields(retry = request.feedback.is_some()))]
    fn generate(&self, request: &GenerationRequest<'_>) -> SolveResult<String> {
        let prompt = self
            .prompts
            .render(&PromptInputs {
                language: &self.language,
                statement: request.statement,
                template: request.template,
                feedback: request.feedback.map(|f| f.text.as_str()),
            })
            .map_err(|e| SolveError::Generation(format!("render prompt: {e:#}")))?;
        debug!(prompt_len = prompt.len(), "prompt rendered");
        let response = self.client.generate_content(&prompt)?;
        let text = response.answer_text()?;
        let code = code_from_text(&text)?;
        info!(code_len = code.len(), "solution generated");
        Ok(code)
    }
}
