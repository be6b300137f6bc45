//! Prompt rendering for the solution generator.

use anyhow::Result;
use minijinja::{Environment, context};

const SOLVE_TEMPLATE: &str = include_str!("prompts/solve.md");

/// Everything one generation prompt is built from.
#[derive(Debug, Clone, Copy)]
pub struct PromptInputs<'a> {
    /// Human language name, e.g. `Java`.
    pub language: &'a str,
    pub statement: &'a str,
    pub template: &'a str,
    /// Feedback from the previous attempt, inserted verbatim.
    pub feedback: Option<&'a str>,
}

/// Template engine wrapper around minijinja.
pub struct PromptBuilder {
    env: Environment<'static>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("solve", SOLVE_TEMPLATE)
            .expect("solve template should be valid");
        Self { env }
    }

    pub fn render(&self, input: &PromptInputs<'_>) -> Result<String> {
        let template = self.env.get_template("solve")?;
        let rendered = template.render(context! {
            language => input.language,
            statement => input.statement.trim(),
            template => input.template.trim(),
            feedback => input.feedback.map(str::trim).filter(|s| !s.is_empty()),
        })?;
        Ok(rendered)
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}
