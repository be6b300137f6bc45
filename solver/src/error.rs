//! Error taxonomy for the collaborator seams of a solve run.
//!
//! Plumbing (config, filesystem, CLI) uses `anyhow`. The variants here are the
//! ones the orchestrator and run driver branch on.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolveError {
    /// Problem retrieval failed. Aborts the run.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The model returned nothing usable.
    #[error("generation failed: {0}")]
    Generation(String),

    /// Transport failure or missing handle while submitting.
    #[error("submission failed: {0}")]
    Submission(String),

    /// The judge never reached a terminal state within the poll budget.
    #[error("judge did not finish after {polls} polls")]
    PollTimeout { polls: u32 },

    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("notification failed: {0}")]
    Notification(String),
}

impl SolveError {
    /// Short label used in logs and attempt artifacts.
    pub fn kind(&self) -> &'static str {
        match self {
            SolveError::Fetch(_) => "fetch",
            SolveError::Generation(_) => "generation",
            SolveError::Submission(_) => "submission",
            SolveError::PollTimeout { .. } => "poll_timeout",
            SolveError::Persistence(_) => "persistence",
            SolveError::Notification(_) => "notification",
        }
    }
}

pub type SolveResult<T> = std::result::Result<T, SolveError>;
