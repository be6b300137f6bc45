//! Daily coding-challenge solver.
//!
//! Fetches the daily problem from the judge, asks a generative model for a
//! solution, submits it, and retries with the judge's feedback until the
//! solution is accepted or the attempt budget runs out.
//!
//! - **[`core`]**: Pure logic (markup normalization, code extraction,
//!   feedback, backoff). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting adapters (judge HTTP, model HTTP, git,
//!   SMTP, filesystem). Each sits behind a trait so tests can script it.
//!
//! [`orchestrator`] runs the retry loop; [`solve`] wires one invocation.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod orchestrator;
pub mod solve;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
