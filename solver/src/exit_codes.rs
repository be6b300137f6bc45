//! Stable exit codes for solver CLI commands.

/// Command succeeded, the problem was accepted, or today's run already succeeded.
pub const OK: i32 = 0;
/// Command failed due to invalid config, missing secrets, a fetch failure or other errors.
pub const INVALID: i32 = 1;
/// `solver solve` used every attempt without an acceptance.
pub const EXHAUSTED: i32 = 2;
