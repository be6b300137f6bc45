//! I/O adapters for solver commands.

pub mod attempt_log;
pub mod config;
pub mod gemini;
pub mod generator;
pub mod git;
pub mod init;
pub mod judge;
pub mod notify;
pub mod persist;
pub mod poller;
pub mod process;
pub mod prompt;
pub mod run_state;
pub mod session;
