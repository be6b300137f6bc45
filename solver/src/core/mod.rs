//! Deterministic, pure logic shared by the solver.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod backoff;
pub mod extract;
pub mod feedback;
pub mod normalize;
pub mod types;
