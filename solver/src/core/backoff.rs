//! Delay between failed attempts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the delay after a failed attempt grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    /// Same delay after every attempt.
    Fixed,
    /// Delay scaled by the attempt number.
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub kind: BackoffKind,
    pub base: Duration,
}

impl Backoff {
    pub fn fixed(base: Duration) -> Self {
        Self {
            kind: BackoffKind::Fixed,
            base,
        }
    }

    pub fn none() -> Self {
        Self::fixed(Duration::ZERO)
    }

    /// Delay to wait after `attempt` (1-based) failed.
    pub fn delay(&self, attempt: u32) -> Duration {
        match self.kind {
            BackoffKind::Fixed => self.base,
            BackoffKind::Linear => self.base.saturating_mul(attempt.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_delay_ignores_attempt() {
        let backoff = Backoff::fixed(Duration::from_secs(10));
        assert_eq!(backoff.delay(1), Duration::from_secs(10));
        assert_eq!(backoff.delay(4), Duration::from_secs(10));
    }

    #[test]
    fn linear_delay_scales_with_attempt() {
        let backoff = Backoff {
            kind: BackoffKind::Linear,
            base: Duration::from_secs(5),
        };
        assert_eq!(backoff.delay(1), Duration::from_secs(5));
        assert_eq!(backoff.delay(3), Duration::from_secs(15));
        assert_eq!(backoff.delay(0), Duration::from_secs(5));
    }
}
