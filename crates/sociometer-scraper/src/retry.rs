//! Retry state machine for one scrape operation.
//!
//! The controller is pure bookkeeping: the scraper runs attempts and sleeps,
//! and feeds each finished [`ScrapeAttempt`] to [`RetryController::record`],
//! which names the next state. Timing lives in [`Backoff`].
//!
//! | From | Attempt outcome | To |
//! |------|-----------------|----|
//! | `Attempting(n)` | `Success` | `Succeeded` |
//! | `Attempting(n)` | `Blocked`, first block of the run | `Attempting(n + 1)` |
//! | `Attempting(n)` | `Blocked`, second block of the run | terminal |
//! | `Attempting(n)` | anything else, `n < max_retries` | `Attempting(n + 1)` |
//! | `Attempting(max_retries)` | anything else | terminal |
//!
//! "Terminal" resolves to `PartiallySucceeded` when any eligible attempt
//! collected posts, otherwise `ExhaustedRetries`.

use std::time::Duration;

use sociometer_core::{AttemptOutcome, ErrorRecord, ScrapeAttempt, TerminalState};

/// Exponential backoff with additive jitter: `base * 2^n + random(0, jitter)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub jitter: Duration,
}

impl Backoff {
    const MAX_SHIFT: u32 = 16;

    /// Delay before attempt `n + 1`, where `n` is the attempt that just
    /// finished (1-based).
    #[must_use]
    pub fn delay_after(&self, n: u32) -> Duration {
        let exp = self.base.saturating_mul(1u32 << n.min(Self::MAX_SHIFT));
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let jitter = Duration::from_millis((jitter_ms as f64 * rand::random::<f64>()) as u64);
        exp.saturating_add(jitter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts allowed, at least 1.
    pub max_retries: u32,
    /// Post count that makes an attempt a `Success`.
    pub target_posts: usize,
    pub backoff: Backoff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting(u32),
    Succeeded,
    PartiallySucceeded,
    ExhaustedRetries,
}

impl RetryState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Attempting(_))
    }
}

/// What the loop leaves behind: the terminal state, the promoted attempt (if
/// any was eligible) and every error recorded along the way.
#[derive(Debug, Clone)]
pub struct RetryReport {
    pub outcome: TerminalState,
    pub best: Option<ScrapeAttempt>,
    pub attempts: u32,
    pub errors: Vec<ErrorRecord>,
}

#[derive(Debug)]
pub struct RetryController {
    policy: RetryPolicy,
    state: RetryState,
    attempts: u32,
    blocked: u32,
    best: Option<ScrapeAttempt>,
    errors: Vec<ErrorRecord>,
}

impl RetryController {
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy: RetryPolicy {
                max_retries: policy.max_retries.max(1),
                ..policy
            },
            state: RetryState::Attempting(1),
            attempts: 0,
            blocked: 0,
            best: None,
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> RetryState {
        self.state
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Sleep to apply before `attempt`; zero for the first.
    #[must_use]
    pub fn backoff_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            Duration::ZERO
        } else {
            self.policy.backoff.delay_after(attempt - 1)
        }
    }

    /// Folds a finished attempt into the controller and returns the next
    /// state. Recording after a terminal state is ignored.
    pub fn record(&mut self, mut attempt: ScrapeAttempt) -> RetryState {
        let RetryState::Attempting(n) = self.state else {
            return self.state;
        };
        self.attempts = n;
        self.errors.append(&mut attempt.errors);

        let outcome = attempt.outcome;
        if outcome == AttemptOutcome::Blocked {
            self.blocked += 1;
        } else {
            self.promote(attempt);
        }

        self.state = match outcome {
            AttemptOutcome::Success => RetryState::Succeeded,
            AttemptOutcome::Blocked if self.blocked >= 2 => {
                tracing::warn!(attempt = n, "blocked again; giving up on this target");
                self.settle()
            }
            _ if n >= self.policy.max_retries => self.settle(),
            _ => RetryState::Attempting(n + 1),
        };
        self.state
    }

    /// Strictly more posts replaces the current best, so ties keep the
    /// earliest attempt and an empty attempt never displaces a non-empty one.
    fn promote(&mut self, attempt: ScrapeAttempt) {
        let better = self
            .best
            .as_ref()
            .is_none_or(|best| attempt.posts_collected.len() > best.posts_collected.len());
        if better {
            self.best = Some(attempt);
        }
    }

    fn settle(&self) -> RetryState {
        if self
            .best
            .as_ref()
            .is_some_and(|b| !b.posts_collected.is_empty())
        {
            RetryState::PartiallySucceeded
        } else {
            RetryState::ExhaustedRetries
        }
    }

    #[must_use]
    pub fn finish(self) -> RetryReport {
        let outcome = match self.state {
            RetryState::Succeeded => TerminalState::Succeeded,
            RetryState::PartiallySucceeded => TerminalState::PartiallySucceeded,
            RetryState::ExhaustedRetries => TerminalState::ExhaustedRetries,
            RetryState::Attempting(_) => match self.settle() {
                RetryState::PartiallySucceeded => TerminalState::PartiallySucceeded,
                _ => TerminalState::ExhaustedRetries,
            },
        };
        RetryReport {
            outcome,
            best: self.best,
            attempts: self.attempts,
            errors: self.errors,
        }
    }
}

#[cfg(test)]
#[path = "retry_test.rs"]
mod tests;
