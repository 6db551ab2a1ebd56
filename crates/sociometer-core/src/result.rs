//! Per-attempt and per-target scrape records.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EngagementMetrics, Identity, Platform, Post};

/// Classification of a single scrape attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The post target was reached.
    Success,
    /// At least one post, but fewer than the target.
    PartialSuccess,
    /// A block wall (or an undismissable login wall) was hit.
    Blocked,
    Timeout,
    NetworkError,
    /// Nothing went wrong that we could detect, but nothing was collected.
    Unknown,
}

/// Error taxonomy persisted in `errors.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidTarget,
    Blocked,
    LoginRequired,
    NetworkError,
    Timeout,
    ExtractionGap,
    PersistenceError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub message: String,
    pub attempt: Option<u32>,
    pub occurred_at: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            attempt: None,
            occurred_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn at_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }
}

/// One iteration of the retry loop.
#[derive(Debug, Clone)]
pub struct ScrapeAttempt {
    pub attempt_number: u32,
    pub outcome: AttemptOutcome,
    /// Discovery order, deduplicated by `post_id`.
    pub posts_collected: Vec<Post>,
    /// Profile-level follower count, when the page exposed one.
    pub followers: Option<u64>,
    pub errors: Vec<ErrorRecord>,
}

impl ScrapeAttempt {
    #[must_use]
    pub fn new(attempt_number: u32, outcome: AttemptOutcome) -> Self {
        Self {
            attempt_number,
            outcome,
            posts_collected: Vec::new(),
            followers: None,
            errors: Vec::new(),
        }
    }
}

/// Terminal state of the retry state machine for one scrape operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    Succeeded,
    PartiallySucceeded,
    ExhaustedRetries,
}

/// Final output of one (target, platform) scrape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub platform: Platform,
    pub identity: Identity,
    pub target_label: String,
    pub url: String,
    pub success: bool,
    pub outcome: TerminalState,
    pub attempts: u32,
    pub posts: Vec<Post>,
    pub engagement_metrics: EngagementMetrics,
    pub errors: Vec<ErrorRecord>,
    pub output_path: Option<PathBuf>,
    pub scraped_at: DateTime<Utc>,
}
