use std::time::Duration;

use sociometer_core::{Engagement, ErrorKind, Platform, Post};

use super::*;

fn policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        target_posts: 5,
        backoff: Backoff {
            base: Duration::from_millis(1_000),
            jitter: Duration::from_millis(1_000),
        },
    }
}

fn posts(prefix: &str, n: usize) -> Vec<Post> {
    (0..n)
        .map(|i| Post {
            post_id: format!("{prefix}{i}"),
            text: None,
            timestamp: None,
            url: None,
            engagement: Engagement::default(),
            platform: Platform::Instagram,
            media_present: false,
        })
        .collect()
}

fn attempt(n: u32, outcome: AttemptOutcome, count: usize) -> ScrapeAttempt {
    let mut a = ScrapeAttempt::new(n, outcome);
    a.posts_collected = posts(&format!("a{n}-"), count);
    a
}

#[test]
fn blocked_then_success_keeps_the_successful_posts() {
    let mut c = RetryController::new(policy(3));
    let mut blocked = attempt(1, AttemptOutcome::Blocked, 0);
    blocked
        .errors
        .push(ErrorRecord::new(ErrorKind::Blocked, "captcha").at_attempt(1));

    assert_eq!(c.record(blocked), RetryState::Attempting(2));
    assert_eq!(c.record(attempt(2, AttemptOutcome::Success, 5)), RetryState::Succeeded);

    let report = c.finish();
    assert_eq!(report.outcome, TerminalState::Succeeded);
    assert_eq!(report.attempts, 2);
    assert_eq!(report.best.unwrap().posts_collected.len(), 5);
    assert_eq!(report.errors.len(), 1, "errors from the blocked attempt are kept");
}

#[test]
fn repeated_block_aborts_before_budget_is_spent() {
    let mut c = RetryController::new(policy(3));
    assert_eq!(c.record(attempt(1, AttemptOutcome::Blocked, 0)), RetryState::Attempting(2));
    assert_eq!(c.record(attempt(2, AttemptOutcome::Blocked, 0)), RetryState::ExhaustedRetries);

    let report = c.finish();
    assert_eq!(report.attempts, 2);
    assert_eq!(report.outcome, TerminalState::ExhaustedRetries);
    assert!(report.best.is_none());
}

#[test]
fn second_block_later_in_the_run_also_aborts() {
    let mut c = RetryController::new(policy(5));
    c.record(attempt(1, AttemptOutcome::Blocked, 0));
    c.record(attempt(2, AttemptOutcome::PartialSuccess, 2));
    assert_eq!(
        c.record(attempt(3, AttemptOutcome::Blocked, 0)),
        RetryState::PartiallySucceeded
    );
    assert_eq!(c.finish().attempts, 3);
}

#[test]
fn partial_result_survives_a_later_empty_attempt() {
    let mut c = RetryController::new(policy(3));
    c.record(attempt(1, AttemptOutcome::PartialSuccess, 3));
    c.record(attempt(2, AttemptOutcome::Unknown, 0));
    assert_eq!(
        c.record(attempt(3, AttemptOutcome::NetworkError, 0)),
        RetryState::PartiallySucceeded
    );

    let report = c.finish();
    assert_eq!(report.outcome, TerminalState::PartiallySucceeded);
    let best = report.best.unwrap();
    assert_eq!(best.attempt_number, 1);
    assert_eq!(best.posts_collected.len(), 3);
}

#[test]
fn ties_keep_the_earliest_attempt() {
    let mut c = RetryController::new(policy(3));
    c.record(attempt(1, AttemptOutcome::PartialSuccess, 2));
    c.record(attempt(2, AttemptOutcome::PartialSuccess, 2));
    c.record(attempt(3, AttemptOutcome::PartialSuccess, 1));
    assert_eq!(c.finish().best.unwrap().attempt_number, 1);
}

#[test]
fn later_attempt_with_more_posts_wins() {
    let mut c = RetryController::new(policy(3));
    c.record(attempt(1, AttemptOutcome::PartialSuccess, 1));
    c.record(attempt(2, AttemptOutcome::PartialSuccess, 4));
    c.record(attempt(3, AttemptOutcome::PartialSuccess, 2));
    assert_eq!(c.finish().best.unwrap().attempt_number, 2);
}

#[test]
fn blocked_attempt_is_never_promoted() {
    let mut c = RetryController::new(policy(2));
    c.record(attempt(1, AttemptOutcome::Blocked, 4));
    c.record(attempt(2, AttemptOutcome::PartialSuccess, 1));
    let report = c.finish();
    assert_eq!(report.best.unwrap().attempt_number, 2);
    assert_eq!(report.outcome, TerminalState::PartiallySucceeded);
}

#[test]
fn all_empty_attempts_exhaust_retries() {
    let mut c = RetryController::new(policy(3));
    assert_eq!(c.record(attempt(1, AttemptOutcome::Timeout, 0)), RetryState::Attempting(2));
    assert_eq!(c.record(attempt(2, AttemptOutcome::NetworkError, 0)), RetryState::Attempting(3));
    assert_eq!(c.record(attempt(3, AttemptOutcome::Unknown, 0)), RetryState::ExhaustedRetries);

    let report = c.finish();
    assert_eq!(report.outcome, TerminalState::ExhaustedRetries);
    assert_eq!(report.attempts, 3);
    assert!(report.best.unwrap().posts_collected.is_empty());
}

#[test]
fn recording_after_terminal_state_is_ignored() {
    let mut c = RetryController::new(policy(3));
    c.record(attempt(1, AttemptOutcome::Success, 5));
    assert_eq!(c.record(attempt(2, AttemptOutcome::Blocked, 0)), RetryState::Succeeded);
    assert_eq!(c.finish().attempts, 1);
}

#[test]
fn zero_budget_still_allows_one_attempt() {
    let mut c = RetryController::new(policy(0));
    assert_eq!(c.state(), RetryState::Attempting(1));
    assert!(c.record(attempt(1, AttemptOutcome::Unknown, 0)).is_terminal());
}

#[test]
fn backoff_grows_exponentially_with_bounded_jitter() {
    let c = RetryController::new(policy(3));
    assert_eq!(c.backoff_before(1), Duration::ZERO);

    for _ in 0..20 {
        let before_2 = c.backoff_before(2);
        assert!(before_2 >= Duration::from_millis(2_000) && before_2 < Duration::from_millis(3_000));
        let before_3 = c.backoff_before(3);
        assert!(before_3 >= Duration::from_millis(4_000) && before_3 < Duration::from_millis(5_000));
    }
}

#[test]
fn backoff_without_jitter_is_deterministic() {
    let b = Backoff {
        base: Duration::from_millis(10),
        jitter: Duration::ZERO,
    };
    assert_eq!(b.delay_after(1), Duration::from_millis(20));
    assert_eq!(b.delay_after(3), Duration::from_millis(80));
}
