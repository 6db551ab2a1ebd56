//! Batch orchestration: one sequential worker per platform, platforms in
//! parallel, completed targets skipped, and a summary persisted at the end.
//! Ctrl-C ends manual-login waits and stops workers from starting new jobs.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sociometer_core::{AppConfig, Platform, TargetJob, TerminalState};
use sociometer_scraper::{
    profile_for, BrowserlessDriver, FileSignal, PlatformScraper, ScraperSettings, SocialScraper,
};
use sociometer_store::{OutputStore, SessionStore};
use tokio_util::sync::CancellationToken;

/// How long a batch run waits on a manual login before moving on.
const MANUAL_LOGIN_MAX_WAIT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub(crate) struct RunOptions {
    pub targets_path: PathBuf,
    pub platform: Option<Platform>,
    pub label: Option<String>,
    pub max_posts: usize,
    pub manual_login: bool,
}

/// Result counts for one platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub(crate) struct PlatformTally {
    pub succeeded: usize,
    pub partial: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl PlatformTally {
    fn total(&self) -> usize {
        self.succeeded + self.partial + self.failed + self.skipped
    }
}

/// Contents of `run_summary.json`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub platforms: BTreeMap<Platform, PlatformTally>,
}

/// Loads targets, scrapes every pending account and writes the run summary.
///
/// # Errors
///
/// Returns an error if the targets file is invalid, a page driver cannot be
/// built, or the run summary cannot be written. Individual target failures
/// are counted, never propagated.
pub(crate) async fn run_batch(config: &AppConfig, options: &RunOptions) -> anyhow::Result<()> {
    let started_at = Utc::now();
    let targets = sociometer_core::load_targets(&options.targets_path)
        .with_context(|| format!("loading {}", options.targets_path.display()))?;
    let jobs = filter_jobs(targets.jobs(), options);
    if jobs.is_empty() {
        println!("no targets match the given filters; nothing to do");
        return Ok(());
    }
    tracing::info!(jobs = jobs.len(), "batch run started");

    let sessions = Arc::new(SessionStore::new(&config.sessions_dir));
    let output = OutputStore::new(&config.output_dir);
    let settings = ScraperSettings {
        max_posts: options.max_posts,
        ..ScraperSettings::from_config(config)
    };
    let cancel = crate::cancel_on_ctrl_c();

    let platforms = run_groups(
        group_by_platform(jobs),
        &output,
        options.max_posts,
        &cancel,
        |platform| {
            let driver = BrowserlessDriver::new(
                &config.browserless_url,
                config.browserless_token.as_deref(),
            )?;
            let mut scraper = SocialScraper::new(
                profile_for(platform),
                driver,
                settings.clone(),
                Arc::clone(&sessions),
                output.clone(),
            );
            if options.manual_login {
                let gate = FileSignal::for_platform(
                    &config.signal_dir,
                    platform,
                    Duration::from_millis(config.signal_poll_ms),
                    cancel.clone(),
                )
                .with_max_wait(MANUAL_LOGIN_MAX_WAIT);
                scraper = scraper.with_auth_gate(Arc::new(gate));
            }
            Ok(scraper)
        },
    )
    .await?;

    let summary = RunSummary {
        started_at,
        finished_at: Utc::now(),
        platforms,
    };
    let path = output
        .write_run_summary(&summary)
        .await
        .context("writing run summary")?;
    print_summary(&summary);
    println!("summary written to {}", path.display());
    Ok(())
}

pub(crate) fn filter_jobs(jobs: Vec<TargetJob>, options: &RunOptions) -> Vec<TargetJob> {
    jobs.into_iter()
        .filter(|j| options.platform.is_none_or(|p| p == j.platform))
        .filter(|j| {
            options
                .label
                .as_deref()
                .is_none_or(|l| l.eq_ignore_ascii_case(&j.label))
        })
        .collect()
}

/// Splits jobs per platform, keeping file order within each platform.
pub(crate) fn group_by_platform(jobs: Vec<TargetJob>) -> BTreeMap<Platform, Vec<TargetJob>> {
    let mut groups: BTreeMap<Platform, Vec<TargetJob>> = BTreeMap::new();
    for job in jobs {
        groups.entry(job.platform).or_default().push(job);
    }
    groups
}

/// Runs each platform's jobs on its own scraper. Platforms proceed
/// concurrently; jobs within a platform run one at a time.
///
/// # Errors
///
/// Returns an error if `make_scraper` fails for any platform; no job runs in
/// that case.
pub(crate) async fn run_groups<S, F>(
    groups: BTreeMap<Platform, Vec<TargetJob>>,
    output: &OutputStore,
    max_posts: usize,
    cancel: &CancellationToken,
    mut make_scraper: F,
) -> anyhow::Result<BTreeMap<Platform, PlatformTally>>
where
    S: PlatformScraper,
    F: FnMut(Platform) -> anyhow::Result<S>,
{
    let mut workers = Vec::with_capacity(groups.len());
    for (platform, jobs) in groups {
        let scraper = make_scraper(platform)
            .with_context(|| format!("building {platform} scraper"))?;
        workers.push((platform, scraper, jobs));
    }

    let tallies = futures::future::join_all(workers.into_iter().map(
        |(platform, mut scraper, jobs)| async move {
            let tally = run_platform(&mut scraper, output, &jobs, max_posts, cancel).await;
            (platform, tally)
        },
    ))
    .await;
    Ok(tallies.into_iter().collect())
}

/// Processes one platform's jobs in order until done or cancelled.
pub(crate) async fn run_platform<S: PlatformScraper + ?Sized>(
    scraper: &mut S,
    output: &OutputStore,
    jobs: &[TargetJob],
    max_posts: usize,
    cancel: &CancellationToken,
) -> PlatformTally {
    let mut tally = PlatformTally::default();
    for (i, job) in jobs.iter().enumerate() {
        let platform = job.platform;
        if cancel.is_cancelled() {
            tracing::warn!(%platform, not_started = jobs.len() - i, "run cancelled");
            break;
        }
        let Some(identity) = scraper.extract_identity(&job.url) else {
            tracing::error!(%platform, target = %job.label, raw = %job.url, "invalid target: no profile identity");
            tally.failed += 1;
            continue;
        };

        if let Some(meta) = output.completed(&job.label, platform, &identity).await {
            if meta.success {
                tracing::info!(
                    %platform,
                    target = %job.label,
                    %identity,
                    scraped_at = %meta.scraped_at,
                    "already scraped; skipping"
                );
                tally.skipped += 1;
                continue;
            }
        }

        match scraper.scrape(&job.url, &job.label, max_posts).await {
            Ok(result) => match result.outcome {
                TerminalState::Succeeded => tally.succeeded += 1,
                TerminalState::PartiallySucceeded => tally.partial += 1,
                TerminalState::ExhaustedRetries => tally.failed += 1,
            },
            Err(e) => {
                tracing::error!(%platform, target = %job.label, raw = %job.url, error = %e, "scrape failed");
                tally.failed += 1;
            }
        }
    }
    tracing::info!(
        platform = %jobs.first().map_or("none", |j| j.platform.as_str()),
        succeeded = tally.succeeded,
        partial = tally.partial,
        failed = tally.failed,
        skipped = tally.skipped,
        "platform finished"
    );
    tally
}

fn print_summary(summary: &RunSummary) {
    println!(
        "{:<10} {:>9} {:>7} {:>6} {:>7} {:>5}",
        "platform", "succeeded", "partial", "failed", "skipped", "total"
    );
    for (platform, t) in &summary.platforms {
        println!(
            "{:<10} {:>9} {:>7} {:>6} {:>7} {:>5}",
            platform.as_str(),
            t.succeeded,
            t.partial,
            t.failed,
            t.skipped,
            t.total()
        );
    }
    let elapsed = summary.finished_at - summary.started_at;
    println!("finished in {}s", elapsed.num_seconds());
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
