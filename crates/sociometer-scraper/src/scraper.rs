//! The platform scraper: rate limiting, stealth, block detection and content
//! extraction composed inside the retry loop, followed by aggregation and
//! persistence.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sociometer_core::{
    aggregate_engagement, dedup_posts, AttemptOutcome, ErrorKind, ErrorRecord, Identity,
    Platform, Post, ScrapeAttempt, ScrapeResult,
};
use sociometer_store::{OutputStore, Session, SessionStore};

use crate::block::{BlockDetector, PageVerdict};
use crate::driver::PageDriver;
use crate::error::{DriverError, ScrapeError};
use crate::extract::{discover_posts, PageChain, PageState, PostFieldChains};
use crate::platforms::PlatformProfile;
use crate::rate_limit::RateLimiter;
use crate::retry::{RetryController, RetryPolicy, RetryState};
use crate::settings::ScraperSettings;
use crate::signal::AuthGate;
use crate::stealth::{ScrollDecision, ScrollTracker, Stealth};

/// Uniform contract every platform scraper fulfils.
#[async_trait]
pub trait PlatformScraper: Send {
    fn platform(&self) -> Platform;

    /// `None` when `url` does not name a profile on this platform.
    fn extract_identity(&self, url: &str) -> Option<Identity>;

    /// Scrapes one profile and persists the result.
    ///
    /// Blocks, timeouts and network failures are folded into the returned
    /// result's `errors`; only an unparseable target or a failed write
    /// prevent output.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidTarget`] when no identity can be parsed
    /// from `url`, and [`ScrapeError::Persistence`] when the result cannot be
    /// written.
    async fn scrape(
        &mut self,
        url: &str,
        target_label: &str,
        max_posts: usize,
    ) -> Result<ScrapeResult, ScrapeError>;
}

/// Extraction gaps seen during one attempt, reported as a single record.
#[derive(Debug, Default)]
struct GapTally {
    fields: BTreeSet<&'static str>,
    posts_with_gaps: usize,
    dropped_containers: usize,
}

impl GapTally {
    fn into_record(self, posts_found: usize, attempt: u32) -> Option<ErrorRecord> {
        let mut parts = Vec::new();
        if posts_found == 0 {
            parts.push("no posts found on page".to_string());
        }
        if self.posts_with_gaps > 0 {
            let fields: Vec<&str> = self.fields.into_iter().collect();
            parts.push(format!(
                "{} post(s) missing {}",
                self.posts_with_gaps,
                fields.join(", ")
            ));
        }
        if self.dropped_containers > 0 {
            parts.push(format!(
                "{} container(s) dropped without a post id",
                self.dropped_containers
            ));
        }
        (!parts.is_empty())
            .then(|| ErrorRecord::new(ErrorKind::ExtractionGap, parts.join("; ")).at_attempt(attempt))
    }
}

/// A [`PlatformScraper`] driven by a [`PlatformProfile`] over any
/// [`PageDriver`].
pub struct SocialScraper<D> {
    profile: Box<dyn PlatformProfile>,
    fields: PostFieldChains,
    followers: PageChain<u64>,
    detector: BlockDetector,
    driver: D,
    settings: ScraperSettings,
    limiter: RateLimiter,
    stealth: Stealth,
    sessions: Arc<SessionStore>,
    output: OutputStore,
    auth_gate: Option<Arc<dyn AuthGate>>,
}

impl<D: PageDriver> SocialScraper<D> {
    pub fn new(
        profile: Box<dyn PlatformProfile>,
        driver: D,
        settings: ScraperSettings,
        sessions: Arc<SessionStore>,
        output: OutputStore,
    ) -> Self {
        let fields = profile.post_fields();
        let followers = profile.followers_chain();
        let detector = BlockDetector::new(profile.block_markers());
        Self {
            fields,
            followers,
            detector,
            driver,
            limiter: RateLimiter::new(settings.request_delay),
            stealth: Stealth::new(settings.stealth.clone()),
            settings,
            sessions,
            output,
            auth_gate: None,
            profile,
        }
    }

    /// Lets a login wall that survives overlay dismissal wait on a manual
    /// login instead of failing the attempt.
    #[must_use]
    pub fn with_auth_gate(mut self, gate: Arc<dyn AuthGate>) -> Self {
        self.auth_gate = Some(gate);
        self
    }

    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// One pass of navigate → classify → extract → scroll.
    async fn attempt(&mut self, url: &str, n: u32, target: usize) -> ScrapeAttempt {
        let platform = self.profile.platform();
        let mut attempt = ScrapeAttempt::new(n, AttemptOutcome::Unknown);

        let agent = self.stealth.rotate_user_agent();
        if let Err(e) = self.driver.set_user_agent(agent).await {
            tracing::debug!(%platform, error = %e, "could not set user agent");
        }
        if let Some(session) = self.sessions.load(platform).await {
            if let Err(e) = self.driver.set_cookies(&session.cookies).await {
                tracing::warn!(%platform, error = %e, "could not apply saved session");
            }
        }

        self.limiter.wait().await;

        let mut timed_out = false;
        match self.driver.navigate(url, self.settings.nav_timeout).await {
            Ok(()) => {}
            Err(e @ DriverError::Timeout { .. }) => {
                tracing::warn!(%platform, attempt = n, error = %e, "navigation timed out; extracting what loaded");
                attempt
                    .errors
                    .push(ErrorRecord::new(ErrorKind::Timeout, e.to_string()).at_attempt(n));
                timed_out = true;
            }
            Err(e) => {
                tracing::warn!(%platform, attempt = n, error = %e, "navigation failed");
                attempt
                    .errors
                    .push(ErrorRecord::new(ErrorKind::NetworkError, e.to_string()).at_attempt(n));
                attempt.outcome = AttemptOutcome::NetworkError;
                return attempt;
            }
        }
        self.stealth.pause().await;

        let mut page = match self.driver.snapshot().await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(%platform, attempt = n, error = %e, "no page to extract from");
                if !timed_out {
                    attempt.errors.push(
                        ErrorRecord::new(ErrorKind::NetworkError, e.to_string()).at_attempt(n),
                    );
                }
                attempt.outcome = if timed_out {
                    AttemptOutcome::Timeout
                } else {
                    AttemptOutcome::NetworkError
                };
                return attempt;
            }
        };

        match self.detector.classify(&page) {
            PageVerdict::Ok => {}
            PageVerdict::Blocked { marker } => {
                tracing::warn!(%platform, attempt = n, %marker, "block wall detected");
                attempt.errors.push(
                    ErrorRecord::new(ErrorKind::Blocked, format!("block wall: {marker}"))
                        .at_attempt(n),
                );
                attempt.outcome = AttemptOutcome::Blocked;
                return attempt;
            }
            PageVerdict::LoginRequired { marker } => {
                if let Some(cleared) = self.clear_login_wall(url, n).await {
                    page = cleared;
                } else {
                    tracing::warn!(%platform, attempt = n, %marker, "login wall could not be dismissed");
                    attempt.errors.push(
                        ErrorRecord::new(ErrorKind::LoginRequired, format!("login wall: {marker}"))
                            .at_attempt(n),
                    );
                    attempt.outcome = AttemptOutcome::Blocked;
                    return attempt;
                }
            }
        }

        self.stealth.wander_pointer(&mut self.driver).await;
        attempt.followers = self.followers.extract(&page);

        let mut posts = Vec::new();
        let mut seen = HashSet::new();
        let mut gaps = GapTally::default();
        self.collect(&page, &mut posts, &mut seen, &mut gaps);

        let mut tracker = ScrollTracker::new(target);
        let mut decision = tracker.observe(posts.len());
        while decision == ScrollDecision::Continue {
            self.stealth.scroll_step(&mut self.driver).await;
            page = match self.driver.snapshot().await {
                Ok(next) => next,
                Err(e) => {
                    tracing::debug!(%platform, error = %e, "snapshot after scroll failed; stopping");
                    break;
                }
            };
            match self.detector.classify(&page) {
                PageVerdict::Ok => {}
                PageVerdict::Blocked { marker } => {
                    tracing::warn!(%platform, attempt = n, %marker, "block wall appeared while scrolling");
                    attempt.errors.push(
                        ErrorRecord::new(
                            ErrorKind::Blocked,
                            format!("block wall while scrolling: {marker}"),
                        )
                        .at_attempt(n),
                    );
                    attempt.outcome = AttemptOutcome::Blocked;
                    attempt.posts_collected = posts;
                    return attempt;
                }
                PageVerdict::LoginRequired { marker } => {
                    if let Some(cleared) = self.clear_login_wall(url, n).await {
                        page = cleared;
                    } else {
                        tracing::warn!(%platform, attempt = n, %marker, "login wall appeared while scrolling");
                        attempt.errors.push(
                            ErrorRecord::new(
                                ErrorKind::LoginRequired,
                                format!("login wall while scrolling: {marker}"),
                            )
                            .at_attempt(n),
                        );
                        attempt.outcome = AttemptOutcome::Blocked;
                        attempt.posts_collected = posts;
                        return attempt;
                    }
                }
            }
            self.collect(&page, &mut posts, &mut seen, &mut gaps);
            decision = tracker.observe(posts.len());
        }
        tracing::debug!(%platform, attempt = n, posts = posts.len(), ?decision, "scrolling finished");

        if let Some(record) = gaps.into_record(posts.len(), n) {
            tracing::debug!(%platform, attempt = n, message = %record.message, "extraction gaps");
            attempt.errors.push(record);
        }

        attempt.outcome = if posts.len() >= target {
            AttemptOutcome::Success
        } else if !posts.is_empty() {
            AttemptOutcome::PartialSuccess
        } else if timed_out {
            AttemptOutcome::Timeout
        } else {
            AttemptOutcome::Unknown
        };
        attempt.posts_collected = posts;
        attempt
    }

    /// Extracts posts from `page`, skipping IDs already collected this
    /// attempt.
    fn collect(
        &self,
        page: &PageState,
        posts: &mut Vec<Post>,
        seen: &mut HashSet<String>,
        gaps: &mut GapTally,
    ) {
        let platform = self.profile.platform();
        let nodes = discover_posts(
            page,
            self.profile.post_containers(),
            self.settings.min_post_text_len,
        );
        for node in &nodes {
            let Some(extracted) = self.fields.build(node, platform) else {
                gaps.dropped_containers += 1;
                continue;
            };
            if !seen.insert(extracted.post.post_id.clone()) {
                continue;
            }
            if !extracted.missing.is_empty() {
                gaps.posts_with_gaps += 1;
                gaps.fields.extend(extracted.missing);
            }
            posts.push(extracted.post);
        }
    }

    /// Tries the profile's overlay dismissals, then re-classifies once. If the
    /// wall remains and a manual gate is configured, waits for the operator,
    /// applies any cookies they exported and reloads with the refreshed
    /// session.
    async fn clear_login_wall(&mut self, url: &str, n: u32) -> Option<PageState> {
        let platform = self.profile.platform();
        for selector in self.profile.dismiss_selectors() {
            match self.driver.click(selector).await {
                Ok(true) => {
                    tracing::debug!(%platform, selector, "dismissed overlay");
                    self.stealth.pause().await;
                }
                Ok(false) => {}
                Err(e) => tracing::debug!(%platform, selector, error = %e, "dismiss click failed"),
            }
        }

        let page = self.driver.snapshot().await.ok()?;
        if self.detector.classify(&page).is_ok() {
            tracing::info!(%platform, attempt = n, "login wall dismissed");
            return Some(page);
        }

        let gate = self.auth_gate.clone()?;
        tracing::info!(%platform, login_url = self.profile.login_url(), "waiting for manual login");
        match gate.wait_ready().await {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                tracing::warn!(%platform, error = %e, "manual login gate failed");
                return None;
            }
        }

        match gate.imported_cookies().await {
            Ok(cookies) if cookies.is_empty() => {}
            Ok(cookies) => {
                if let Err(e) = self.driver.set_cookies(&cookies).await {
                    tracing::warn!(%platform, error = %e, "could not apply exported cookies");
                }
            }
            Err(e) => tracing::warn!(%platform, error = %e, "could not import exported cookies"),
        }
        self.persist_session().await;
        if let Err(e) = self.driver.navigate(url, self.settings.nav_timeout).await {
            tracing::warn!(%platform, error = %e, "reload after manual login failed");
        }
        let page = self.driver.snapshot().await.ok()?;
        self.detector.classify(&page).is_ok().then_some(page)
    }

    /// Saves the browser's cookies. Failures are logged; sessions are
    /// advisory.
    async fn persist_session(&mut self) {
        let platform = self.profile.platform();
        match self.driver.cookies().await {
            Ok(cookies) if cookies.is_empty() => {}
            Ok(cookies) => {
                let session = Session::new(platform, cookies);
                if let Err(e) = self.sessions.save(platform, &session).await {
                    tracing::warn!(%platform, error = %e, "failed to save session");
                }
            }
            Err(e) => tracing::debug!(%platform, error = %e, "could not read cookies"),
        }
    }
}

#[async_trait]
impl<D: PageDriver> PlatformScraper for SocialScraper<D> {
    fn platform(&self) -> Platform {
        self.profile.platform()
    }

    fn extract_identity(&self, url: &str) -> Option<Identity> {
        self.profile.extract_identity(url)
    }

    async fn scrape(
        &mut self,
        url: &str,
        target_label: &str,
        max_posts: usize,
    ) -> Result<ScrapeResult, ScrapeError> {
        let platform = self.profile.platform();
        let Some(identity) = self.profile.extract_identity(url) else {
            tracing::error!(%platform, target = target_label, raw = url, "invalid target: no profile identity");
            return Err(ScrapeError::InvalidTarget {
                platform,
                target_label: target_label.to_string(),
                raw: url.to_string(),
            });
        };

        let _session_guard = self.sessions.lock(platform).await;
        let page_url = self.profile.profile_url(&identity);
        tracing::info!(%platform, target = target_label, %identity, url = %page_url, max_posts, "scrape started");

        let mut controller = RetryController::new(RetryPolicy {
            max_retries: self.settings.max_retries,
            target_posts: max_posts,
            backoff: self.settings.backoff,
        });

        while let RetryState::Attempting(n) = controller.state() {
            let delay = controller.backoff_before(n);
            if !delay.is_zero() {
                tracing::warn!(
                    %platform,
                    attempt = n,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "retrying after backoff"
                );
                tokio::time::sleep(delay).await;
            }

            let attempt = self.attempt(&page_url, n, max_posts).await;
            self.persist_session().await;
            tracing::info!(
                %platform,
                %identity,
                attempt = n,
                outcome = ?attempt.outcome,
                posts = attempt.posts_collected.len(),
                "attempt finished"
            );
            controller.record(attempt);
        }

        let report = controller.finish();
        let (posts, followers) = report
            .best
            .map(|best| (dedup_posts(best.posts_collected, max_posts), best.followers))
            .unwrap_or_default();
        let engagement_metrics = aggregate_engagement(&posts, followers);

        let mut result = ScrapeResult {
            platform,
            identity,
            target_label: target_label.to_string(),
            url: page_url,
            success: !posts.is_empty(),
            outcome: report.outcome,
            attempts: report.attempts,
            posts,
            engagement_metrics,
            errors: report.errors,
            output_path: None,
            scraped_at: Utc::now(),
        };

        match self.output.write_result(&result).await {
            Ok(path) => result.output_path = Some(path),
            Err(source) => {
                tracing::error!(
                    %platform,
                    target = target_label,
                    raw = url,
                    error = %source,
                    "failed to persist scrape result"
                );
                return Err(ScrapeError::Persistence {
                    platform,
                    target_label: target_label.to_string(),
                    source,
                });
            }
        }

        tracing::info!(
            %platform,
            target = target_label,
            identity = %result.identity,
            outcome = ?result.outcome,
            posts = result.posts.len(),
            errors = result.errors.len(),
            "scrape finished"
        );
        Ok(result)
    }
}
