//! Human-like timing, pointer and scroll behavior.
//!
//! Everything here is best effort: driver failures during simulated behavior
//! are logged and swallowed, never surfaced to the caller.

use std::ops::RangeInclusive;
use std::time::Duration;

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::driver::PageDriver;

/// Plausible desktop browser identities. One is chosen per attempt.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

#[derive(Debug, Clone)]
pub struct StealthSettings {
    /// Micro-delay between discrete page actions, in milliseconds.
    pub action_delay_ms: RangeInclusive<u64>,
    /// Forward scroll distance per cycle, in pixels.
    pub scroll_px: RangeInclusive<i64>,
    /// Occasional backwards scroll distance, in pixels.
    pub reverse_px: RangeInclusive<i64>,
    pub reverse_probability: f64,
    /// Pause after each scroll cycle, in milliseconds.
    pub settle_ms: RangeInclusive<u64>,
    pub pointer_moves: RangeInclusive<usize>,
}

impl Default for StealthSettings {
    fn default() -> Self {
        Self {
            action_delay_ms: 200..=500,
            scroll_px: 400..=900,
            reverse_px: 80..=250,
            reverse_probability: 0.3,
            settle_ms: 800..=1_600,
            pointer_moves: 2..=4,
        }
    }
}

impl StealthSettings {
    /// Same behavior with every delay collapsed to zero.
    #[must_use]
    pub fn instant() -> Self {
        Self {
            action_delay_ms: 0..=0,
            settle_ms: 0..=0,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
pub struct Stealth {
    settings: StealthSettings,
    current_agent: Option<&'static str>,
}

impl Stealth {
    #[must_use]
    pub fn new(settings: StealthSettings) -> Self {
        Self {
            settings,
            current_agent: None,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &StealthSettings {
        &self.settings
    }

    /// Picks a user agent different from the previous one.
    pub fn rotate_user_agent(&mut self) -> &'static str {
        let mut rng = rand::rng();
        let candidates: Vec<&'static str> = USER_AGENTS
            .iter()
            .copied()
            .filter(|ua| Some(*ua) != self.current_agent)
            .collect();
        let agent = candidates
            .choose(&mut rng)
            .copied()
            .unwrap_or(USER_AGENTS[0]);
        self.current_agent = Some(agent);
        agent
    }

    #[must_use]
    pub fn current_user_agent(&self) -> Option<&'static str> {
        self.current_agent
    }

    /// Random micro-delay between page actions.
    pub async fn pause(&self) {
        let ms = sample_u64(&self.settings.action_delay_ms);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    /// Moves the pointer to 2–4 random viewport coordinates.
    pub async fn wander_pointer<D: PageDriver + ?Sized>(&self, driver: &mut D) {
        let (width, height) = driver.viewport();
        let points: Vec<(u32, u32)> = {
            let mut rng = rand::rng();
            let moves = rng.random_range(self.settings.pointer_moves.clone());
            (0..moves)
                .map(|_| {
                    (
                        rng.random_range(0..width.max(1)),
                        rng.random_range(0..height.max(1)),
                    )
                })
                .collect()
        };

        for (x, y) in points {
            if let Err(e) = driver.move_pointer(x, y).await {
                tracing::debug!(error = %e, "pointer move failed; continuing");
                return;
            }
            self.pause().await;
        }
    }

    /// One scroll cycle: forward, sometimes a smaller step back, then a
    /// settle pause.
    pub async fn scroll_step<D: PageDriver + ?Sized>(&self, driver: &mut D) {
        let (forward, reverse, settle_ms) = {
            let mut rng = rand::rng();
            let forward = rng.random_range(self.settings.scroll_px.clone());
            let reverse = rng
                .random_bool(self.settings.reverse_probability.clamp(0.0, 1.0))
                .then(|| rng.random_range(self.settings.reverse_px.clone()));
            (forward, reverse, sample_u64(&self.settings.settle_ms))
        };

        if let Err(e) = driver.scroll_by(forward).await {
            tracing::debug!(error = %e, "scroll failed; continuing");
            return;
        }
        if let Some(back) = reverse {
            self.pause().await;
            if let Err(e) = driver.scroll_by(-back).await {
                tracing::debug!(error = %e, "reverse scroll failed; continuing");
            }
        }
        if settle_ms > 0 {
            tokio::time::sleep(Duration::from_millis(settle_ms)).await;
        }
    }
}

fn sample_u64(range: &RangeInclusive<u64>) -> u64 {
    if range.is_empty() {
        return *range.start();
    }
    rand::rng().random_range(range.clone())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDecision {
    Continue,
    TargetReached,
    /// Two consecutive cycles added nothing new.
    Exhausted,
}

/// Decides when to stop scrolling: once `target` posts are known, or after
/// two consecutive cycles that found no new content.
#[derive(Debug)]
pub struct ScrollTracker {
    target: usize,
    last_count: Option<usize>,
    stale_cycles: u32,
}

impl ScrollTracker {
    const MAX_STALE_CYCLES: u32 = 2;

    #[must_use]
    pub fn new(target: usize) -> Self {
        Self {
            target,
            last_count: None,
            stale_cycles: 0,
        }
    }

    /// Feeds the number of distinct posts known after a cycle.
    pub fn observe(&mut self, count: usize) -> ScrollDecision {
        if count >= self.target {
            return ScrollDecision::TargetReached;
        }
        match self.last_count {
            Some(last) if count <= last => self.stale_cycles += 1,
            _ => self.stale_cycles = 0,
        }
        self.last_count = Some(count);

        if self.stale_cycles >= Self::MAX_STALE_CYCLES {
            ScrollDecision::Exhausted
        } else {
            ScrollDecision::Continue
        }
    }
}
