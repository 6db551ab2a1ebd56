use std::time::Duration;

use sociometer_core::AppConfig;

use crate::retry::Backoff;
use crate::stealth::StealthSettings;

/// Explicit configuration handed to each platform scraper.
#[derive(Debug, Clone)]
pub struct ScraperSettings {
    pub request_delay: Duration,
    pub nav_timeout: Duration,
    /// Total attempts per scrape.
    pub max_retries: u32,
    pub backoff: Backoff,
    pub max_posts: usize,
    pub min_post_text_len: usize,
    pub stealth: StealthSettings,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_secs(3),
            nav_timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff: Backoff {
                base: Duration::from_secs(1),
                jitter: Duration::from_secs(1),
            },
            max_posts: 25,
            min_post_text_len: 10,
            stealth: StealthSettings::default(),
        }
    }
}

impl ScraperSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            request_delay: Duration::from_millis(config.request_delay_ms),
            nav_timeout: Duration::from_secs(config.nav_timeout_secs),
            max_retries: config.max_retries,
            backoff: Backoff {
                base: Duration::from_millis(config.backoff_base_ms),
                jitter: Duration::from_millis(config.backoff_jitter_ms),
            },
            max_posts: config.max_posts,
            min_post_text_len: config.min_post_text_len,
            stealth: StealthSettings::default(),
        }
    }

    /// No delays anywhere; for tests and dry runs.
    #[must_use]
    pub fn instant() -> Self {
        Self {
            request_delay: Duration::ZERO,
            backoff: Backoff {
                base: Duration::ZERO,
                jitter: Duration::ZERO,
            },
            stealth: StealthSettings::instant(),
            ..Self::default()
        }
    }
}
