//! Per-platform knowledge: which URLs belong to the platform, how identities
//! are spelled, and which extraction strategies apply to its pages.

mod facebook;
mod instagram;
mod tiktok;
mod twitter;

use sociometer_core::{Identity, Platform};
use url::Url;

use crate::extract::{PageChain, PostFieldChains};

pub use facebook::Facebook;
pub use instagram::Instagram;
pub use tiktok::TikTok;
pub use twitter::Twitter;

/// Overlay close buttons common to most sites.
pub const DEFAULT_DISMISS_SELECTORS: &[&str] = &[
    r#"div[role="dialog"] [aria-label="Close"]"#,
    r#"[aria-label="Close"]"#,
    r#"button[aria-label="Dismiss"]"#,
];

pub trait PlatformProfile: Send + Sync {
    fn platform(&self) -> Platform;

    /// Parses the profile identity from any URL shape the platform uses.
    /// `None` for foreign hosts, reserved paths and malformed input.
    fn extract_identity(&self, url: &str) -> Option<Identity>;

    /// Canonical profile URL for an identity.
    fn profile_url(&self, identity: &Identity) -> String;

    fn login_url(&self) -> &'static str;

    /// Post container selectors, highest priority first.
    fn post_containers(&self) -> &'static [&'static str];

    fn post_fields(&self) -> PostFieldChains;

    fn followers_chain(&self) -> PageChain<u64>;

    fn dismiss_selectors(&self) -> &'static [&'static str] {
        DEFAULT_DISMISS_SELECTORS
    }

    /// Platform-specific block text, checked after the shared vocabulary.
    fn block_markers(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Parses a user-supplied URL, adding `https://` when no scheme is given.
/// Only http(s) URLs with a host are accepted.
#[must_use]
pub fn parse_target_url(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || raw.chars().any(char::is_whitespace) {
        return None;
    }
    let url = if raw.contains("://") {
        Url::parse(raw).ok()?
    } else {
        Url::parse(&format!("https://{}", raw.trim_start_matches('/'))).ok()?
    };
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.host_str()?;
    Some(url)
}

/// Lowercased host without `www.`, `m.`, `mobile.` or `web.` prefixes.
#[must_use]
pub fn bare_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    let stripped = ["www.", "m.", "mobile.", "web."]
        .iter()
        .find_map(|p| host.strip_prefix(p))
        .unwrap_or(&host);
    Some(stripped.to_string())
}

/// Non-empty path segments, percent-encoding left as-is.
#[must_use]
pub fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default()
}

/// `true` when `s` is 1..=`max_len` characters drawn from ASCII
/// alphanumerics and `extra`.
#[must_use]
pub fn is_handle(s: &str, max_len: usize, extra: &[char]) -> bool {
    !s.is_empty()
        && s.len() <= max_len
        && s.chars().all(|c| c.is_ascii_alphanumeric() || extra.contains(&c))
}

/// Parses `url` and checks its bare host against `hosts`.
pub(crate) fn url_on_hosts(url: &str, hosts: &[&str]) -> Option<Url> {
    let parsed = parse_target_url(url)?;
    let host = bare_host(&parsed)?;
    hosts.contains(&host.as_str()).then_some(parsed)
}

#[must_use]
pub fn profile_for(platform: Platform) -> Box<dyn PlatformProfile> {
    match platform {
        Platform::Instagram => Box::new(Instagram),
        Platform::Twitter => Box::new(Twitter),
        Platform::TikTok => Box::new(TikTok),
        Platform::Facebook => Box::new(Facebook),
    }
}

/// Finds the platform that claims `url` and the identity it parses.
#[must_use]
pub fn identify(url: &str) -> Option<(Platform, Identity)> {
    Platform::ALL.iter().find_map(|&p| {
        profile_for(p)
            .extract_identity(url)
            .map(|identity| (p, identity))
    })
}
