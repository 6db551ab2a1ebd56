//! Block and login-wall classification.
//!
//! Rules are checked in priority order and the first match wins: block URL
//! markers, block text markers, login URL markers, login text markers.
//!
//! URL markers are path prefixes matched on whole segments, so
//! `/checkpoint/123` is a block wall but a profile at `/CheckPointSW` is not.

use url::Url;

use crate::extract::PageState;

const BLOCK_URL_MARKERS: &[&str] = &["/challenge", "/checkpoint", "/captcha"];

const BLOCK_TEXT_MARKERS: &[&str] = &[
    "captcha",
    "checkpoint",
    "verify your identity",
    "unusual activity",
    "suspicious activity",
    "confirm you're not a robot",
    "confirm you are not a robot",
    "prove you're not a robot",
    "are you a robot",
    "too many requests",
    "rate limit exceeded",
    "temporarily blocked",
    "please wait a few minutes before you try again",
];

const LOGIN_URL_MARKERS: &[&str] = &[
    "/login",
    "/login.php",
    "/accounts/login",
    "/accounts/signup",
    "/i/flow/login",
    "/i/flow/signup",
    "/signup",
];

const LOGIN_TEXT_MARKERS: &[&str] = &[
    "log in to continue",
    "log in to see",
    "log into facebook",
    "sign in to continue",
    "sign in to see",
    "you must log in",
    "you must be logged in",
    "login to continue",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageVerdict {
    Ok,
    Blocked { marker: String },
    LoginRequired { marker: String },
}

impl PageVerdict {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    BlockUrl,
    BlockText,
    LoginUrl,
    LoginText,
}

/// Prioritized pattern matcher over page URL and visible text.
#[derive(Debug, Clone)]
pub struct BlockDetector {
    rules: Vec<(Rule, String)>,
}

impl Default for BlockDetector {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl BlockDetector {
    /// Builds the detector with the shared vocabulary plus `extra_block_text`
    /// markers for one platform. Extra markers rank after the shared block
    /// text markers and before any login rule.
    #[must_use]
    pub fn new(extra_block_text: &[&str]) -> Self {
        let mut rules = Vec::new();
        let mut push = |rule: Rule, markers: &[&str]| {
            rules.extend(markers.iter().map(|m| (rule, m.to_lowercase())));
        };
        push(Rule::BlockUrl, BLOCK_URL_MARKERS);
        push(Rule::BlockText, BLOCK_TEXT_MARKERS);
        push(Rule::BlockText, extra_block_text);
        push(Rule::LoginUrl, LOGIN_URL_MARKERS);
        push(Rule::LoginText, LOGIN_TEXT_MARKERS);
        Self { rules }
    }

    #[must_use]
    pub fn classify(&self, page: &PageState) -> PageVerdict {
        let path = url_path(&page.url);
        let text = page.text.to_lowercase().replace('\u{2019}', "'");

        for (rule, marker) in &self.rules {
            let hit = match rule {
                Rule::BlockUrl | Rule::LoginUrl => path_has_prefix(&path, marker),
                Rule::BlockText | Rule::LoginText => text.contains(marker.as_str()),
            };
            if !hit {
                continue;
            }
            let marker = marker.clone();
            return match rule {
                Rule::BlockUrl | Rule::BlockText => PageVerdict::Blocked { marker },
                Rule::LoginUrl | Rule::LoginText => PageVerdict::LoginRequired { marker },
            };
        }
        PageVerdict::Ok
    }
}

/// Lowercased path of `raw`, without query or fragment. Scheme-less URLs
/// (`x.com/acme`) are accepted.
fn url_path(raw: &str) -> String {
    let parsed = Url::parse(raw).or_else(|_| Url::parse(&format!("https://{raw}")));
    match parsed {
        Ok(url) => url.path().to_lowercase(),
        Err(_) => {
            let rest = raw.split(['?', '#']).next().unwrap_or_default();
            rest.find('/')
                .map_or_else(|| "/".to_string(), |i| rest[i..].to_lowercase())
        }
    }
}

/// `marker` equals the start of `path` up to a segment boundary.
fn path_has_prefix(path: &str, marker: &str) -> bool {
    path.strip_prefix(marker)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str, body: &str) -> PageState {
        PageState::new(url, format!("<html><body>{body}</body></html>"))
    }

    #[test]
    fn identity_verification_is_blocked() {
        let d = BlockDetector::default();
        let v = d.classify(&page("https://social.example/acme", "<p>Please Verify Your Identity</p>"));
        assert_eq!(
            v,
            PageVerdict::Blocked {
                marker: "verify your identity".to_string()
            }
        );
    }

    #[test]
    fn clean_page_is_ok() {
        let d = BlockDetector::default();
        let v = d.classify(&page("https://social.example/acme", "<p>Our new spring line is here</p>"));
        assert!(v.is_ok());
    }

    #[test]
    fn login_redirect_is_login_required() {
        let d = BlockDetector::default();
        let v = d.classify(&page("https://www.instagram.com/accounts/login/?next=/acme/", "<p>Welcome</p>"));
        assert!(matches!(v, PageVerdict::LoginRequired { .. }));
    }

    #[test]
    fn block_outranks_login() {
        let d = BlockDetector::default();
        let v = d.classify(&page(
            "https://social.example/login",
            "<p>We detected unusual activity. Log in to continue.</p>",
        ));
        assert_eq!(
            v,
            PageVerdict::Blocked {
                marker: "unusual activity".to_string()
            }
        );
    }

    #[test]
    fn block_url_outranks_block_text() {
        let d = BlockDetector::default();
        let v = d.classify(&page("https://social.example/checkpoint/123", "<p>too many requests</p>"));
        assert_eq!(
            v,
            PageVerdict::Blocked {
                marker: "/checkpoint".to_string()
            }
        );
    }

    #[test]
    fn handles_starting_with_marker_words_are_ok() {
        let d = BlockDetector::default();
        for url in [
            "https://x.com/CheckPointSW",
            "https://x.com/LoginRadius",
            "https://www.instagram.com/signupgenius/",
            "https://www.tiktok.com/@captchaking",
            "https://x.com/acme?ref=login",
        ] {
            let v = d.classify(&page(url, "<p>Latest updates from the team</p>"));
            assert!(v.is_ok(), "{url} classified as {v:?}");
        }
    }

    #[test]
    fn login_paths_match_on_segment_boundaries() {
        let d = BlockDetector::default();
        for (url, marker) in [
            ("https://x.com/i/flow/login", "/i/flow/login"),
            ("https://www.facebook.com/login.php?next=%2Facme", "/login.php"),
            ("https://www.tiktok.com/login/phone-or-email", "/login"),
            ("https://www.instagram.com/accounts/signup/", "/accounts/signup"),
        ] {
            assert_eq!(
                d.classify(&page(url, "<p>Welcome</p>")),
                PageVerdict::LoginRequired {
                    marker: marker.to_string()
                },
                "{url}"
            );
        }
    }

    #[test]
    fn challenge_path_is_blocked() {
        let d = BlockDetector::default();
        let v = d.classify(&page("https://www.instagram.com/challenge/?next=/acme/", "<p>Hi</p>"));
        assert_eq!(
            v,
            PageVerdict::Blocked {
                marker: "/challenge".to_string()
            }
        );
    }

    #[test]
    fn text_hidden_in_scripts_is_ignored() {
        let d = BlockDetector::default();
        let v = d.classify(&PageState::new(
            "https://social.example/acme",
            "<html><body><script>var captcha = false;</script><p>hello</p></body></html>",
        ));
        assert!(v.is_ok());
    }

    #[test]
    fn platform_markers_extend_vocabulary() {
        let d = BlockDetector::new(&["Something went wrong. Try reloading"]);
        let v = d.classify(&page("https://x.com/acme", "<div>Something went wrong. Try reloading.</div>"));
        assert!(matches!(v, PageVerdict::Blocked { .. }));
    }

    #[test]
    fn curly_apostrophes_match() {
        let d = BlockDetector::default();
        let v = d.classify(&page("https://social.example/acme", "<p>Confirm you\u{2019}re not a robot</p>"));
        assert!(matches!(v, PageVerdict::Blocked { .. }));
    }
}
