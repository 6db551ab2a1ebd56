use std::sync::LazyLock;

use regex::Regex;
use sociometer_core::{Identity, Platform};

use super::{is_handle, path_segments, url_on_hosts, PlatformProfile};
use crate::extract::strategies::{
    container_text, content_hash_id, css_count, css_text, first_datetime, label_count,
    link_capture, link_matching, page_css_count, page_text_count, text_count,
};
use crate::extract::{NodeChain, PageChain, PostFieldChains};

const HOSTS: &[&str] = &["x.com", "twitter.com"];

const RESERVED: &[&str] = &[
    "i", "home", "explore", "search", "notifications", "messages", "settings", "login",
    "logout", "signup", "hashtag", "intent", "share", "tos", "privacy", "compose", "account",
];

static STATUS_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/status/(\d+)").expect("valid regex"));

static STATUS_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/status/\d+/?$").expect("valid regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct Twitter;

impl PlatformProfile for Twitter {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    fn extract_identity(&self, url: &str) -> Option<Identity> {
        let url = url_on_hosts(url, HOSTS)?;
        let first = *path_segments(&url).first()?;
        let handle = first.trim_start_matches('@');
        if RESERVED.contains(&handle.to_ascii_lowercase().as_str())
            || !is_handle(handle, 15, &['_'])
        {
            return None;
        }
        Some(Identity::new(handle))
    }

    fn profile_url(&self, identity: &Identity) -> String {
        format!("https://x.com/{identity}")
    }

    fn login_url(&self) -> &'static str {
        "https://x.com/i/flow/login"
    }

    fn post_containers(&self) -> &'static [&'static str] {
        &[
            r#"article[data-testid="tweet"]"#,
            r#"article[role="article"]"#,
            r#"div[data-testid="cellInnerDiv"]"#,
        ]
    }

    fn post_fields(&self) -> PostFieldChains {
        PostFieldChains {
            post_id: NodeChain::new("post_id")
                .with("status_link", link_capture(STATUS_ID_RE.clone()))
                .with("content_hash", content_hash_id),
            text: NodeChain::new("text")
                .with("tweet_text", css_text(r#"div[data-testid="tweetText"]"#))
                .with("lang_block", css_text("div[lang]"))
                .with("container_text", container_text()),
            timestamp: NodeChain::new("timestamp").with("time_datetime", first_datetime()),
            url: NodeChain::new("url").with("status_link", link_matching(STATUS_URL_RE.clone())),
            likes: NodeChain::new("likes")
                .with("button_count", css_count(r#"[data-testid="like"] span, [data-testid="unlike"] span"#))
                .with("aria_label", label_count(&["likes", "like"]))
                .with("visible_text", text_count(&["likes"])),
            comments: NodeChain::new("comments")
                .with("button_count", css_count(r#"[data-testid="reply"] span"#))
                .with("aria_label", label_count(&["replies", "reply"])),
            shares: NodeChain::new("shares")
                .with("button_count", css_count(r#"[data-testid="retweet"] span, [data-testid="unretweet"] span"#))
                .with("aria_label", label_count(&["reposts", "repost", "retweets", "retweet"])),
            views: NodeChain::new("views")
                .with("analytics_link", css_count(r#"a[href$="/analytics"] span"#))
                .with("aria_label", label_count(&["views"])),
        }
    }

    fn followers_chain(&self) -> PageChain<u64> {
        PageChain::new("followers")
            .with("verified_followers_link", page_css_count(r#"a[href$="/verified_followers"] span"#))
            .with("followers_link", page_css_count(r#"a[href$="/followers"] span"#))
            .with("visible_text", page_text_count(&["followers"]))
    }

    fn dismiss_selectors(&self) -> &'static [&'static str] {
        &[
            r#"[data-testid="app-bar-close"]"#,
            r#"[data-testid="xMigrationBottomBar"] button"#,
            r#"div[role="dialog"] [aria-label="Close"]"#,
            r#"[data-testid="sheetDialog"] [role="button"]"#,
        ]
    }

    fn block_markers(&self) -> &'static [&'static str] {
        &[
            "something went wrong. try reloading",
            "this account is temporarily restricted",
        ]
    }
}
