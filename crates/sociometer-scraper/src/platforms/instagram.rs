use std::sync::LazyLock;

use regex::Regex;
use sociometer_core::{Identity, Platform};

use super::{is_handle, path_segments, url_on_hosts, PlatformProfile};
use crate::extract::strategies::{
    container_text, content_hash_id, css_attr, first_datetime, label_count, link_capture,
    link_matching, page_attr_count, page_meta_count, page_text_count, text_count,
};
use crate::extract::{NodeChain, PageChain, PostFieldChains};

const HOSTS: &[&str] = &["instagram.com", "instagr.am"];

const RESERVED: &[&str] = &[
    "p", "reel", "reels", "tv", "explore", "accounts", "stories", "direct", "about", "legal",
    "developer", "web", "api", "challenge", "privacy", "emails", "session", "login",
];

static POST_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(?:p|reel|tv)/([A-Za-z0-9_-]+)").expect("valid regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct Instagram;

impl PlatformProfile for Instagram {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    fn extract_identity(&self, url: &str) -> Option<Identity> {
        let url = url_on_hosts(url, HOSTS)?;
        let first = *path_segments(&url).first()?;
        if RESERVED.contains(&first.to_ascii_lowercase().as_str())
            || !is_handle(first, 30, &['.', '_'])
        {
            return None;
        }
        Some(Identity::new(first))
    }

    fn profile_url(&self, identity: &Identity) -> String {
        format!("https://www.instagram.com/{identity}/")
    }

    fn login_url(&self) -> &'static str {
        "https://www.instagram.com/accounts/login/"
    }

    fn post_containers(&self) -> &'static [&'static str] {
        &[
            r#"a[href*="/p/"], a[href*="/reel/"]"#,
            r#"article div[role="button"]"#,
            "article",
        ]
    }

    fn post_fields(&self) -> PostFieldChains {
        PostFieldChains {
            post_id: NodeChain::new("post_id")
                .with("shortcode_link", link_capture(POST_ID_RE.clone()))
                .with("content_hash", content_hash_id),
            text: NodeChain::new("text")
                .with("image_alt", css_attr("img[alt]", "alt"))
                .with("container_text", container_text()),
            timestamp: NodeChain::new("timestamp").with("time_datetime", first_datetime()),
            url: NodeChain::new("url").with("post_link", link_matching(POST_ID_RE.clone())),
            likes: NodeChain::new("likes")
                .with("aria_label", label_count(&["likes", "like"]))
                .with("visible_text", text_count(&["likes"])),
            comments: NodeChain::new("comments")
                .with("aria_label", label_count(&["comments", "comment"]))
                .with("visible_text", text_count(&["comments"])),
            shares: NodeChain::new("shares"),
            views: NodeChain::new("views")
                .with("aria_label", label_count(&["views", "plays"]))
                .with("visible_text", text_count(&["views", "plays"])),
        }
    }

    fn followers_chain(&self) -> PageChain<u64> {
        PageChain::new("followers")
            .with("og_description", page_meta_count("og:description", &["followers"]))
            .with("followers_link_title", page_attr_count(r#"a[href$="/followers/"] span[title]"#, "title"))
            .with("visible_text", page_text_count(&["followers"]))
    }

    fn dismiss_selectors(&self) -> &'static [&'static str] {
        &[
            r#"div[role="dialog"] svg[aria-label="Close"]"#,
            r#"div[role="dialog"] [aria-label="Close"]"#,
            r#"button[aria-label="Close"]"#,
        ]
    }

    fn block_markers(&self) -> &'static [&'static str] {
        &["challenge_required", "we suspended your account"]
    }
}
