use std::sync::LazyLock;

use regex::Regex;
use sociometer_core::{Identity, Platform};

use super::{is_handle, path_segments, url_on_hosts, PlatformProfile};
use crate::extract::strategies::{
    container_text, content_hash_id, css_attr, css_text, first_datetime, label_count,
    link_capture, link_matching, page_meta_count, page_text_count, text_count,
};
use crate::extract::{parse_timestamp, NodeChain, PageChain, PostFieldChains};

const HOSTS: &[&str] = &["facebook.com", "fb.com"];

const RESERVED: &[&str] = &[
    "watch", "groups", "events", "marketplace", "gaming", "login", "login.php", "help",
    "settings", "hashtag", "share", "sharer", "sharer.php", "story.php", "photo.php",
    "permalink.php", "reel", "reels", "stories", "search", "notifications", "messages",
    "policies", "privacy", "home.php", "checkpoint", "recover",
];

static POSTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/posts/([A-Za-z0-9]+)").expect("valid regex"));
static STORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"story_fbid=([A-Za-z0-9]+)").expect("valid regex"));
static VIDEO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/videos/(\d+)").expect("valid regex"));
static PERMALINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/permalink/(\d+)").expect("valid regex"));
static POST_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/posts/[A-Za-z0-9]+|story_fbid=|/videos/\d+|/permalink/\d+").expect("valid regex")
});

#[derive(Debug, Clone, Copy, Default)]
pub struct Facebook;

impl PlatformProfile for Facebook {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    /// Accepts vanity names (`/acmeco`), numeric profile IDs
    /// (`/profile.php?id=…`) and the `/people/<name>/<id>` and
    /// `/pages/<name>/<id>` shapes; the numeric ID wins where present.
    fn extract_identity(&self, url: &str) -> Option<Identity> {
        let url = url_on_hosts(url, HOSTS)?;
        let segments = path_segments(&url);
        let first = *segments.first()?;

        if first.eq_ignore_ascii_case("profile.php") {
            let id = url
                .query_pairs()
                .find(|(k, _)| k == "id")
                .map(|(_, v)| v.into_owned())?;
            return (is_handle(&id, 25, &[]) && id.chars().all(|c| c.is_ascii_digit()))
                .then(|| Identity::new(id));
        }

        if matches!(first.to_ascii_lowercase().as_str(), "people" | "pages") {
            let id = *segments.get(2)?;
            return (is_handle(id, 25, &[]) && id.chars().all(|c| c.is_ascii_digit()))
                .then(|| Identity::new(id));
        }

        if first.eq_ignore_ascii_case("pg") {
            let name = *segments.get(1)?;
            return is_handle(name, 50, &['.', '-', '_']).then(|| Identity::new(name));
        }

        if RESERVED.contains(&first.to_ascii_lowercase().as_str())
            || !is_handle(first, 50, &['.', '-', '_'])
        {
            return None;
        }
        Some(Identity::new(first))
    }

    fn profile_url(&self, identity: &Identity) -> String {
        let id = identity.as_str();
        if id.chars().all(|c| c.is_ascii_digit()) {
            format!("https://www.facebook.com/profile.php?id={id}")
        } else {
            format!("https://www.facebook.com/{id}")
        }
    }

    fn login_url(&self) -> &'static str {
        "https://www.facebook.com/login/"
    }

    fn post_containers(&self) -> &'static [&'static str] {
        &[
            r#"div[role="article"][aria-posinset]"#,
            r#"div[role="article"]"#,
            r#"div[data-pagelet^="TimelineFeedUnit"]"#,
        ]
    }

    fn post_fields(&self) -> PostFieldChains {
        let utime = css_attr("abbr[data-utime]", "data-utime");
        PostFieldChains {
            post_id: NodeChain::new("post_id")
                .with("posts_link", link_capture(POSTS_RE.clone()))
                .with("story_fbid", link_capture(STORY_RE.clone()))
                .with("video_link", link_capture(VIDEO_RE.clone()))
                .with("permalink", link_capture(PERMALINK_RE.clone()))
                .with("content_hash", content_hash_id),
            text: NodeChain::new("text")
                .with("message_preview", css_text(r#"div[data-ad-preview="message"]"#))
                .with("comet_message", css_text(r#"div[data-ad-comet-preview="message"]"#))
                .with("user_content", css_text("div.userContent"))
                .with("container_text", container_text()),
            timestamp: NodeChain::new("timestamp")
                .with("time_datetime", first_datetime())
                .with("abbr_utime", move |node| utime(node).as_deref().and_then(parse_timestamp)),
            url: NodeChain::new("url").with("post_link", link_matching(POST_URL_RE.clone())),
            likes: NodeChain::new("likes")
                .with("aria_label", label_count(&["reactions", "reaction", "likes", "like"]))
                .with("visible_text", text_count(&["reactions", "likes"])),
            comments: NodeChain::new("comments")
                .with("visible_text", text_count(&["comments", "comment"])),
            shares: NodeChain::new("shares").with("visible_text", text_count(&["shares", "share"])),
            views: NodeChain::new("views").with("visible_text", text_count(&["views", "plays"])),
        }
    }

    fn followers_chain(&self) -> PageChain<u64> {
        PageChain::new("followers")
            .with("og_description", page_meta_count("og:description", &["followers"]))
            .with("meta_description", page_meta_count("description", &["followers"]))
            .with("visible_text", page_text_count(&["followers"]))
    }

    fn dismiss_selectors(&self) -> &'static [&'static str] {
        &[
            r#"div[role="dialog"] div[aria-label="Close"]"#,
            r#"[aria-label="Decline optional cookies"]"#,
            r#"[aria-label="Only allow essential cookies"]"#,
            r#"[aria-label="Close"]"#,
        ]
    }

    fn block_markers(&self) -> &'static [&'static str] {
        &[
            "you can't use this feature right now",
            "your account has been locked",
            "this content isn't available right now",
        ]
    }
}
