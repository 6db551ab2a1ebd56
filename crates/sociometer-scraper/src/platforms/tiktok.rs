use std::sync::LazyLock;

use regex::Regex;
use sociometer_core::{Identity, Platform};

use super::{is_handle, path_segments, url_on_hosts, PlatformProfile};
use crate::extract::strategies::{
    container_text, content_hash_id, css_attr, css_count, css_text, first_datetime, label_count,
    link_capture, link_matching, page_css_count, page_json_count, page_text_count, text_count,
};
use crate::extract::{NodeChain, PageChain, PostFieldChains};

/// Short links (`vm.tiktok.com/…`) are opaque redirects and carry no handle,
/// so only the main host is claimed.
const HOSTS: &[&str] = &["tiktok.com"];

const REHYDRATION_SCRIPT: &str = "script#__UNIVERSAL_DATA_FOR_REHYDRATION__";
const FOLLOWER_POINTERS: &[&str] = &[
    "/__DEFAULT_SCOPE__/webapp.user-detail/userInfo/stats/followerCount",
    "/__DEFAULT_SCOPE__/webapp.user-detail/userInfo/statsV2/followerCount",
];

static VIDEO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(?:video|photo)/(\d+)").expect("valid regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct TikTok;

impl PlatformProfile for TikTok {
    fn platform(&self) -> Platform {
        Platform::TikTok
    }

    fn extract_identity(&self, url: &str) -> Option<Identity> {
        let url = url_on_hosts(url, HOSTS)?;
        let handle = path_segments(&url)
            .first()
            .copied()
            .and_then(|seg| seg.strip_prefix('@'))?;
        is_handle(handle, 24, &['.', '_']).then(|| Identity::new(handle))
    }

    fn profile_url(&self, identity: &Identity) -> String {
        format!("https://www.tiktok.com/@{identity}")
    }

    fn login_url(&self) -> &'static str {
        "https://www.tiktok.com/login"
    }

    fn post_containers(&self) -> &'static [&'static str] {
        &[
            r#"[data-e2e="user-post-item"]"#,
            r#"div[class*="DivItemContainer"]"#,
            r#"a[href*="/video/"]"#,
        ]
    }

    fn post_fields(&self) -> PostFieldChains {
        PostFieldChains {
            post_id: NodeChain::new("post_id")
                .with("video_link", link_capture(VIDEO_ID_RE.clone()))
                .with("content_hash", content_hash_id),
            text: NodeChain::new("text")
                .with("image_alt", css_attr("img[alt]", "alt"))
                .with("description", css_text(r#"[data-e2e="user-post-item-desc"]"#))
                .with("container_text", container_text()),
            timestamp: NodeChain::new("timestamp").with("time_datetime", first_datetime()),
            url: NodeChain::new("url").with("video_link", link_matching(VIDEO_ID_RE.clone())),
            likes: NodeChain::new("likes")
                .with("aria_label", label_count(&["likes", "like"]))
                .with("visible_text", text_count(&["likes"])),
            comments: NodeChain::new("comments").with("aria_label", label_count(&["comments"])),
            shares: NodeChain::new("shares").with("aria_label", label_count(&["shares"])),
            views: NodeChain::new("views")
                .with("view_badge", css_count(r#"[data-e2e="video-views"]"#))
                .with("visible_text", text_count(&["views", "plays"])),
        }
    }

    fn followers_chain(&self) -> PageChain<u64> {
        PageChain::new("followers")
            .with("rehydration_json", page_json_count(REHYDRATION_SCRIPT, FOLLOWER_POINTERS))
            .with("followers_badge", page_css_count(r#"[data-e2e="followers-count"]"#))
            .with("visible_text", page_text_count(&["followers"]))
    }

    fn dismiss_selectors(&self) -> &'static [&'static str] {
        &[
            r#"[data-e2e="modal-close-inner-button"]"#,
            r#"div[role="dialog"] [aria-label="Close"]"#,
            r#"button[aria-label="Close"]"#,
        ]
    }

    fn block_markers(&self) -> &'static [&'static str] {
        &["drag the slider", "verify to continue", "select 2 objects that are the same shape"]
    }
}
