use chrono::{DateTime, Utc};
use sociometer_core::{Engagement, Platform, Post};

use super::node::PostNode;
use super::strategies::{container_text, content_hash_id, NodeChain};

/// Per-field strategy chains for one platform's post containers.
#[derive(Debug)]
pub struct PostFieldChains {
    pub post_id: NodeChain<String>,
    pub text: NodeChain<String>,
    pub timestamp: NodeChain<DateTime<Utc>>,
    pub url: NodeChain<String>,
    pub likes: NodeChain<u64>,
    pub comments: NodeChain<u64>,
    pub shares: NodeChain<u64>,
    pub views: NodeChain<u64>,
}

/// A post built from one container plus the optional fields whose strategies
/// all came up empty. Fields the platform has no strategy for are not listed.
#[derive(Debug, Clone)]
pub struct ExtractedPost {
    pub post: Post,
    pub missing: Vec<&'static str>,
}

impl Default for PostFieldChains {
    /// Chains that only know the generic fallbacks: container text and a
    /// content-hash ID.
    fn default() -> Self {
        Self {
            post_id: NodeChain::new("post_id").with("content_hash", content_hash_id),
            text: NodeChain::new("text").with("container_text", container_text()),
            timestamp: NodeChain::new("timestamp"),
            url: NodeChain::new("url"),
            likes: NodeChain::new("likes"),
            comments: NodeChain::new("comments"),
            shares: NodeChain::new("shares"),
            views: NodeChain::new("views"),
        }
    }
}

impl PostFieldChains {
    /// Runs every chain against `node`. Returns `None` when no `post_id`
    /// strategy succeeds; every other field degrades to `None`.
    #[must_use]
    pub fn build(&self, node: &PostNode, platform: Platform) -> Option<ExtractedPost> {
        let post_id = self.post_id.extract(node)?;
        let mut missing = Vec::new();

        let mut optional = |chain: &NodeChain<String>| {
            let value = chain.extract(node);
            if value.is_none() && !chain.is_empty() {
                missing.push(chain.field());
            }
            value
        };
        let text = optional(&self.text);
        let url = optional(&self.url);

        let timestamp = self.timestamp.extract(node);
        if timestamp.is_none() && !self.timestamp.is_empty() {
            missing.push(self.timestamp.field());
        }

        let mut count = |chain: &NodeChain<u64>| {
            let value = chain.extract(node);
            if value.is_none() && !chain.is_empty() {
                missing.push(chain.field());
            }
            value
        };
        let engagement = Engagement {
            likes: count(&self.likes),
            comments: count(&self.comments),
            shares: count(&self.shares),
            views: count(&self.views),
        };

        Some(ExtractedPost {
            post: Post {
                post_id,
                text: text.map(|t| t.trim().to_string()),
                timestamp,
                url,
                engagement,
                platform,
                media_present: node.has_media(),
            },
            missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::strategies::{css_count, first_datetime, link_capture, link_matching};
    use regex::Regex;
    use url::Url;

    #[test]
    fn missing_fields_are_reported_not_fatal() {
        let base = Url::parse("https://social.example/").unwrap();
        let node = PostNode::from_fragment(
            r#"<div><a href="/acme/post/5">link</a><p>Hello from the acme team</p><span class="l">7</span></div>"#,
            Some(&base),
        )
        .unwrap();

        let chains = PostFieldChains {
            post_id: NodeChain::new("post_id")
                .with("link", link_capture(Regex::new(r"/post/(\d+)").unwrap()))
                .with("content_hash", content_hash_id),
            url: NodeChain::new("url")
                .with("video_link", link_matching(Regex::new(r"/video/\d+").unwrap())),
            timestamp: NodeChain::new("timestamp").with("time", first_datetime()),
            likes: NodeChain::new("likes").with("css", css_count("span.l")),
            views: NodeChain::new("views").with("css", css_count("span.v")),
            ..PostFieldChains::default()
        };

        let extracted = chains.build(&node, Platform::Instagram).unwrap();
        assert_eq!(extracted.post.post_id, "5");
        assert_eq!(extracted.post.engagement.likes, Some(7));
        assert!(extracted.post.text.unwrap().contains("Hello from the acme team"));
        assert_eq!(extracted.missing, vec!["url", "timestamp", "views"]);
        assert_eq!(extracted.post.engagement.comments, None);
    }

    #[test]
    fn no_id_means_no_post() {
        let node = PostNode::from_fragment("<div></div>", None).unwrap();
        assert!(PostFieldChains::default()
            .build(&node, Platform::TikTok)
            .is_none());
    }
}
