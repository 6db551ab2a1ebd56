use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Platform;

/// Interaction counts for a single post. Any field may be absent when the
/// platform hides it or every extraction strategy came up empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub likes: Option<u64>,
    pub comments: Option<u64>,
    pub shares: Option<u64>,
    pub views: Option<u64>,
}

impl Engagement {
    /// `true` when no engagement field was extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.likes.is_none()
            && self.comments.is_none()
            && self.shares.is_none()
            && self.views.is_none()
    }
}

/// A single unit of platform content, normalized across platforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub post_id: String,
    pub text: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub url: Option<String>,
    pub engagement: Engagement,
    pub platform: Platform,
    pub media_present: bool,
}

/// Drops posts whose `post_id` was already seen (first occurrence wins) and
/// truncates to `cap` entries. Discovery order is preserved.
#[must_use]
pub fn dedup_posts(posts: Vec<Post>, cap: usize) -> Vec<Post> {
    let mut seen: HashSet<String> = HashSet::new();
    posts
        .into_iter()
        .filter(|p| seen.insert(p.post_id.clone()))
        .take(cap)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, likes: Option<u64>) -> Post {
        Post {
            post_id: id.to_string(),
            text: None,
            timestamp: None,
            url: None,
            engagement: Engagement {
                likes,
                ..Engagement::default()
            },
            platform: Platform::Instagram,
            media_present: false,
        }
    }

    #[test]
    fn dedup_keeps_first_seen() {
        let posts = vec![post("a", Some(1)), post("b", None), post("a", Some(99))];
        let out = dedup_posts(posts, 25);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].post_id, "a");
        assert_eq!(out[0].engagement.likes, Some(1));
        assert_eq!(out[1].post_id, "b");
    }

    #[test]
    fn dedup_applies_cap_after_removing_duplicates() {
        let posts = vec![post("a", None), post("a", None), post("b", None), post("c", None)];
        let out = dedup_posts(posts, 2);
        let ids: Vec<&str> = out.iter().map(|p| p.post_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn empty_engagement_is_valid() {
        let p = post("a", None);
        assert!(p.engagement.is_empty());
    }
}
