//! Engagement aggregation over a post collection.
//!
//! Averages divide by the number of posts where the field was present, not by
//! the full post count, so unmeasured posts do not dilute them. A field that no
//! post carries has a `None` average.

use serde::{Deserialize, Serialize};

use crate::Post;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub followers_count: Option<u64>,
    pub total_likes: u64,
    pub total_comments: u64,
    pub total_shares: u64,
    pub total_views: u64,
    pub avg_likes: Option<f64>,
    pub avg_comments: Option<f64>,
    pub avg_shares: Option<f64>,
    pub avg_views: Option<f64>,
    /// `(likes + comments + shares) / views * 100`; `None` when no views.
    pub avg_engagement_rate: Option<f64>,
    pub posts_analyzed: usize,
    pub likes_analyzed: usize,
    pub comments_analyzed: usize,
    pub shares_analyzed: usize,
    pub views_analyzed: usize,
}

/// Sum and present-count of one optional field.
fn tally<F>(posts: &[Post], field: F) -> (u64, usize)
where
    F: Fn(&Post) -> Option<u64>,
{
    posts
        .iter()
        .filter_map(field)
        .fold((0u64, 0usize), |(sum, n), v| (sum.saturating_add(v), n + 1))
}

#[allow(clippy::cast_precision_loss)]
fn average(total: u64, present: usize) -> Option<f64> {
    (present > 0).then(|| total as f64 / present as f64)
}

/// Recomputes all aggregates from scratch for `posts`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate_engagement(posts: &[Post], followers_count: Option<u64>) -> EngagementMetrics {
    let (total_likes, likes_analyzed) = tally(posts, |p| p.engagement.likes);
    let (total_comments, comments_analyzed) = tally(posts, |p| p.engagement.comments);
    let (total_shares, shares_analyzed) = tally(posts, |p| p.engagement.shares);
    let (total_views, views_analyzed) = tally(posts, |p| p.engagement.views);

    let interactions = total_likes
        .saturating_add(total_comments)
        .saturating_add(total_shares);
    let avg_engagement_rate =
        (total_views > 0).then(|| interactions as f64 / total_views as f64 * 100.0);

    EngagementMetrics {
        followers_count,
        total_likes,
        total_comments,
        total_shares,
        total_views,
        avg_likes: average(total_likes, likes_analyzed),
        avg_comments: average(total_comments, comments_analyzed),
        avg_shares: average(total_shares, shares_analyzed),
        avg_views: average(total_views, views_analyzed),
        avg_engagement_rate,
        posts_analyzed: posts.len(),
        likes_analyzed,
        comments_analyzed,
        shares_analyzed,
        views_analyzed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Engagement, Platform};

    fn post(likes: Option<u64>, comments: Option<u64>, views: Option<u64>) -> Post {
        Post {
            post_id: format!("{likes:?}-{comments:?}-{views:?}"),
            text: None,
            timestamp: None,
            url: None,
            engagement: Engagement {
                likes,
                comments,
                shares: None,
                views,
            },
            platform: Platform::Twitter,
            media_present: false,
        }
    }

    #[test]
    fn totals_and_averages_ignore_missing_values() {
        let posts = vec![
            post(Some(10), None, Some(100)),
            post(Some(20), Some(4), Some(200)),
            post(None, None, Some(0)),
        ];
        let m = aggregate_engagement(&posts, Some(5_000));

        assert_eq!(m.total_likes, 30);
        assert_eq!(m.likes_analyzed, 2);
        assert_eq!(m.avg_likes, Some(15.0));
        assert_eq!(m.total_comments, 4);
        assert_eq!(m.comments_analyzed, 1);
        assert_eq!(m.avg_comments, Some(4.0));
        assert_eq!(m.total_views, 300);
        assert_eq!(m.views_analyzed, 3);
        assert_eq!(m.avg_views, Some(100.0));
        assert_eq!(m.posts_analyzed, 3);
        assert_eq!(m.followers_count, Some(5_000));
    }

    #[test]
    fn absent_field_has_null_average_not_zero() {
        let posts = vec![post(Some(1), None, None)];
        let m = aggregate_engagement(&posts, None);
        assert_eq!(m.total_shares, 0);
        assert!(m.avg_shares.is_none());
        assert!(m.avg_comments.is_none());
    }

    #[test]
    fn engagement_rate_is_null_without_views() {
        let posts = vec![post(Some(50), Some(5), Some(0)), post(Some(3), None, None)];
        let m = aggregate_engagement(&posts, None);
        assert!(m.avg_engagement_rate.is_none());
    }

    #[test]
    fn engagement_rate_uses_totals() {
        let posts = vec![post(Some(10), Some(5), Some(100)), post(Some(15), None, Some(400))];
        let m = aggregate_engagement(&posts, None);
        let rate = m.avg_engagement_rate.unwrap();
        assert!((rate - 6.0).abs() < 1e-9, "expected 6.0, got {rate}");
    }

    #[test]
    fn empty_collection_produces_empty_metrics() {
        let m = aggregate_engagement(&[], None);
        assert_eq!(m, EngagementMetrics::default());
    }

    #[test]
    fn serializes_dashboard_fields() {
        let m = aggregate_engagement(&[post(Some(1), None, Some(10))], Some(7));
        let v = serde_json::to_value(&m).unwrap();
        for key in [
            "followers_count",
            "total_likes",
            "total_comments",
            "total_shares",
            "total_views",
            "avg_engagement_rate",
            "posts_analyzed",
        ] {
            assert!(v.get(key).is_some(), "missing {key}");
        }
        assert!(v["avg_comments"].is_null());
    }
}
