//! On-disk result layout:
//!
//! ```text
//! {root}/{target_label}/{platform}/{identity}/
//!   posts.json     array of Post
//!   metadata.json  result summary + engagement metrics (written last)
//!   errors.json    only when the run recorded errors
//! ```
//!
//! `metadata.json` doubles as the completion marker used for resume.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sociometer_core::{
    EngagementMetrics, Identity, Platform, ScrapeResult, TerminalState,
};

use crate::atomic::write_json_atomic;
use crate::StoreError;

const POSTS_FILE: &str = "posts.json";
const METADATA_FILE: &str = "metadata.json";
const ERRORS_FILE: &str = "errors.json";
const RUN_SUMMARY_FILE: &str = "run_summary.json";

/// Contents of `metadata.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub url: String,
    pub target_label: String,
    pub identity: Identity,
    pub posts_scraped: usize,
    pub platform: Platform,
    pub scraped_at: DateTime<Utc>,
    pub engagement_metrics: EngagementMetrics,
    pub success: bool,
    pub outcome: TerminalState,
    pub attempts: u32,
    pub error_count: usize,
}

impl ResultMetadata {
    fn from_result(result: &ScrapeResult) -> Self {
        Self {
            url: result.url.clone(),
            target_label: result.target_label.clone(),
            identity: result.identity.clone(),
            posts_scraped: result.posts.len(),
            platform: result.platform,
            scraped_at: result.scraped_at,
            engagement_metrics: result.engagement_metrics.clone(),
            success: result.success,
            outcome: result.outcome,
            attempts: result.attempts,
            error_count: result.errors.len(),
        }
    }
}

/// Replaces anything that is not safe inside a single path component.
fn path_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Persistence Layer rooted at the configured output directory.
#[derive(Debug, Clone)]
pub struct OutputStore {
    root: PathBuf,
}

impl OutputStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn target_dir(&self, target_label: &str, platform: Platform, identity: &Identity) -> PathBuf {
        self.root
            .join(path_component(target_label))
            .join(platform.as_str())
            .join(path_component(identity.as_str()))
    }

    /// Returns the persisted metadata for a (target, platform, identity) if a
    /// completed result exists. Unreadable or malformed metadata counts as
    /// incomplete.
    pub async fn completed(
        &self,
        target_label: &str,
        platform: Platform,
        identity: &Identity,
    ) -> Option<ResultMetadata> {
        let path = self
            .target_dir(target_label, platform, identity)
            .join(METADATA_FILE);
        let bytes = tokio::fs::read(&path).await.ok()?;
        match serde_json::from_slice::<ResultMetadata>(&bytes) {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "ignoring unreadable metadata.json; target will be re-scraped"
                );
                None
            }
        }
    }

    /// Writes `posts.json`, `errors.json` (or removes a stale one) and finally
    /// `metadata.json`. Returns the target directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if any file cannot be serialized or written.
    /// Previously persisted files are never left half-written.
    pub async fn write_result(&self, result: &ScrapeResult) -> Result<PathBuf, StoreError> {
        let dir = self.target_dir(&result.target_label, result.platform, &result.identity);

        write_json_atomic(&dir.join(POSTS_FILE), &result.posts).await?;

        let errors_path = dir.join(ERRORS_FILE);
        if result.errors.is_empty() {
            match tokio::fs::remove_file(&errors_path).await {
                Ok(()) => tracing::debug!(path = %errors_path.display(), "removed stale errors.json"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io(errors_path, e)),
            }
        } else {
            write_json_atomic(&errors_path, &result.errors).await?;
        }

        let metadata = ResultMetadata::from_result(result);
        write_json_atomic(&dir.join(METADATA_FILE), &metadata).await?;

        tracing::info!(
            platform = %result.platform,
            target = %result.target_label,
            identity = %result.identity,
            posts = result.posts.len(),
            path = %dir.display(),
            "persisted scrape result"
        );
        Ok(dir)
    }

    /// Writes a batch run summary to `{root}/run_summary.json`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the summary cannot be serialized or written.
    pub async fn write_run_summary<T: Serialize>(&self, summary: &T) -> Result<PathBuf, StoreError> {
        let path = self.root.join(RUN_SUMMARY_FILE);
        write_json_atomic(&path, summary).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sociometer_core::{
        aggregate_engagement, Engagement, ErrorKind, ErrorRecord, Post,
    };

    fn result(errors: Vec<ErrorRecord>) -> ScrapeResult {
        let posts = vec![Post {
            post_id: "p1".to_string(),
            text: Some("hello world, first post".to_string()),
            timestamp: None,
            url: Some("https://x.com/acme/status/1".to_string()),
            engagement: Engagement {
                likes: Some(3),
                ..Engagement::default()
            },
            platform: Platform::Twitter,
            media_present: false,
        }];
        ScrapeResult {
            platform: Platform::Twitter,
            identity: Identity::new("acme"),
            target_label: "acme-co".to_string(),
            url: "https://x.com/acme".to_string(),
            success: true,
            outcome: TerminalState::PartiallySucceeded,
            attempts: 2,
            engagement_metrics: aggregate_engagement(&posts, Some(10)),
            posts,
            errors,
            output_path: None,
            scraped_at: Utc::now(),
        }
    }

    #[test]
    fn path_component_neutralizes_separators() {
        assert_eq!(path_component("a/b"), "a_b");
        assert_eq!(path_component(".."), "_");
        assert_eq!(path_component(""), "_");
        assert_eq!(path_component("jane.doe_1"), "jane.doe_1");
    }

    #[tokio::test]
    async fn writes_layout_and_marks_complete() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::new(dir.path());
        let r = result(vec![ErrorRecord::new(ErrorKind::Blocked, "captcha").at_attempt(1)]);

        let out = store.write_result(&r).await.unwrap();
        assert_eq!(out, dir.path().join("acme-co").join("twitter").join("acme"));
        assert!(out.join("posts.json").is_file());
        assert!(out.join("errors.json").is_file());

        let meta = store
            .completed("acme-co", Platform::Twitter, &Identity::new("acme"))
            .await
            .expect("metadata should be readable");
        assert_eq!(meta.posts_scraped, 1);
        assert_eq!(meta.platform, Platform::Twitter);
        assert_eq!(meta.engagement_metrics.total_likes, 3);
        assert_eq!(meta.error_count, 1);

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(out.join("metadata.json")).unwrap()).unwrap();
        for key in ["url", "target_label", "identity", "posts_scraped", "platform", "scraped_at", "engagement_metrics"] {
            assert!(raw.get(key).is_some(), "metadata.json missing {key}");
        }
        assert_eq!(raw["platform"], "twitter");
    }

    #[tokio::test]
    async fn rerun_without_errors_removes_stale_errors_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::new(dir.path());

        let out = store
            .write_result(&result(vec![ErrorRecord::new(ErrorKind::Timeout, "slow")]))
            .await
            .unwrap();
        assert!(out.join("errors.json").exists());

        store.write_result(&result(Vec::new())).await.unwrap();
        assert!(!out.join("errors.json").exists());
    }

    #[tokio::test]
    async fn incomplete_target_is_not_completed() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::new(dir.path());
        let target = store.target_dir("acme-co", Platform::Instagram, &Identity::new("acme"));
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("posts.json"), "[]").unwrap();
        assert!(store
            .completed("acme-co", Platform::Instagram, &Identity::new("acme"))
            .await
            .is_none());

        std::fs::write(target.join("metadata.json"), "{not json").unwrap();
        assert!(store
            .completed("acme-co", Platform::Instagram, &Identity::new("acme"))
            .await
            .is_none());
    }
}
