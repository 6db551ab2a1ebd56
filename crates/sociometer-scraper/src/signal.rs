//! Manual-authentication gates.
//!
//! An operator logs in by hand in a visible browser and then drops a marker
//! file to say "ready"; a second marker says "close". The scraper only sees
//! the boolean outcome of each wait.
//!
//! When the browser the operator used is not the one the scraper drives, the
//! operator exports its cookies to `{platform}.cookies.json` before dropping
//! the ready marker. Both a bare cookie array and a `{"cookies": [...]}`
//! storage-state document are accepted.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use sociometer_core::Platform;
use sociometer_store::Cookie;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::SignalError;

#[async_trait]
pub trait AuthGate: Send + Sync {
    /// Blocks until the operator signals that authentication is complete.
    /// `Ok(false)` means the wait was cancelled or timed out.
    async fn wait_ready(&self) -> Result<bool, SignalError>;

    /// Blocks until the operator signals the session may be torn down.
    async fn wait_close(&self) -> Result<bool, SignalError>;

    /// Cookies the operator exported from their own browser, consumed on
    /// read. Empty when nothing was handed over.
    async fn imported_cookies(&self) -> Result<Vec<Cookie>, SignalError> {
        Ok(Vec::new())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CookieExport {
    Bare(Vec<Cookie>),
    StorageState { cookies: Vec<Cookie> },
}

/// File-marker gate: polls `{dir}/{platform}.ready` and `{dir}/{platform}.close`
/// and deletes each marker once seen.
#[derive(Debug, Clone)]
pub struct FileSignal {
    ready: PathBuf,
    close: PathBuf,
    cookies: PathBuf,
    poll: Duration,
    max_wait: Option<Duration>,
    cancel: CancellationToken,
}

impl FileSignal {
    pub fn for_platform(
        dir: impl AsRef<Path>,
        platform: Platform,
        poll: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let dir = dir.as_ref();
        Self {
            ready: dir.join(format!("{platform}.ready")),
            close: dir.join(format!("{platform}.close")),
            cookies: dir.join(format!("{platform}.cookies.json")),
            poll: poll.max(Duration::from_millis(10)),
            max_wait: None,
            cancel,
        }
    }

    /// Gives up after `max_wait` instead of waiting indefinitely.
    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    #[must_use]
    pub fn ready_path(&self) -> &Path {
        &self.ready
    }

    #[must_use]
    pub fn close_path(&self) -> &Path {
        &self.close
    }

    #[must_use]
    pub fn cookies_path(&self) -> &Path {
        &self.cookies
    }

    /// Removes leftover markers so an old signal cannot satisfy a new wait.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::Io`] if a marker exists but cannot be removed.
    pub async fn clear(&self) -> Result<(), SignalError> {
        for path in [&self.ready, &self.close] {
            remove_if_present(path).await?;
        }
        Ok(())
    }

    async fn wait_for(&self, marker: &Path) -> Result<bool, SignalError> {
        let deadline = self.max_wait.map(|d| Instant::now() + d);
        tracing::info!(marker = %marker.display(), "waiting for signal marker");

        loop {
            if remove_if_present(marker).await? {
                tracing::info!(marker = %marker.display(), "signal received");
                return Ok(true);
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::warn!(marker = %marker.display(), "gave up waiting for signal");
                return Ok(false);
            }
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::info!(marker = %marker.display(), "signal wait cancelled");
                    return Ok(false);
                }
                () = tokio::time::sleep(self.poll) => {}
            }
        }
    }
}

/// Deletes `path`; `Ok(false)` when it did not exist.
async fn remove_if_present(path: &Path) -> Result<bool, SignalError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(SignalError::Io {
            path: path.display().to_string(),
            source: e,
        }),
    }
}

#[async_trait]
impl AuthGate for FileSignal {
    async fn wait_ready(&self) -> Result<bool, SignalError> {
        self.wait_for(&self.ready).await
    }

    async fn wait_close(&self) -> Result<bool, SignalError> {
        self.wait_for(&self.close).await
    }

    async fn imported_cookies(&self) -> Result<Vec<Cookie>, SignalError> {
        let path = &self.cookies;
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(SignalError::Io {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };
        let export: CookieExport =
            serde_json::from_slice(&bytes).map_err(|e| SignalError::CookieExport {
                path: path.display().to_string(),
                source: e,
            })?;
        remove_if_present(path).await?;

        let mut cookies = match export {
            CookieExport::Bare(cookies) | CookieExport::StorageState { cookies } => cookies,
        };
        for cookie in &mut cookies {
            // Exporters write -1 for session cookies.
            if cookie.expires.is_some_and(|e| e < 0.0) {
                cookie.expires = None;
            }
        }
        tracing::info!(path = %path.display(), cookies = cookies.len(), "imported exported cookies");
        Ok(cookies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(dir: &Path) -> FileSignal {
        FileSignal::for_platform(
            dir,
            Platform::Instagram,
            Duration::from_millis(10),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn ready_marker_is_consumed() {
        let dir = tempfile::tempdir().unwrap();
        let signal = gate(dir.path());
        assert!(signal.ready_path().ends_with("instagram.ready"));

        let marker = signal.ready_path().to_path_buf();
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            tokio::fs::write(&marker, b"").await.unwrap();
        });

        assert!(signal.wait_ready().await.unwrap());
        writer.await.unwrap();
        assert!(!signal.ready_path().exists());
    }

    #[tokio::test]
    async fn close_marker_does_not_satisfy_ready() {
        let dir = tempfile::tempdir().unwrap();
        let signal = gate(dir.path()).with_max_wait(Duration::from_millis(50));
        std::fs::write(signal.close_path(), b"").unwrap();

        assert!(!signal.wait_ready().await.unwrap());
        assert!(signal.wait_close().await.unwrap());
    }

    #[tokio::test]
    async fn cancellation_ends_the_wait() {
        let dir = tempfile::tempdir().unwrap();
        let token = CancellationToken::new();
        let signal = FileSignal::for_platform(
            dir.path(),
            Platform::TikTok,
            Duration::from_millis(10),
            token.clone(),
        );

        let waiter = tokio::spawn(async move { signal.wait_close().await });
        tokio::time::sleep(Duration::from_millis(30)).await;
        token.cancel();
        assert!(!waiter.await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn imports_a_bare_cookie_array_once() {
        let dir = tempfile::tempdir().unwrap();
        let signal = gate(dir.path());
        assert!(signal.cookies_path().ends_with("instagram.cookies.json"));
        std::fs::write(
            signal.cookies_path(),
            r#"[{"name": "sessionid", "value": "s3cret", "domain": ".instagram.com", "httpOnly": true}]"#,
        )
        .unwrap();

        let cookies = signal.imported_cookies().await.unwrap();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "sessionid");
        assert!(cookies[0].http_only);
        assert!(!signal.cookies_path().exists());
        assert!(signal.imported_cookies().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn imports_storage_state_and_drops_session_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let signal = gate(dir.path());
        std::fs::write(
            signal.cookies_path(),
            r#"{"cookies": [{"name": "sid", "value": "a", "expires": -1, "sameSite": "Lax"}], "origins": []}"#,
        )
        .unwrap();

        let cookies = signal.imported_cookies().await.unwrap();
        assert_eq!(cookies[0].name, "sid");
        assert_eq!(cookies[0].expires, None);
    }

    #[tokio::test]
    async fn malformed_export_is_an_error_and_kept() {
        let dir = tempfile::tempdir().unwrap();
        let signal = gate(dir.path());
        std::fs::write(signal.cookies_path(), "not json").unwrap();

        let err = signal.imported_cookies().await.unwrap_err();
        assert!(matches!(err, SignalError::CookieExport { .. }));
        assert!(signal.cookies_path().exists());
    }

    #[tokio::test]
    async fn clear_removes_stale_markers() {
        let dir = tempfile::tempdir().unwrap();
        let signal = gate(dir.path());
        std::fs::write(signal.ready_path(), b"").unwrap();
        signal.clear().await.unwrap();
        assert!(!signal.ready_path().exists());
        signal.clear().await.unwrap();
    }
}
