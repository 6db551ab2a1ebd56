use sociometer_core::Platform;
use sociometer_store::StoreError;
use thiserror::Error;

/// Conditions that prevent any output for a target. Everything else
/// (blocks, timeouts, network failures) is folded into `ScrapeResult.errors`.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid {platform} target \"{raw}\" for {target_label}: no profile identity found")]
    InvalidTarget {
        platform: Platform,
        target_label: String,
        raw: String,
    },

    #[error("failed to persist {platform} result for {target_label}: {source}")]
    Persistence {
        platform: Platform,
        target_label: String,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("navigation to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("unexpected HTTP status {status} from renderer for {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("no page has been loaded yet")]
    NoPage,

    #[error("browser session closed: {0}")]
    Closed(String),
}

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("failed to access signal marker {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse exported cookies {path}: {source}")]
    CookieExport {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
