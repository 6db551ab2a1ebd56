//! Browser-session abstraction used by the platform scraper.

mod browserless;

use std::time::Duration;

use async_trait::async_trait;
use sociometer_store::Cookie;

use crate::error::DriverError;
use crate::extract::PageState;

pub use browserless::BrowserlessDriver;

pub const DEFAULT_VIEWPORT: (u32, u32) = (1366, 768);

/// One browser context. Implementations keep the current page between calls;
/// `snapshot` reflects the latest navigation plus any interaction since.
#[async_trait]
pub trait PageDriver: Send {
    /// Applies to subsequent navigations.
    async fn set_user_agent(&mut self, user_agent: &str) -> Result<(), DriverError>;

    async fn set_cookies(&mut self, cookies: &[Cookie]) -> Result<(), DriverError>;

    /// Cookies currently held by the browser context.
    async fn cookies(&mut self) -> Result<Vec<Cookie>, DriverError>;

    /// Loads `url`, discarding the previous page first. A
    /// [`DriverError::Timeout`] may still leave a partially loaded page of
    /// `url` available through [`PageDriver::snapshot`], never an earlier one.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), DriverError>;

    async fn snapshot(&mut self) -> Result<PageState, DriverError>;

    async fn scroll_by(&mut self, dy: i64) -> Result<(), DriverError>;

    async fn move_pointer(&mut self, x: u32, y: u32) -> Result<(), DriverError>;

    /// Clicks the first element matching `selector`; `Ok(false)` when nothing
    /// matched.
    async fn click(&mut self, selector: &str) -> Result<bool, DriverError>;

    fn viewport(&self) -> (u32, u32) {
        DEFAULT_VIEWPORT
    }
}
