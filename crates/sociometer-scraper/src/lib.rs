pub mod block;
pub mod driver;
pub mod error;
pub mod extract;
pub mod platforms;
pub mod rate_limit;
pub mod retry;
pub mod scraper;
pub mod settings;
pub mod signal;
pub mod stealth;

pub use block::{BlockDetector, PageVerdict};
pub use driver::{BrowserlessDriver, PageDriver};
pub use error::{DriverError, ScrapeError, SignalError};
pub use extract::{FieldChain, PageState, PostFieldChains, PostNode};
pub use platforms::{identify, profile_for, PlatformProfile};
pub use rate_limit::RateLimiter;
pub use retry::{Backoff, RetryController, RetryPolicy, RetryReport, RetryState};
pub use scraper::{PlatformScraper, SocialScraper};
pub use settings::ScraperSettings;
pub use signal::{AuthGate, FileSignal};
pub use stealth::{ScrollDecision, ScrollTracker, Stealth, StealthSettings};
