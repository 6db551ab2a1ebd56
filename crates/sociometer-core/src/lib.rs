pub mod app_config;
pub mod config;
pub mod error;
pub mod metrics;
pub mod platform;
pub mod post;
pub mod result;
pub mod targets;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, CoreError};
pub use metrics::{aggregate_engagement, EngagementMetrics};
pub use platform::{Identity, Platform};
pub use post::{dedup_posts, Engagement, Post};
pub use result::{
    AttemptOutcome, ErrorKind, ErrorRecord, ScrapeAttempt, ScrapeResult, TerminalState,
};
pub use targets::{load_targets, TargetAccount, TargetConfig, TargetJob, TargetsFile};
