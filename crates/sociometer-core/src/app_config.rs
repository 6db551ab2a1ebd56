use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub output_dir: PathBuf,
    pub sessions_dir: PathBuf,
    pub signal_dir: PathBuf,
    pub signal_poll_ms: u64,
    pub targets_path: PathBuf,
    pub browserless_url: String,
    pub browserless_token: Option<String>,
    pub request_delay_ms: u64,
    pub nav_timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_jitter_ms: u64,
    pub max_posts: usize,
    pub min_post_text_len: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("output_dir", &self.output_dir)
            .field("sessions_dir", &self.sessions_dir)
            .field("signal_dir", &self.signal_dir)
            .field("signal_poll_ms", &self.signal_poll_ms)
            .field("targets_path", &self.targets_path)
            .field("browserless_url", &self.browserless_url)
            .field(
                "browserless_token",
                &self.browserless_token.as_ref().map(|_| "[redacted]"),
            )
            .field("request_delay_ms", &self.request_delay_ms)
            .field("nav_timeout_secs", &self.nav_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .field("backoff_jitter_ms", &self.backoff_jitter_ms)
            .field("max_posts", &self.max_posts)
            .field("min_post_text_len", &self.min_post_text_len)
            .finish()
    }
}
