use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if a value is present but invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("SOCIOMETER_ENV", "development"))?;
    let log_level = or_default("SOCIOMETER_LOG_LEVEL", "info");

    let output_dir = PathBuf::from(or_default("SOCIOMETER_OUTPUT_DIR", "./output"));
    let sessions_dir = PathBuf::from(or_default("SOCIOMETER_SESSIONS_DIR", "./sessions"));
    let signal_dir = PathBuf::from(or_default("SOCIOMETER_SIGNAL_DIR", "./signals"));
    let signal_poll_ms = parse_u64("SOCIOMETER_SIGNAL_POLL_MS", "1000")?;
    let targets_path = PathBuf::from(or_default(
        "SOCIOMETER_TARGETS_PATH",
        "./config/targets.yaml",
    ));

    let browserless_url = or_default("SOCIOMETER_BROWSERLESS_URL", "http://localhost:3000");
    let browserless_token = lookup("SOCIOMETER_BROWSERLESS_TOKEN")
        .ok()
        .filter(|t| !t.is_empty());

    let request_delay_ms = parse_u64("SOCIOMETER_REQUEST_DELAY_MS", "3000")?;
    let nav_timeout_secs = parse_u64("SOCIOMETER_NAV_TIMEOUT_SECS", "30")?;
    let max_retries = parse_u32("SOCIOMETER_MAX_RETRIES", "3")?;
    if max_retries == 0 {
        return Err(invalid(
            "SOCIOMETER_MAX_RETRIES",
            "must allow at least one attempt".to_string(),
        ));
    }
    let backoff_base_ms = parse_u64("SOCIOMETER_BACKOFF_BASE_MS", "1000")?;
    let backoff_jitter_ms = parse_u64("SOCIOMETER_BACKOFF_JITTER_MS", "1000")?;
    let max_posts = parse_usize("SOCIOMETER_MAX_POSTS", "25")?;
    let min_post_text_len = parse_usize("SOCIOMETER_MIN_POST_TEXT_LEN", "10")?;

    Ok(AppConfig {
        env,
        log_level,
        output_dir,
        sessions_dir,
        signal_dir,
        signal_poll_ms,
        targets_path,
        browserless_url,
        browserless_token,
        request_delay_ms,
        nav_timeout_secs,
        max_retries,
        backoff_base_ms,
        backoff_jitter_ms,
        max_posts,
        min_post_text_len,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SOCIOMETER_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
