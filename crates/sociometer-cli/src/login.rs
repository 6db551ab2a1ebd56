//! Manual login: park a browser on the platform's login page, wait for the
//! operator's ready marker, then save the session cookies. Cookies the
//! operator exported from another browser are applied first.

use std::time::Duration;

use sociometer_core::{AppConfig, Platform};
use sociometer_scraper::{
    profile_for, AuthGate, BrowserlessDriver, DriverError, FileSignal, PageDriver, PlatformProfile,
};
use sociometer_store::{Session, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoginOutcome {
    /// Cookies saved; the count is how many.
    Saved(usize),
    /// Ready was signalled but the browser holds no cookies beyond the stored
    /// session, so nothing was saved.
    Unchanged,
    /// The ready signal never came (cancelled or timed out).
    Abandoned,
}

/// # Errors
///
/// Returns an error if the page driver cannot be built, stale markers cannot
/// be cleared, the exported cookies are malformed, the session cannot be
/// saved, or the login produced no new cookies.
pub(crate) async fn run_login(
    config: &AppConfig,
    platform: Platform,
    max_wait: Option<Duration>,
) -> anyhow::Result<()> {
    let cancel = crate::cancel_on_ctrl_c();

    let mut gate = FileSignal::for_platform(
        &config.signal_dir,
        platform,
        Duration::from_millis(config.signal_poll_ms),
        cancel,
    );
    if let Some(max_wait) = max_wait {
        gate = gate.with_max_wait(max_wait);
    }
    tokio::fs::create_dir_all(&config.signal_dir).await?;
    gate.clear().await?;

    let profile = profile_for(platform);
    println!(
        "log in to {platform} at {}, export the browser's cookies to {}, then create {} (and {} when done)",
        profile.login_url(),
        gate.cookies_path().display(),
        gate.ready_path().display(),
        gate.close_path().display()
    );

    let mut driver = BrowserlessDriver::new(
        &config.browserless_url,
        config.browserless_token.as_deref(),
    )?;
    let sessions = SessionStore::new(&config.sessions_dir);
    let nav_timeout = Duration::from_secs(config.nav_timeout_secs);

    match login_session(&mut driver, profile.as_ref(), &gate, &sessions, nav_timeout).await? {
        LoginOutcome::Saved(n) => println!("saved {n} cookies for {platform}"),
        LoginOutcome::Abandoned => println!("login for {platform} abandoned; nothing saved"),
        LoginOutcome::Unchanged => anyhow::bail!(
            "no new cookies for {platform}; write the exported cookies to {} before creating {}",
            gate.cookies_path().display(),
            gate.ready_path().display()
        ),
    }
    Ok(())
}

/// Drives one manual login against any page driver and gate.
///
/// # Errors
///
/// Returns an error if the gate fails or the session cannot be saved.
pub(crate) async fn login_session<D: PageDriver + ?Sized>(
    driver: &mut D,
    profile: &dyn PlatformProfile,
    gate: &dyn AuthGate,
    sessions: &SessionStore,
    nav_timeout: Duration,
) -> anyhow::Result<LoginOutcome> {
    let platform = profile.platform();
    let _guard = sessions.lock(platform).await;

    let stored = sessions
        .load(platform)
        .await
        .map(|s| s.cookies)
        .unwrap_or_default();
    if !stored.is_empty() {
        driver.set_cookies(&stored).await?;
    }
    match driver.navigate(profile.login_url(), nav_timeout).await {
        Ok(()) => {}
        Err(e @ DriverError::Timeout { .. }) => {
            tracing::warn!(%platform, error = %e, "login page slow to load; continuing");
        }
        Err(e) => return Err(e.into()),
    }

    if !gate.wait_ready().await? {
        return Ok(LoginOutcome::Abandoned);
    }

    let imported = gate.imported_cookies().await?;
    if !imported.is_empty() {
        driver.set_cookies(&imported).await?;
    }
    let cookies = driver.cookies().await?;
    if cookies.is_empty() || cookies == stored {
        tracing::warn!(%platform, "no new cookies after manual login; session left as is");
        return Ok(LoginOutcome::Unchanged);
    }
    let count = cookies.len();
    sessions
        .save(platform, &Session::new(platform, cookies))
        .await?;
    tracing::info!(%platform, cookies = count, "session saved after manual login");

    if !gate.wait_close().await? {
        tracing::info!(%platform, "close signal not received; ending login session");
    }
    Ok(LoginOutcome::Saved(count))
}
