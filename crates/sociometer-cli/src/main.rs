mod login;
mod runner;

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use sociometer_core::{AppConfig, Platform};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sociometer")]
#[command(about = "Social media engagement scraper")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape every account in the targets file, skipping completed results
    Run {
        /// Targets file; defaults to SOCIOMETER_TARGETS_PATH
        #[arg(long)]
        targets: Option<PathBuf>,

        /// Only scrape accounts on this platform
        #[arg(long)]
        platform: Option<Platform>,

        /// Only scrape this target label
        #[arg(long)]
        label: Option<String>,

        /// Post cap per account; defaults to SOCIOMETER_MAX_POSTS
        #[arg(long)]
        max_posts: Option<usize>,

        /// Wait on the login signal marker when a login wall cannot be dismissed
        #[arg(long)]
        manual_login: bool,
    },
    /// Open a platform's login page and save the session once signalled
    Login {
        #[arg(long)]
        platform: Platform,

        /// Stop waiting for each signal after this many seconds
        #[arg(long)]
        max_wait_secs: Option<u64>,
    },
    /// Show which platform claims a URL and the identity parsed from it
    Identify { url: String },
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Loads configuration and installs logging. `identify` runs without either.
fn load_config() -> anyhow::Result<AppConfig> {
    let config = sociometer_core::load_app_config()?;
    init_tracing(&config.log_level);
    Ok(config)
}

fn describe_url(url: &str) -> String {
    match sociometer_scraper::identify(url) {
        Some((platform, identity)) => format!("{platform}\t{identity}"),
        None => format!("no supported platform recognizes {url}"),
    }
}

/// Cancels the returned token once `signal` resolves.
fn cancel_on<F>(signal: F) -> CancellationToken
where
    F: Future<Output = std::io::Result<()>> + Send + 'static,
{
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if signal.await.is_ok() {
                tracing::info!("interrupt received; stopping after in-flight work");
                cancel.cancel();
            }
        }
    });
    cancel
}

pub(crate) fn cancel_on_ctrl_c() -> CancellationToken {
    cancel_on(tokio::signal::ctrl_c())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("sociometer: no command given; see `sociometer --help`");
        return Ok(());
    };

    match command {
        Commands::Identify { url } => println!("{}", describe_url(&url)),
        Commands::Run {
            targets,
            platform,
            label,
            max_posts,
            manual_login,
        } => {
            let config = load_config()?;
            let options = runner::RunOptions {
                targets_path: targets.unwrap_or_else(|| config.targets_path.clone()),
                platform,
                label,
                max_posts: max_posts.unwrap_or(config.max_posts),
                manual_login,
            };
            runner::run_batch(&config, &options).await?;
        }
        Commands::Login {
            platform,
            max_wait_secs,
        } => {
            let config = load_config()?;
            login::run_login(&config, platform, max_wait_secs.map(Duration::from_secs)).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
