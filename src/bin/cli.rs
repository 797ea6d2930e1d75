//! tubewatch CLI
//!
//! Local execution entry point: scheduled polling, single cycles and
//! snapshot inspection.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tubewatch::{
    error::Result,
    models::Config,
    pipeline::{CycleDriver, CycleOutcome, Scheduler},
    storage::{LocalStorage, SnapshotStore},
};

/// tubewatch - YouTube milestone notifier
#[derive(Parser, Debug)]
#[command(
    name = "tubewatch",
    version,
    about = "Polls YouTube channel and video metrics and posts milestone notifications"
)]
struct Cli {
    /// Path to the configuration file (TOML, or JSON by `.json` extension)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YouTube Data API key
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Discord webhook URL for the primary sink
    #[arg(long, env = "DISCORD_WEBHOOK_URL", hide_env_values = true)]
    discord_webhook: Option<String>,

    /// Bearer token for the secondary social sink
    #[arg(long, env = "SOCIAL_BEARER_TOKEN", hide_env_values = true)]
    social_token: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, Default)]
enum Command {
    /// Poll on the configured schedule forever
    #[default]
    Run,

    /// Run exactly one cycle and exit
    Once,

    /// Validate the configuration file
    Validate,

    /// Show persisted snapshot info
    Info,
}

impl Cli {
    /// Load the config file and apply credential overrides.
    fn load_config(&self) -> Config {
        let mut config = Config::load_or_default(&self.config);
        if let Some(key) = &self.api_key {
            config.api.api_key = Some(key.clone());
        }
        if let Some(url) = &self.discord_webhook {
            config.notify.discord_webhook_url = Some(url.clone());
        }
        if let Some(token) = &self.social_token {
            config.notify.social.bearer_token = Some(token.clone());
        }
        config
    }
}

/// Initialize logging. `--verbose` beats the config level; `RUST_LOG` beats both.
fn init_logging(verbose: bool, config_level: Option<&str>) {
    let level = if verbose {
        "debug"
    } else {
        config_level.unwrap_or("info")
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

async fn run_once(driver: &CycleDriver, config: &Config) -> Result<()> {
    match driver.run_cycle(config).await? {
        CycleOutcome::Completed(report) => {
            log::debug!("Cycle report: {:?}", report);
        }
        CycleOutcome::Skipped => {}
    }
    Ok(())
}

async fn show_info(snapshot_file: &Path) -> Result<()> {
    log::info!("Snapshot file: {}", snapshot_file.display());

    let snapshot = LocalStorage::new(snapshot_file).load().await?;
    if snapshot.is_empty() {
        log::info!("No snapshot found yet.");
        return Ok(());
    }

    log::info!("Channels: {}", snapshot.channels.len());
    log::info!("Videos: {}", snapshot.videos.len());
    if let Some(latest) = snapshot.latest_observation() {
        log::info!("Last observed: {}", latest.to_rfc3339());
    }
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config();
    init_logging(cli.verbose, config.log_level.as_deref());

    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command.unwrap_or_default() {
        Command::Run => {
            let driver = CycleDriver::from_config(&config)?;
            let scheduler = Scheduler::from_config(&config.schedule);
            log::info!(
                "tubewatch starting: {} channels, {} playlists, every {}s",
                config.channels.len(),
                config.playlists.len(),
                config.schedule.interval_secs
            );

            scheduler
                .run(|| {
                    let driver = &driver;
                    let cli = &cli;
                    async move {
                        let config = cli.load_config();
                        if let Err(e) = config.validate() {
                            log::error!("Reloaded config is invalid, skipping cycle: {}", e);
                            return;
                        }
                        if let Err(e) = run_once(driver, &config).await {
                            log::error!("Cycle failed: {}", e);
                        }
                    }
                })
                .await;
        }

        Command::Once => {
            let driver = CycleDriver::from_config(&config)?;
            run_once(&driver, &config).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "✓ Config OK ({} channels, {} playlists, {} subscriber and {} view thresholds)",
                config.channels.len(),
                config.playlists.len(),
                config.subscriber_thresholds.len(),
                config.view_thresholds.len()
            );
        }

        Command::Info => {
            show_info(Path::new(&config.paths.snapshot_file)).await?;
        }
    }

    Ok(())
}
