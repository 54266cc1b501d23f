//! RAID sentinel CLI
//!
//! Meant to be run from cron or a systemd timer. With no arguments it checks
//! the array once and exits.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use raid_sentinel::notifier::{DeliveryReport, Notification};
use raid_sentinel::{load_config, Config, RaidSentinelError, RunOutcome};
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "raid-sentinel")]
#[command(about = "Checks a software RAID array and alerts Telegram chats on failure")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment file with BOT_TOKEN / CHAT_ID (defaults to .env when present)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Array device (overrides config file)
    #[arg(long)]
    device: Option<String>,

    /// Log level, used when RUST_LOG is not set
    #[arg(short, long, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Check the array and alert on failure (default)
    Check,
    /// Broadcast a message without checking the array
    TestMessage {
        #[arg(long, default_value = raid_sentinel::DEFAULT_TEST_SUBJECT)]
        subject: String,
        #[arg(long, default_value = raid_sentinel::DEFAULT_TEST_BODY)]
        body: String,
    },
    /// Print the chat ids discovered from the bot's updates
    ListChats,
}

fn load_env_file(path: Option<&Path>) -> raid_sentinel::Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|e| {
                RaidSentinelError::Config(format!("Failed to load env file {:?}: {}", path, e))
            })?;
            tracing::debug!("Loaded environment from {:?}", path);
        }
        None => match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {:?}", path),
            Err(e) if e.not_found() => tracing::debug!("No .env file found"),
            Err(e) => {
                return Err(RaidSentinelError::Config(format!(
                    "Failed to load .env file: {}",
                    e
                )))
            }
        },
    }
    Ok(())
}

fn print_report(report: &DeliveryReport) {
    println!(
        "Message sent to {} of {} recipient(s).",
        report.delivered.len(),
        report.attempted()
    );
    for failure in &report.failed {
        println!("  {}: {}", failure.recipient, failure.error);
    }
}

async fn execute(args: Args) -> raid_sentinel::Result<()> {
    load_env_file(args.env_file.as_deref())?;

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(device) = args.device {
        config.status.device = device;
    }

    config.resolve_secrets()?;
    tracing::debug!("Configuration: {:?}", config);

    match args.command.unwrap_or(Command::Check) {
        Command::Check => match raid_sentinel::run(&config).await? {
            RunOutcome::Healthy => println!("RAID status is normal."),
            RunOutcome::Alerted(reports) => {
                println!("RAID failure detected!");
                for notifier_report in &reports {
                    print_report(&notifier_report.report);
                }
            }
        },
        Command::TestMessage { subject, body } => {
            let http = raid_sentinel::http_client(&config)?;
            let notification = Notification::new(subject, body);
            let report = raid_sentinel::send_test_message(&config, http, &notification).await?;
            print_report(&report);
        }
        Command::ListChats => {
            let http = raid_sentinel::http_client(&config)?;
            let discovery = raid_sentinel::list_chats(&config, http).await?;
            for chat_id in &discovery.chat_ids {
                println!("{}", chat_id);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(args.log_level).into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, env_file={:?}, device={:?}, log_level={:?}",
        args.config,
        args.env_file,
        args.device,
        args.log_level
    );

    match execute(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
