//! Perflog - CLI host for the performance log panel

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tokio::io::BufReader;
use tracing::{debug, info};

use perflog::cli::{Cli, Command, OutputFormat};
use perflog::config::Config;
use perflog::events::{EventFeed, share, spawn_feed};
use perflog::{ConnectionFlag, LifecycleEvent, LogEntry, LogMirror, PerfPanel, read_recent};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("perflog")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("perflog.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(limit = config.limit, persist = config.persist.enabled, "perflog loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Replay {
            input,
            connected,
            format,
        } => cmd_replay(&config, &input, connected, format).await,
        Command::Show { format } => cmd_show(&config, format),
        Command::Clear => cmd_clear(&config),
    }
}

async fn cmd_replay(config: &Config, input: &str, connected: bool, format: OutputFormat) -> Result<()> {
    let flag = ConnectionFlag::new(connected);
    let mut panel = PerfPanel::with_config(config, Arc::new(flag.clone())).context("Failed to create panel")?;

    let on_connect = flag.clone();
    panel.on_lifecycle(LifecycleEvent::Connect, Box::new(move || on_connect.set_connected(true)));
    let on_disconnect = flag.clone();
    panel.on_lifecycle(LifecycleEvent::Disconnect, Box::new(move || on_disconnect.set_connected(false)));

    let panel = share(panel);
    let (feed, rx) = EventFeed::with_default_capacity();
    let handle = spawn_feed(Arc::clone(&panel), rx);

    let (sent, skipped) = if input == "-" {
        feed.send_lines(BufReader::new(tokio::io::stdin())).await?
    } else {
        let file = tokio::fs::File::open(input)
            .await
            .context(format!("Failed to open {}", input))?;
        feed.send_lines(BufReader::new(file)).await?
    };
    drop(feed);

    let summary = handle.await.context("Feed task failed")?;
    debug!(sent, skipped, processed = summary.processed, "cmd_replay: feed drained");

    let panel = panel.read().await;
    print_rows(panel.rows().iter(), format)?;

    if format == OutputFormat::Text {
        let stats = panel.stats();
        eprintln!(
            "{} rows ({}), {} dropped, {} rejected, {} session resets, {} unparsable lines",
            panel.rows().len().to_string().bold(),
            panel.pause_state().to_string().yellow(),
            stats.dropped,
            stats.rejected,
            stats.session_resets,
            skipped
        );
    }
    Ok(())
}

fn cmd_show(config: &Config, format: OutputFormat) -> Result<()> {
    let path = config.persist.path();
    let rows = read_recent(&path, config.limit)?;
    if rows.is_empty() && format == OutputFormat::Text {
        println!("No rows in {}", path.display());
        return Ok(());
    }
    print_rows(rows.iter(), format)
}

fn cmd_clear(config: &Config) -> Result<()> {
    let mut mirror = LogMirror::open(&config.persist.dir, &config.persist.name)?;
    mirror.truncate()?;
    println!("{} Cleared {}", "✓".green(), mirror.path().display());
    Ok(())
}

fn print_rows<'a>(rows: impl Iterator<Item = &'a LogEntry>, format: OutputFormat) -> Result<()> {
    for entry in rows {
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string(entry)?),
            OutputFormat::Text => {
                let base = if entry.is_base { "base".magenta() } else { "    ".normal() };
                println!(
                    "{} {:>12} {:>14} {}",
                    base,
                    format!("{:.3}ms", entry.duration).cyan(),
                    format!("@{:.3}", entry.start_time).dimmed(),
                    entry.name
                );
            }
        }
    }
    Ok(())
}
