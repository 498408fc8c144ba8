//! Synheart Presence CLI
//!
//! Passive human-presence detection over a stream of interaction events.

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use synheart_presence::{
    collector::{Collector, CollectorConfig, InputEvent},
    config::{Config, SourceConfig},
    core::{offset_from, replay, ReplayOptions, SessionReport, VerdictPolicy},
    monitor::Monitor,
    transparency::create_shared_log_with_persistence,
    PRIVACY_DECLARATION, VERSION,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synheart-presence")]
#[command(author = "Synheart")]
#[command(version = VERSION)]
#[command(about = "Passive human-presence detection from interaction signals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a live stream of NDJSON input events
    Watch {
        /// Read events from this file instead of stdin
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Signals to capture (pointer, click, key, scroll, touch, or all)
        #[arg(long, default_value = "all")]
        sources: String,

        /// Keep the first verdict for the rest of the session
        #[arg(long)]
        latch: bool,
    },

    /// Replay a recorded NDJSON trace and print the final report
    Replay {
        /// Trace file, one JSON event per line
        #[arg(long, short)]
        input: PathBuf,

        /// Keep ticking until this many seconds after the session start
        #[arg(long)]
        until_secs: Option<f64>,

        /// Keep the first verdict for the rest of the session
        #[arg(long)]
        latch: bool,
    },

    /// Show configuration and cumulative statistics
    Status,

    /// Show configuration
    Config,

    /// Display the privacy declaration
    Declaration,

    /// Serve sessions over HTTP
    #[cfg(feature = "server")]
    Serve {
        /// Port to bind on 127.0.0.1 (0 for random)
        #[arg(long, default_value = "8787")]
        port: u16,

        /// Keep the first verdict for the rest of each session
        #[arg(long)]
        latch: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Watch {
            input,
            sources,
            latch,
        } => cmd_watch(input, &sources, latch),
        Commands::Replay {
            input,
            until_secs,
            latch,
        } => cmd_replay(&input, until_secs, latch),
        Commands::Status => {
            cmd_status();
            Ok(())
        }
        Commands::Config => {
            cmd_config();
            Ok(())
        }
        Commands::Declaration => {
            cmd_declaration();
            Ok(())
        }
        #[cfg(feature = "server")]
        Commands::Serve { port, latch } => cmd_serve(port, latch),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn policy_for(latch: bool, config: &Config) -> VerdictPolicy {
    if latch {
        VerdictPolicy::Latch
    } else {
        config.verdict_policy
    }
}

fn cmd_watch(input: Option<PathBuf>, sources: &str, latch: bool) -> anyhow::Result<()> {
    println!("Synheart Presence v{VERSION}");
    println!();

    let source_config = SourceConfig::from_csv(sources);
    if !source_config.any_enabled() {
        anyhow::bail!("at least one source must be enabled (pointer, click, key, scroll, touch)");
    }

    let mut config = Config::load().unwrap_or_default();
    config.sources = source_config.clone();
    config.verdict_policy = policy_for(latch, &config);
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let collector_config = CollectorConfig {
        sources: source_config,
    };
    let collector = match &input {
        Some(path) => Collector::new(collector_config, File::open(path)?),
        None => Collector::stdin(collector_config),
    };

    let transparency_log =
        create_shared_log_with_persistence(config.data_path.join("transparency.json"));

    let source_name = input
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "stdin".to_string());
    println!("Watching {source_name}...");
    println!("  Sources: {}", config.sources.to_csv());
    println!("  Verdict policy: {:?}", config.verdict_policy);
    println!("  Tick interval: {}ms", config.tick_interval.as_millis());
    println!();
    println!("Press Ctrl+C to stop.");
    println!();

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    let mut monitor = Monitor::new(collector, &config, transparency_log.clone());
    monitor.start()?;
    monitor.run(&running, |session| {
        println!("{}", session.report(Utc::now()).status_line());
    });

    let report = monitor.finish();
    println!();
    println!("Final: {}", report.status_line());

    match export_report(&report, &config.export_path) {
        Ok(path) => {
            transparency_log.record_report_exported();
            println!("Exported report to {path:?}");
        }
        Err(e) => eprintln!("Error exporting report: {e:#}"),
    }

    if let Err(e) = transparency_log.save() {
        eprintln!("Error saving transparency log: {e}");
    }

    println!();
    println!("{}", transparency_log.summary());
    Ok(())
}

fn export_report(report: &SessionReport, dir: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!(
        "session_{}_{}.json",
        report.observed_at.format("%Y%m%d_%H%M%S"),
        report.session_id
    ));
    std::fs::write(&path, report.to_json()?)?;
    Ok(path)
}

fn cmd_replay(input: &Path, until_secs: Option<f64>, latch: bool) -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_default();
    let content = std::fs::read_to_string(input)?;

    let mut events = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match InputEvent::from_json_line(line) {
            Ok(event) => events.push(event),
            Err(e) => tracing::warn!(line = lineno + 1, "Skipping input: {}", e),
        }
    }

    let started_at = events.first().map(|e| e.time);
    let until = match (started_at, until_secs) {
        (Some(start), Some(secs)) => Some(offset_from(start, secs).ok_or_else(|| {
            anyhow::anyhow!("--until-secs {secs} is negative or out of range")
        })?),
        _ => None,
    };

    let options = ReplayOptions {
        started_at,
        until,
        policy: policy_for(latch, &config),
        ..ReplayOptions::default()
    };

    let report = replay(&events, &options);
    println!("{}", report.to_json()?);
    Ok(())
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("Synheart Presence Status");
    println!("========================");
    println!();

    println!("Configuration:");
    println!("  Sources: {}", config.sources.to_csv());
    println!("  Verdict policy: {:?}", config.verdict_policy);
    println!("  Tick interval: {}ms", config.tick_interval.as_millis());
    println!("  Reports: {:?}", config.export_path);
    println!();

    let stats_path = config.data_path.join("transparency.json");
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                for key in [
                    "pointer_events",
                    "click_events",
                    "key_events",
                    "scroll_events",
                    "touch_events",
                    "rejected_events",
                    "reports_exported",
                ] {
                    if let Some(value) = stats.get(key) {
                        println!("  {}: {value}", key.replace('_', " "));
                    }
                }
            }
        }
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_declaration() {
    println!("{PRIVACY_DECLARATION}");
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

#[cfg(feature = "server")]
fn cmd_serve(port: u16, latch: bool) -> anyhow::Result<()> {
    use synheart_presence::server::{run, ServerConfig};

    let config = Config::load().unwrap_or_default();
    let server_config = ServerConfig::new(port, policy_for(latch, &config));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let (addr, shutdown) = run(server_config).await?;
        println!("Serving on http://{addr}. Press Ctrl+C to stop.");
        tokio::signal::ctrl_c().await?;
        let _ = shutdown.send(());
        Ok::<(), anyhow::Error>(())
    })
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    }) {
        eprintln!("Warning: Could not set Ctrl+C handler: {e}");
    }
}
