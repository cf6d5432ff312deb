use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use poseguard::config::AppConfig;
use poseguard::demo::DemoGenerator;
use poseguard::error::{ErrorSeverity, MonitorError, PoseGuardError};
use poseguard::export::{self, ReportFormat};
use poseguard::logging::init_logging;
use poseguard::{
    AlertEvent, ChannelAlertSink, CsvReplaySensor, DayData, MonitorService, PostureCategory,
    PostureState, SessionAggregator,
};

/// PoseGuard - posture monitoring and reporting
///
/// Replays head-worn motion sensor recordings through the posture monitor and
/// renders session reports.
#[derive(Parser)]
#[command(name = "poseguard")]
#[command(version = "0.1.0")]
#[command(about = "Posture monitoring and reporting", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the posture monitor over a recorded sensor stream
    Monitor {
        /// CSV recording with timestamp,roll,pitch columns
        #[arg(short, long)]
        replay: PathBuf,

        /// Milliseconds between replayed samples
        #[arg(short, long, default_value = "100")]
        pace_ms: u64,

        /// Stop after this many seconds (default: until the replay and its alerts are done)
        #[arg(short, long)]
        duration_secs: Option<u64>,
    },

    /// Show report statistics for a generated week
    Report {
        /// Seed for the generated week
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output format (table, json)
        #[arg(short = 'f', long)]
        format: Option<ReportFormat>,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show the sessions of the day at this horizontal chart position (0-1)
        #[arg(long)]
        select: Option<f64>,
    },

    /// Manage the configuration file
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Print the active configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        report_error(&err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default(),
    };
    init_logging(&config.logging.clone().with_verbosity(cli.verbose))?;

    match cli.command {
        Commands::Monitor {
            replay,
            pace_ms,
            duration_secs,
        } => run_monitor(&config, replay, pace_ms, duration_secs).await?,

        Commands::Report {
            seed,
            format,
            output,
            select,
        } => run_report(&config, seed, format, output, select)?,

        Commands::Config { init, show } => {
            if init {
                let mut fresh = AppConfig::default();
                let path = match &cli.config {
                    Some(path) => {
                        fresh.save_to_file(path)?;
                        path.clone()
                    }
                    None => fresh.save_default()?,
                };
                println!("{} {}", "✓ Configuration written to".green(), path.display());
            }
            if show || !init {
                let rendered = toml::to_string_pretty(&config)
                    .context("Failed to serialize configuration")?;
                println!("{}", rendered);
            }
        }
    }

    Ok(())
}

async fn run_monitor(
    config: &AppConfig,
    replay: PathBuf,
    pace_ms: u64,
    duration_secs: Option<u64>,
) -> Result<()> {
    let pace = Duration::from_millis(pace_ms);
    let sensor = CsvReplaySensor::from_path(&replay)
        .with_context(|| format!("Failed to load replay: {}", replay.display()))?
        .with_pace(pace);

    let run_for = match duration_secs {
        Some(secs) => Duration::from_secs(secs),
        None => replay_run_time(pace, sensor.samples().len(), config.monitor.notification_lead()),
    };

    println!("{}", "Monitoring posture...".cyan().bold());
    println!("  Replay: {}", replay.display());
    println!("  Samples: {}", sensor.samples().len());
    println!("  Threshold: {}°", config.monitor.threshold_angle_degrees);

    let (sink, mut alerts) = ChannelAlertSink::new();
    let mut service =
        MonitorService::new(config.monitor.clone(), Arc::new(sensor), Arc::new(sink))?;
    let mut states = service.subscribe_state();

    let started = service.start().await?;
    print_state(&started);
    if started == PostureState::Unavailable {
        service.stop().await?;
        return Err(PoseGuardError::from(MonitorError::SensorUnavailable).into());
    }

    let deadline = tokio::time::sleep(run_for);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                print_state(&state);
            }
            Some(alert) = alerts.recv() => print_alert(&alert),
        }
    }

    service.stop().await?;
    println!("{}", "✓ Monitoring stopped".cyan());
    Ok(())
}

/// Long enough to replay every sample and deliver the last alert
fn replay_run_time(pace: Duration, samples: usize, lead: Duration) -> Duration {
    let samples = u32::try_from(samples).unwrap_or(u32::MAX);
    pace.saturating_mul(samples)
        .saturating_add(lead)
        .saturating_add(Duration::from_secs(1))
}

fn report_error(err: &anyhow::Error) {
    let Some(pose_err) = err.downcast_ref::<PoseGuardError>() else {
        error!(error = %err, "command failed");
        eprintln!("{} {:#}", "✗ Error:".red().bold(), err);
        return;
    };

    match pose_err.severity() {
        ErrorSeverity::Critical | ErrorSeverity::Error => error!(error = %pose_err, "command failed"),
        ErrorSeverity::Warning => warn!(error = %pose_err, "command failed"),
        ErrorSeverity::Info => info!(error = %pose_err, "command failed"),
    }

    eprintln!("{} {}", "✗".red().bold(), pose_err.user_message());
    if pose_err.is_retryable() {
        eprintln!("  {}", "Retrying usually clears this.".dimmed());
    }
}

fn print_state(state: &PostureState) {
    let line = state.message();
    match state {
        PostureState::Correct => println!("  {}", line.green()),
        PostureState::Incorrect => println!("  {}", line.yellow()),
        PostureState::Unavailable | PostureState::Error(_) => println!("  {}", line.red()),
        PostureState::NotMonitoring => println!("  {}", line.dimmed()),
    }
}

fn print_alert(alert: &AlertEvent) {
    println!(
        "  {} {}: {} ({})",
        "🔔".bold(),
        alert.title.bold(),
        alert.message,
        alert.fired_at.format("%H:%M:%S")
    );
}

fn run_report(
    config: &AppConfig,
    seed: Option<u64>,
    format: Option<ReportFormat>,
    output: Option<PathBuf>,
    select: Option<f64>,
) -> Result<()> {
    let mut generator = match seed.or(config.report.demo_seed) {
        Some(seed) => DemoGenerator::new(seed),
        None => DemoGenerator::from_entropy(),
    };
    let days = generator.week()?;
    let summary = SessionAggregator::summarize(&days);
    let format = format.unwrap_or(config.report.default_format);

    match output {
        Some(path) => {
            export::export_report(&summary, format, &path)?;
            println!("{} {}", "✓ Report written to".green(), path.display());
        }
        None => println!("{}", export::render(&summary, format)?),
    }

    if let Some(position) = select {
        match SessionAggregator::select_day_at_position(&days, position) {
            Some(day) => print_day_details(day),
            None => println!("{}", "No days to select".dimmed()),
        }
    }

    Ok(())
}

fn print_day_details(day: &DayData) {
    println!();
    println!("{}", day.label.bold());
    println!("  Average quality: {:.0}%", day.average_quality());

    for category in PostureCategory::ALL {
        let sessions: Vec<_> = day.sessions_in(category).collect();
        if sessions.is_empty() {
            continue;
        }
        println!("  {}", category.label().bold());
        for session in sessions {
            println!(
                "    {} - {}  {:.1}h  {}%",
                session.start_time().format("%H:%M"),
                session.end_time().format("%H:%M"),
                session.duration_hours(),
                session.avg_quality()
            );
        }
    }

    println!("  Total sessions: {}", day.sessions.len());
    println!("  Total hours: {:.1}", day.total_hours());
}
