//! Job command handlers
//!
//! Handles all job-related CLI commands: submitting a job, reading its status,
//! printing or following its logs, and asking the service to stop it.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use colored::*;
use stratwatch_client::StrategyClient;
use stratwatch_core::domain::job::{
    ExecutionStatus, JobHandle, JobLaunch, JobWindow, TradingMode,
};
use stratwatch_core::domain::log::LogEntry;
use stratwatch_monitor::{LineSink, Monitor, MonitorSink, Progress};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::types::parse_timestamp;

/// The job a command applies to
#[derive(Args)]
pub struct JobTarget {
    /// Strategy code the job was submitted under
    code: String,

    /// Trading mode of the job (bt, pt or rt)
    #[arg(short, long, default_value = "bt")]
    mode: TradingMode,
}

impl JobTarget {
    fn handle(&self) -> JobHandle {
        JobHandle::new(&self.code, self.mode)
    }
}

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// Submit a job for a strategy
    Start {
        #[command(flatten)]
        target: JobTarget,

        /// Start of the trading window
        #[arg(long, value_parser = parse_timestamp)]
        start: DateTime<Utc>,

        /// End of the trading window
        #[arg(long, value_parser = parse_timestamp)]
        end: DateTime<Utc>,

        /// Lot multiplier for every order
        #[arg(long, default_value_t = 1)]
        lots: u32,

        /// Exchange region
        #[arg(long, default_value = JobLaunch::DEFAULT_LOCATION)]
        location: String,

        /// Virtual capital for backtests and paper trading
        #[arg(long, default_value_t = JobLaunch::DEFAULT_INITIAL_FUNDS)]
        initial_funds: f64,

        /// Follow the job once it is submitted
        #[arg(short, long)]
        follow: bool,
    },
    /// Show the current status of a job
    Status {
        #[command(flatten)]
        target: JobTarget,
    },
    /// Print job logs
    Logs {
        #[command(flatten)]
        target: JobTarget,

        /// Keep watching until the job stops
        #[arg(short, long)]
        follow: bool,

        /// Start of the job's window, for progress reporting
        #[arg(long, value_parser = parse_timestamp)]
        start: Option<DateTime<Utc>>,

        /// End of the job's window, for progress reporting
        #[arg(long, value_parser = parse_timestamp)]
        end: Option<DateTime<Utc>>,
    },
    /// Ask the service to stop a job
    Stop {
        #[command(flatten)]
        target: JobTarget,
    },
}

/// Handle job commands
///
/// # Arguments
/// * `command` - The job command to execute
/// * `config` - The CLI configuration
pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        JobCommands::Start {
            target,
            start,
            end,
            lots,
            location,
            initial_funds,
            follow,
        } => {
            let launch = JobLaunch {
                lots,
                location,
                initial_funds_virtual: initial_funds,
                ..JobLaunch::new(start, end)
            };
            start_job(&client, &target, &launch).await?;
            if follow {
                follow_logs(client, config, target.handle(), launch.window()).await?;
            }
            Ok(())
        }
        JobCommands::Status { target } => show_status(&client, &target).await,
        JobCommands::Logs {
            target,
            follow,
            start,
            end,
        } => {
            if follow {
                follow_logs(client, config, target.handle(), JobWindow { start, end }).await
            } else {
                print_logs(client, config, target.handle()).await
            }
        }
        JobCommands::Stop { target } => stop_job(&client, &target).await,
    }
}

/// Show the status of a job
async fn show_status(client: &StrategyClient, target: &JobTarget) -> Result<()> {
    let response = client
        .get_job_status(&target.code, target.mode)
        .await
        .with_context(|| format!("Failed to fetch status of {}", target.handle()))?;

    let status = ExecutionStatus::from_status_text(&response.message);

    println!("{}", "Job Status:".bold());
    println!("  Strategy: {}", target.code.cyan());
    println!("  Mode:     {}", target.mode);
    println!("  Status:   {}", colorize_status(status));
    if status == ExecutionStatus::Unknown {
        println!("  Reported: {}", response.message.dimmed());
    }

    Ok(())
}

/// Print every log line currently available
async fn print_logs(client: StrategyClient, config: &Config, handle: JobHandle) -> Result<()> {
    let monitor = Monitor::new(Arc::new(client), config.monitor_config()?);

    println!("{}", format!("Logs for {}:", handle).bold());
    println!("{}", "─".repeat(80).dimmed());

    let mut sink = LineSink::new(print_log_line);
    let outcome = monitor
        .read_logs(handle.clone(), &mut sink, &CancellationToken::new())
        .await
        .with_context(|| format!("Failed to fetch logs of {}", handle))?;

    if outcome.logs.is_empty() {
        println!("{}", "No logs found for this job.".yellow());
    }
    println!("{}", "─".repeat(80).dimmed());

    Ok(())
}

/// Stream logs, status and progress until the job stops or Ctrl-C
async fn follow_logs(
    client: StrategyClient,
    config: &Config,
    handle: JobHandle,
    window: JobWindow,
) -> Result<()> {
    let monitor = Monitor::new(Arc::new(client), config.monitor_config()?);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    println!("{}", format!("Following {} (Ctrl-C to detach)", handle).bold());
    println!("{}", "─".repeat(80).dimmed());

    let mut sink = ConsoleSink::default();
    let outcome = monitor
        .run(handle.clone(), window, &mut sink, &cancel)
        .await
        .with_context(|| format!("Lost track of {}", handle))?;

    println!("{}", "─".repeat(80).dimmed());
    if outcome.is_complete() {
        println!(
            "{} {} finished, {} log line(s)",
            "✓".green(),
            handle,
            outcome.logs.len()
        );
    } else {
        println!(
            "{}",
            format!("Detached from {}; the job keeps running.", handle).yellow()
        );
    }
    if outcome.retries > 0 {
        println!(
            "{}",
            format!("{} transient failure(s) retried", outcome.retries).dimmed()
        );
    }

    Ok(())
}

/// Submit a job for the target strategy
async fn start_job(client: &StrategyClient, target: &JobTarget, launch: &JobLaunch) -> Result<()> {
    let handle = target.handle();
    client
        .start_job(&target.code, target.mode, launch)
        .await
        .with_context(|| format!("Failed to start {}", handle))?;

    println!(
        "{} Started {} ({} to {}, {} lot(s))",
        "✓".green(),
        handle,
        launch.start,
        launch.end,
        launch.lots
    );

    Ok(())
}

/// Request a job stop
async fn stop_job(client: &StrategyClient, target: &JobTarget) -> Result<()> {
    let handle = target.handle();
    client
        .stop_job(&target.code, target.mode)
        .await
        .with_context(|| format!("Failed to stop {}", handle))?;

    println!("{} Stop requested for {}", "✓".green(), handle);

    Ok(())
}

/// Sink printing session events to the terminal
#[derive(Default)]
struct ConsoleSink {
    last_percent: Option<u32>,
}

impl MonitorSink for ConsoleSink {
    fn on_log_line(&mut self, entry: &LogEntry) {
        print_log_line(entry);
    }

    fn on_status(&mut self, status: ExecutionStatus) {
        println!("{} Status: {}", "▸".cyan(), colorize_status(status));
    }

    fn on_progress(&mut self, progress: &Progress) {
        let Some(fraction) = progress.fraction else {
            return;
        };

        let percent = (fraction * 100.0).floor() as u32;
        if self.last_percent != Some(percent) {
            self.last_percent = Some(percent);
            println!("{}", format!("  progress {}%", percent).dimmed());
        }
    }
}

/// Print a log line with its mode tag highlighted
fn print_log_line(entry: &LogEntry) {
    let text = entry.text.trim_start();
    match entry.mode_tag() {
        Some(mode) => {
            let tag = format!("[{}]", mode.log_tag());
            let rest = text.strip_prefix(tag.as_str()).unwrap_or(text);
            println!("{}{}", tag.cyan(), rest);
        }
        None => println!("{}", text),
    }
}

/// Colorize job status for display
fn colorize_status(status: ExecutionStatus) -> ColoredString {
    let status_str = status.as_str();
    match status {
        ExecutionStatus::Starting => status_str.yellow(),
        ExecutionStatus::Started => status_str.cyan(),
        ExecutionStatus::Stopping => status_str.yellow(),
        ExecutionStatus::Stopped => status_str.green(),
        ExecutionStatus::Unknown => status_str.dimmed(),
    }
}
