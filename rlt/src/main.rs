//! Resource Leak Tester command line.
#![forbid(unsafe_code)]

mod orchestrator;
mod report;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rlt_common::{HarnessConfig, LogConfig, ScenarioKind, init_logging};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "rlt",
    about = "Drive a server with adversarial load and watch its resources for leaks",
    version
)]
struct Cli {
    /// Base URL of the server to test
    #[arg(long)]
    url: Option<String>,

    /// PID of the server process to monitor (0 to skip monitoring)
    #[arg(long)]
    pid: Option<u32>,

    /// Scenarios to run, comma-separated: all, connection, request, cgi,
    /// error, memory
    #[arg(long = "test", value_delimiter = ',')]
    tests: Option<Vec<String>>,

    /// Number of requests for request-shaped scenarios
    #[arg(long)]
    requests: Option<usize>,

    /// Number of connections for the connection-hold scenario
    #[arg(long)]
    connections: Option<usize>,

    /// Worker concurrency ceiling
    #[arg(long)]
    concurrency: Option<usize>,

    /// Time to hold connections open (e.g. 10s)
    #[arg(long, value_parser = humantime::parse_duration)]
    hold_time: Option<Duration>,

    /// Time to wait for resource cleanup after each scenario
    #[arg(long, value_parser = humantime::parse_duration)]
    cleanup_time: Option<Duration>,

    /// Per-request timeout
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Resource sampling interval
    #[arg(long, value_parser = humantime::parse_duration)]
    interval: Option<Duration>,

    /// Directory for output files (samples.csv)
    #[arg(long)]
    output: Option<PathBuf>,

    /// TOML config file; command-line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format for the final result
    #[arg(long, default_value = "pretty")]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy)]
enum OutputFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env("info");
    if cli.verbose {
        log_config = log_config.with_level("debug");
    }
    init_logging(&log_config).context("logging setup failed")?;

    let config = build_config(&cli)?;

    if let Some(dir) = &cli.output {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    }

    // A first Ctrl-C raises the flag; the orchestrator observes it between
    // scenarios and shuts the monitor down before returning.
    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("failed to register interrupt handler")?;

    let run = orchestrator::run(&config, &cancel)?;

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&run)?),
        OutputFormat::Pretty => report::print_report(&run),
    }

    if let (Some(dir), Some(session)) = (&cli.output, &run.monitor_session) {
        let path = dir.join("samples.csv");
        report::write_samples_csv(session, &path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), samples = session.samples.len(), "sample series exported");
    }

    Ok(())
}

/// Merge the config file (if any) with command-line overrides.
fn build_config(cli: &Cli) -> Result<HarnessConfig> {
    let mut config = match &cli.config {
        Some(path) => HarnessConfig::from_toml_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => HarnessConfig::default(),
    };

    if let Some(url) = &cli.url {
        config.url = url.clone();
    }
    if let Some(pid) = cli.pid {
        config.pid = pid;
    }
    if let Some(requests) = cli.requests {
        config.requests = requests;
    }
    if let Some(connections) = cli.connections {
        config.connections = connections;
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(hold) = cli.hold_time {
        config.hold_time_secs = hold.as_secs();
    }
    if let Some(cleanup) = cli.cleanup_time {
        config.cleanup_time_secs = cleanup.as_secs();
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout.as_secs();
    }
    if let Some(interval) = cli.interval {
        config.interval_ms = interval.as_millis() as u64;
    }

    if let Some(tests) = &cli.tests {
        config.scenarios = parse_scenarios(tests)?;
    }
    Ok(config)
}

fn parse_scenarios(tests: &[String]) -> Result<Vec<ScenarioKind>> {
    if tests.iter().any(|t| t.trim().eq_ignore_ascii_case("all")) {
        return Ok(ScenarioKind::all());
    }

    let mut scenarios = Vec::with_capacity(tests.len());
    for name in tests {
        let kind: ScenarioKind = name
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .with_context(|| format!("invalid --test value '{name}'"))?;
        if !scenarios.contains(&kind) {
            scenarios.push(kind);
        }
    }
    Ok(scenarios)
}
