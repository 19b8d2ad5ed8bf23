/*!
 * Emergence Guard CLI - Command Line Interface
 *
 * Thin shell over the monitoring library: load configuration, resolve the
 * metric provider, run the guard until an emergency trigger or Ctrl-C, then
 * print the final status report as JSON.
 */

use anyhow::Context;
use clap::{Parser, ValueEnum};
use emergence_guard::{
    error::{EXIT_FATAL, EXIT_SUCCESS, EXIT_TRIGGERED},
    logging, ControllerState, Guard, GuardConfig, JsonFileSink, LogLevel, ProviderResolver,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "emergence-guard")]
#[command(
    version,
    about = "Real-time kappa/epsilon safety monitor with emergency shutdown",
    long_about = None
)]
struct Cli {
    /// Load configuration from a TOML file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Kappa (stress) threshold, in (0, 1]
    #[arg(long, value_name = "FLOAT")]
    kappa_threshold: Option<f64>,

    /// Epsilon (entropy) threshold, in (0, 1]
    #[arg(long, value_name = "FLOAT")]
    epsilon_threshold: Option<f64>,

    /// Sampling cadence in milliseconds
    #[arg(short, long, value_name = "MS")]
    interval: Option<u64>,

    /// Rolling window size in samples
    #[arg(short, long, value_name = "N")]
    window: Option<usize>,

    /// Seed for the fallback provider
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Directory receiving emergency records
    #[arg(long, value_name = "DIR")]
    emergency_dir: Option<PathBuf>,

    /// Directory searched for the privileged kernel artifact
    #[arg(long, value_name = "DIR")]
    kernel_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum)]
    log_level: Option<LogLevelArg>,

    /// Log to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

impl Cli {
    /// Fold CLI flags over the file/default configuration
    fn into_config(self) -> anyhow::Result<GuardConfig> {
        let mut config = match &self.config {
            Some(path) => GuardConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => GuardConfig::default(),
        };

        if let Some(kappa) = self.kappa_threshold {
            config.thresholds.kappa = kappa;
        }
        if let Some(epsilon) = self.epsilon_threshold {
            config.thresholds.epsilon = epsilon;
        }
        if let Some(interval) = self.interval {
            config.cadence_ms = interval;
        }
        if let Some(window) = self.window {
            config.window_size = window;
        }
        if let Some(seed) = self.seed {
            config.fallback_seed = seed;
        }
        if let Some(dir) = self.emergency_dir {
            config.emergency_dir = dir;
        }
        if let Some(dir) = self.kernel_dir {
            config.kernel_dir = Some(dir);
        }
        if let Some(level) = self.log_level {
            config.log_level = level.into();
        }
        if let Some(file) = self.log_file {
            config.log_file = Some(file);
        }
        config.verbose = config.verbose || self.verbose;

        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(EXIT_FATAL);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = cli.into_config()?;
    config.validate()?;
    logging::init_logging(&config)?;

    let kernel_dir = match &config.kernel_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("resolving working directory")?,
    };

    let resolution = ProviderResolver::new(kernel_dir)
        .with_fallback_seed(config.fallback_seed)
        .resolve()
        .await;

    let sink = Arc::new(JsonFileSink::new(config.emergency_dir.clone()));
    let guard = Guard::new(config, resolution, sink)?;
    let handle = guard.handle();

    let mut loop_task = tokio::spawn(guard.run());

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received");
            handle.cancel();
            let _ = (&mut loop_task).await;
        }
        _ = &mut loop_task => {}
    }

    let report = handle.status_report();
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(if report.controller_state == ControllerState::Triggered {
        EXIT_TRIGGERED
    } else {
        EXIT_SUCCESS
    })
}
