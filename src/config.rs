/*!
 * Configuration types for Emergence Guard
 */

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{GuardError, Result};

/// Safety thresholds for the two monitored metrics
///
/// A metric strictly above its bound is a critical crossing. Thresholds are
/// supplied at construction and never mutated at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Maximum tolerated stress metric (kappa)
    pub kappa: f64,

    /// Maximum tolerated entropy metric (epsilon)
    pub epsilon: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            kappa: 0.8,
            epsilon: 0.7,
        }
    }
}

/// Main configuration for a guard instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Safety thresholds (kappa <= 0.8, epsilon <= 0.7 by default)
    #[serde(default)]
    pub thresholds: Thresholds,

    /// Fraction of a threshold at which a metric reads as WARNING
    #[serde(default = "default_warning_margin")]
    pub warning_margin: f64,

    /// Number of samples retained for rolling averages
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Sampling cadence in milliseconds
    #[serde(default = "default_cadence_ms")]
    pub cadence_ms: u64,

    /// Per-cycle budget for a provider sample call, in milliseconds
    ///
    /// A provider that exceeds this is a fault; the cycle is skipped.
    #[serde(default = "default_sample_timeout_ms")]
    pub sample_timeout_ms: u64,

    /// Budget for writing the emergency record, in milliseconds
    ///
    /// A slow or failing writer never blocks the shutdown signal.
    #[serde(default = "default_persist_timeout_ms")]
    pub persist_timeout_ms: u64,

    /// Seed for the deterministic fallback provider
    #[serde(default = "default_fallback_seed")]
    pub fallback_seed: u64,

    /// Directory that receives emergency_<timestamp>.json records
    #[serde(default = "default_emergency_dir")]
    pub emergency_dir: PathBuf,

    /// Directory searched for a privileged kernel artifact at startup
    ///
    /// None = current working directory.
    #[serde(default)]
    pub kernel_dir: Option<PathBuf>,

    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stdout)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            warning_margin: default_warning_margin(),
            window_size: default_window_size(),
            cadence_ms: default_cadence_ms(),
            sample_timeout_ms: default_sample_timeout_ms(),
            persist_timeout_ms: default_persist_timeout_ms(),
            fallback_seed: default_fallback_seed(),
            emergency_dir: default_emergency_dir(),
            kernel_dir: None,
            log_level: LogLevel::Info,
            log_file: None,
            verbose: false,
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

// Default value functions for serde
fn default_warning_margin() -> f64 {
    0.9
}

fn default_window_size() -> usize {
    10
}

fn default_cadence_ms() -> u64 {
    1000
}

fn default_sample_timeout_ms() -> u64 {
    250
}

fn default_persist_timeout_ms() -> u64 {
    2000
}

fn default_fallback_seed() -> u64 {
    42
}

fn default_emergency_dir() -> PathBuf {
    PathBuf::from(".")
}

impl GuardConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GuardError::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        let config: GuardConfig = toml::from_str(&contents)
            .map_err(|e| GuardError::Config(format!("Cannot parse {}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Sampling cadence as a Duration
    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms)
    }

    /// Provider sample budget as a Duration
    pub fn sample_timeout(&self) -> Duration {
        Duration::from_millis(self.sample_timeout_ms)
    }

    /// Emergency persistence budget as a Duration
    pub fn persist_timeout(&self) -> Duration {
        Duration::from_millis(self.persist_timeout_ms)
    }

    /// Validate the configuration
    ///
    /// Invalid values reject startup; they are never silently clamped.
    pub fn validate(&self) -> Result<()> {
        fn bounded(name: &str, value: f64) -> Result<()> {
            if !value.is_finite() || value <= 0.0 || value > 1.0 {
                return Err(GuardError::Config(format!(
                    "{} must be in (0, 1], got {}",
                    name, value
                )));
            }
            Ok(())
        }

        bounded("thresholds.kappa", self.thresholds.kappa)?;
        bounded("thresholds.epsilon", self.thresholds.epsilon)?;

        if !self.warning_margin.is_finite()
            || self.warning_margin <= 0.0
            || self.warning_margin >= 1.0
        {
            return Err(GuardError::Config(format!(
                "warning_margin must be in (0, 1), got {}",
                self.warning_margin
            )));
        }

        if self.window_size == 0 {
            return Err(GuardError::Config(
                "window_size must be at least 1".to_string(),
            ));
        }

        if self.cadence_ms == 0 {
            return Err(GuardError::Config(
                "cadence_ms must be greater than 0".to_string(),
            ));
        }

        if self.sample_timeout_ms == 0 {
            return Err(GuardError::Config(
                "sample_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.persist_timeout_ms == 0 {
            return Err(GuardError::Config(
                "persist_timeout_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
