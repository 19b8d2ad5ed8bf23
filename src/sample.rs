/*!
 * Sample and verdict types
 *
 * A Sample is one (kappa, epsilon) observation; a Verdict is its stateless
 * classification against the configured thresholds.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::Thresholds;

/// One observation of the two monitored metrics
///
/// Both metrics are clamped to [0, 1] on construction; a provider emitting
/// out-of-range values is a provider concern, not a crash condition.
/// `sequence` strictly increases per loop instance and carries the ordering
/// guarantee; `timestamp` is wall-clock so samples serialize into the
/// emergency record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Normalized stress metric
    pub kappa: f64,

    /// Normalized entropy metric
    pub epsilon: f64,

    /// Wall-clock time of acquisition
    pub timestamp: DateTime<Utc>,

    /// Position in the loop's sample stream (1-based, strictly increasing)
    pub sequence: u64,
}

impl Sample {
    /// Build a sample, clamping both metrics into [0, 1]
    pub fn new(kappa: f64, epsilon: f64, sequence: u64) -> Self {
        Self {
            kappa: kappa.clamp(0.0, 1.0),
            epsilon: epsilon.clamp(0.0, 1.0),
            timestamp: Utc::now(),
            sequence,
        }
    }
}

/// Classification of a single sample against the configured thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Both metrics comfortably inside their bounds
    Safe,

    /// Either metric at or above the warning margin of its bound
    Warning,

    /// Kappa crossed its threshold
    CriticalStress,

    /// Epsilon crossed its threshold
    CriticalEntropy,

    /// Both metrics crossed their thresholds
    CriticalBoth,
}

impl Verdict {
    /// Check whether this verdict escalates to emergency shutdown
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Verdict::CriticalStress | Verdict::CriticalEntropy | Verdict::CriticalBoth
        )
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Safe => write!(f, "SAFE"),
            Verdict::Warning => write!(f, "WARNING"),
            Verdict::CriticalStress => write!(f, "CRITICAL_STRESS"),
            Verdict::CriticalEntropy => write!(f, "CRITICAL_ENTROPY"),
            Verdict::CriticalBoth => write!(f, "CRITICAL_BOTH"),
        }
    }
}

/// Classify a sample against the thresholds
///
/// Pure and deterministic: the verdict depends only on the sample, the
/// thresholds, and the warning margin fraction. A strict crossing
/// (`metric > threshold`) is critical; sitting at or above
/// `warning_margin * threshold` without crossing reads as WARNING.
pub fn evaluate(sample: &Sample, thresholds: &Thresholds, warning_margin: f64) -> Verdict {
    let kappa_over = sample.kappa > thresholds.kappa;
    let epsilon_over = sample.epsilon > thresholds.epsilon;

    match (kappa_over, epsilon_over) {
        (true, true) => Verdict::CriticalBoth,
        (true, false) => Verdict::CriticalStress,
        (false, true) => Verdict::CriticalEntropy,
        (false, false) => {
            let kappa_elevated = sample.kappa >= thresholds.kappa * warning_margin;
            let epsilon_elevated = sample.epsilon >= thresholds.epsilon * warning_margin;
            if kappa_elevated || epsilon_elevated {
                Verdict::Warning
            } else {
                Verdict::Safe
            }
        }
    }
}
