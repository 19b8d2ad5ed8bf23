/*!
 * Emergence Guard - Real-time kappa/epsilon safety monitor
 *
 * Samples two scalar health metrics on a fixed cadence - a stress indicator
 * (kappa) and an entropy indicator (epsilon) - evaluates them against fixed
 * safety thresholds, and performs a one-shot emergency shutdown protocol
 * when either metric crosses its bound.
 *
 * # Architecture: the monitoring loop
 *
 * ```text
 * ┌─────────────┐
 * │  Acquire    │──> MetricProvider::sample() (bounded budget)
 * └──────┬──────┘
 *        │
 *        v
 * ┌─────────────┐
 * │  Retain     │──> SampleWindow::push() (FIFO, fixed capacity)
 * └──────┬──────┘
 *        │
 *        v
 * ┌─────────────┐
 * │  Evaluate   │──> evaluate() -> SAFE / WARNING / CRITICAL_*
 * └──────┬──────┘
 *        │
 *        v
 * ┌─────────────┐
 * │  Escalate   │──> EmergencyController: ARMED -> TRIGGERED, once
 * └──────┬──────┘
 *        │
 *        └────> Loop (until trigger or cancellation)
 * ```
 *
 * The privileged metric kernel is optional: resolution falls back to a
 * deterministic approximate provider on any failure, so monitoring always
 * runs. Status reads happen concurrently through snapshot copies.
 *
 * # Example
 *
 * ```no_run
 * use emergence_guard::{Guard, GuardConfig, JsonFileSink, ProviderResolver};
 * use std::sync::Arc;
 *
 * # async fn example() -> anyhow::Result<()> {
 * let config = GuardConfig::default();
 *
 * // Select the privileged kernel if present and healthy, else the fallback
 * let resolution = ProviderResolver::new(".")
 *     .with_fallback_seed(config.fallback_seed)
 *     .resolve()
 *     .await;
 *
 * let sink = Arc::new(JsonFileSink::new(config.emergency_dir.clone()));
 * let guard = Guard::new(config, resolution, sink)?;
 * let handle = guard.handle();
 *
 * tokio::spawn(async move {
 *     guard.run().await;
 * });
 *
 * // Concurrent, consistent status reads
 * let report = handle.status_report();
 * println!("{}", serde_json::to_string_pretty(&report)?);
 * # Ok(())
 * # }
 * ```
 */

pub mod config;
pub mod controller;
pub mod daemon;
pub mod error;
pub mod logging;
pub mod provider;
pub mod report;
pub mod resolver;
pub mod sample;
pub mod state;
pub mod window;

// Re-export commonly used types
pub use config::{GuardConfig, LogLevel, Thresholds};
pub use controller::{ControllerState, EmergencyController, EmergencyEvent, EventSink, JsonFileSink};
pub use daemon::{CycleOutcome, Guard, GuardHandle};
pub use error::{GuardError, Result};
pub use provider::{FallbackProvider, MetricProvider, ProviderKind};
pub use report::{StatusReport, StatusReporter};
pub use resolver::{find_kernel_artifact, ProviderLoader, ProviderResolver, Resolution};
pub use sample::{evaluate, Sample, Verdict};
pub use state::{MonitorState, MonitorStatus};
pub use window::SampleWindow;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
