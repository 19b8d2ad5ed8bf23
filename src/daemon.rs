/*!
 * Guard daemon: the monitoring loop
 *
 * Drives sampling on a fixed cadence. Each cycle: acquire a sample under a
 * bounded budget, push it to the window, evaluate, hand the verdict to the
 * emergency controller, mirror the monitor state for readers. The loop
 * terminates when the controller triggers or on cooperative cancellation.
 */

use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::GuardConfig;
use crate::controller::{EmergencyController, EventSink};
use crate::error::Result;
use crate::report::StatusReporter;
use crate::resolver::Resolution;
use crate::sample::{evaluate, Sample, Verdict};
use crate::state::{MonitorState, MonitorStatus};
use crate::window::SampleWindow;

/// Result of a single cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A sample was acquired and evaluated
    Evaluated(Verdict),

    /// The provider faulted; the cycle was skipped and recorded
    Skipped,

    /// The controller escalated; the loop must stop
    Triggered,
}

/// Handle for observing and cancelling a running guard
#[derive(Clone)]
pub struct GuardHandle {
    shutdown: Arc<watch::Sender<bool>>,
    reporter: StatusReporter,
}

impl GuardHandle {
    /// Request cooperative cancellation
    ///
    /// The in-flight cycle completes; no further cycles run.
    pub fn cancel(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Take a status snapshot
    pub fn status_report(&self) -> crate::report::StatusReport {
        self.reporter.get_status_report()
    }

    /// Reader for external consumers
    pub fn reporter(&self) -> StatusReporter {
        self.reporter.clone()
    }
}

/// The monitoring loop
///
/// Owns the provider, window, and controller; all mutation is serialized
/// through its cycles. Readers observe through [`GuardHandle`] snapshots.
pub struct Guard {
    config: GuardConfig,
    provider: Box<dyn crate::provider::MetricProvider>,
    window: SampleWindow,
    controller: EmergencyController,
    state: Arc<Mutex<MonitorState>>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
    sequence: u64,
}

impl Guard {
    /// Create a guard from validated configuration and a resolved provider
    ///
    /// Invalid configuration rejects construction; it is never clamped.
    pub fn new(
        config: GuardConfig,
        resolution: Resolution,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        config.validate()?;

        let controller = EmergencyController::new(sink, config.persist_timeout());
        let state = Arc::new(Mutex::new(MonitorState::new(resolution.kind)));
        let window = SampleWindow::new(config.window_size);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            provider: resolution.provider,
            window,
            controller,
            state,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
            sequence: 0,
        })
    }

    /// Handle for cancellation and status reads
    pub fn handle(&self) -> GuardHandle {
        GuardHandle {
            shutdown: self.shutdown_tx.clone(),
            reporter: self.reporter(),
        }
    }

    /// Reader over this guard's state
    pub fn reporter(&self) -> StatusReporter {
        StatusReporter::new(self.state.clone(), self.config.thresholds)
    }

    /// The controller, for inspection
    pub fn controller(&self) -> &EmergencyController {
        &self.controller
    }

    /// Explicit external re-arm after an emergency trigger
    pub fn rearm(&mut self) {
        self.controller.rearm();
        self.state.lock().unwrap().controller_state = self.controller.state();
    }

    /// Main event loop
    ///
    /// Typically spawned as a background tokio task:
    ///
    /// ```no_run
    /// # use emergence_guard::{Guard, GuardConfig, ProviderResolver, JsonFileSink};
    /// # use std::sync::Arc;
    /// # async fn example() -> anyhow::Result<()> {
    /// let config = GuardConfig::default();
    /// let resolution = ProviderResolver::new(".").resolve().await;
    /// let guard = Guard::new(config, resolution, Arc::new(JsonFileSink::new(".")))?;
    /// let handle = guard.handle();
    ///
    /// tokio::spawn(async move {
    ///     guard.run().await;
    /// });
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run(mut self) {
        {
            self.state.lock().unwrap().status = MonitorStatus::Running;
        }
        info!(
            "Guard active | kappa<={} epsilon<={} | cadence {:?} | window {}",
            self.config.thresholds.kappa,
            self.config.thresholds.epsilon,
            self.config.cadence(),
            self.config.window_size
        );

        let mut interval = tokio::time::interval(self.config.cadence());

        loop {
            // Cancellation is checked at the top of every cycle
            tokio::select! {
                _ = interval.tick() => {}
                _ = self.shutdown_rx.changed() => {}
            }
            if *self.shutdown_rx.borrow() {
                info!("Cancellation requested; stopping guard");
                break;
            }

            if self.run_cycle().await == CycleOutcome::Triggered {
                break;
            }
        }

        {
            self.state.lock().unwrap().status = MonitorStatus::Shutdown;
        }
        info!("Guard stopped");
    }

    /// Execute a single monitoring cycle
    ///
    /// Note: Public for integration testing
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let budget = self.config.sample_timeout();
        let acquired = tokio::time::timeout(budget, self.provider.sample()).await;

        let (kappa, epsilon) = match acquired {
            Err(_) => {
                return self.skip_cycle(format!("Provider sample exceeded {:?} budget", budget))
            }
            Ok(Err(e)) => return self.skip_cycle(format!("Provider sample failed: {e}")),
            Ok(Ok((kappa, epsilon))) if !kappa.is_finite() || !epsilon.is_finite() => {
                return self.skip_cycle(format!(
                    "Provider returned non-finite pair ({kappa}, {epsilon})"
                ))
            }
            Ok(Ok(pair)) => pair,
        };

        self.sequence += 1;
        let sample = Sample::new(kappa, epsilon, self.sequence);
        self.window.push(sample.clone());

        let verdict = evaluate(&sample, &self.config.thresholds, self.config.warning_margin);
        info!(
            seq = sample.sequence,
            "kappa={:.3} epsilon={:.3} -> {}",
            sample.kappa,
            sample.epsilon,
            verdict
        );

        let fired = self.controller.handle(&sample, verdict, &self.window).await;

        {
            let mut state = self.state.lock().unwrap();
            state.uptime_samples += 1;
            state.avg_kappa = self.window.mean_kappa();
            state.avg_epsilon = self.window.mean_epsilon();
            state.current = Some(sample);
            state.controller_state = self.controller.state();
            state.safe_observed = self.controller.safe_observed();
            state.warnings_observed = self.controller.warnings_observed();
            if fired {
                state.status = MonitorStatus::Shutdown;
            }
        }

        if fired {
            CycleOutcome::Triggered
        } else {
            CycleOutcome::Evaluated(verdict)
        }
    }

    /// Record a provider fault and skip the cycle
    ///
    /// No data is fabricated for a faulted cycle: uptime_samples does not
    /// increment and nothing enters the window.
    fn skip_cycle(&mut self, reason: String) -> CycleOutcome {
        warn!("{reason}; skipping cycle");
        self.state.lock().unwrap().record_fault(reason);
        CycleOutcome::Skipped
    }
}
