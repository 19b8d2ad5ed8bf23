/*!
 * Emergency controller
 *
 * Consumes verdicts and performs the one-shot ARMED -> TRIGGERED transition.
 * TRIGGERED is terminal for the session; an explicit external re-arm is
 * required to resume, which prevents flapping. The emergency record handoff
 * is bounded and its failure never blocks the shutdown signal.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::error::{GuardError, Result};
use crate::sample::{Sample, Verdict};
use crate::window::SampleWindow;

/// Controller state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControllerState {
    /// Watching; critical verdicts escalate
    Armed,

    /// Escalated; terminal until an explicit re-arm
    Triggered,
}

/// Immutable record of one emergency escalation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyEvent {
    /// When the trigger fired
    pub triggered_at: DateTime<Utc>,

    /// The sample that crossed a threshold
    pub triggering_sample: Sample,

    /// Its classification
    pub verdict: Verdict,

    /// The window contents at trigger time, oldest first
    pub window_snapshot: Vec<Sample>,
}

/// External persistence collaborator for emergency records
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Persist the event, returning where it landed
    async fn persist(&self, event: &EmergencyEvent) -> Result<PathBuf>;
}

/// Default sink: one timestamped JSON file per event
///
/// Writes `emergency_<unix-millis>.json` into the configured directory; the
/// timestamp in the filename keeps records collision-free across triggers.
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl EventSink for JsonFileSink {
    async fn persist(&self, event: &EmergencyEvent) -> Result<PathBuf> {
        let filename = format!("emergency_{}.json", event.triggered_at.timestamp_millis());
        let path = self.dir.join(filename);

        let body = serde_json::to_vec_pretty(event)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| GuardError::Persistence(format!("{}: {}", self.dir.display(), e)))?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| GuardError::Persistence(format!("{}: {}", path.display(), e)))?;

        Ok(path)
    }
}

/// One-shot escalation state machine
pub struct EmergencyController {
    state: ControllerState,
    sink: Arc<dyn EventSink>,
    persist_timeout: Duration,
    safe_observed: u64,
    warnings_observed: u64,
    last_event: Option<EmergencyEvent>,
}

impl EmergencyController {
    /// Create an armed controller writing through `sink`
    pub fn new(sink: Arc<dyn EventSink>, persist_timeout: Duration) -> Self {
        Self {
            state: ControllerState::Armed,
            sink,
            persist_timeout,
            safe_observed: 0,
            warnings_observed: 0,
            last_event: None,
        }
    }

    /// Current state
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Check whether the session has escalated
    pub fn is_triggered(&self) -> bool {
        self.state == ControllerState::Triggered
    }

    /// SAFE verdicts observed while armed
    pub fn safe_observed(&self) -> u64 {
        self.safe_observed
    }

    /// WARNING verdicts observed while armed
    pub fn warnings_observed(&self) -> u64 {
        self.warnings_observed
    }

    /// The escalation record, once one exists
    pub fn last_event(&self) -> Option<&EmergencyEvent> {
        self.last_event.as_ref()
    }

    /// Explicit external re-arm
    ///
    /// The only way out of TRIGGERED; the loop never re-arms on its own.
    pub fn rearm(&mut self) {
        if self.state == ControllerState::Triggered {
            info!("Controller re-armed by external request");
            self.state = ControllerState::Armed;
        }
    }

    /// Consume one verdict
    ///
    /// Returns true exactly once per session: on the ARMED -> TRIGGERED
    /// transition. Subsequent critical verdicts are observed but cause no
    /// further transition or duplicate event.
    pub async fn handle(
        &mut self,
        sample: &Sample,
        verdict: Verdict,
        window: &SampleWindow,
    ) -> bool {
        match verdict {
            Verdict::Safe => {
                self.safe_observed += 1;
                false
            }
            Verdict::Warning => {
                self.warnings_observed += 1;
                false
            }
            _ => self.escalate(sample, verdict, window).await,
        }
    }

    async fn escalate(
        &mut self,
        sample: &Sample,
        verdict: Verdict,
        window: &SampleWindow,
    ) -> bool {
        if self.is_triggered() {
            return false;
        }
        self.state = ControllerState::Triggered;

        error!(
            kappa = sample.kappa,
            epsilon = sample.epsilon,
            %verdict,
            "EMERGENCY SHUTDOWN triggered"
        );

        let event = EmergencyEvent {
            triggered_at: Utc::now(),
            triggering_sample: sample.clone(),
            verdict,
            window_snapshot: window.snapshot(),
        };

        // Bounded handoff: a slow or failing writer is logged, never allowed
        // to block the shutdown signal
        match tokio::time::timeout(self.persist_timeout, self.sink.persist(&event)).await {
            Ok(Ok(path)) => info!(path = %path.display(), "Emergency record persisted"),
            Ok(Err(e)) => warn!("Emergency record write failed: {e}"),
            Err(_) => warn!(
                "Emergency record write exceeded {:?} budget",
                self.persist_timeout
            ),
        }

        self.last_event = Some(event);
        true
    }
}
