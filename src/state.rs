/*!
 * Monitor lifecycle state
 *
 * The guard's process-visible state lives in an explicitly owned context
 * object rather than ambient global state, so multiple guard instances can
 * coexist and be tested in isolation. The loop is the only writer; readers
 * take snapshot copies through a shared handle.
 */

use serde::{Deserialize, Serialize};

use crate::controller::ControllerState;
use crate::provider::ProviderKind;
use crate::sample::Sample;

/// Lifecycle status of a guard instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorStatus {
    /// Constructed but not yet looping
    Initializing,

    /// Loop active
    Running,

    /// Loop exited (emergency trigger or cancellation)
    Shutdown,
}

/// Mutable monitor context, mirrored each cycle for status readers
#[derive(Debug, Clone)]
pub struct MonitorState {
    /// Lifecycle status
    pub status: MonitorStatus,

    /// Which provider implementation resolution selected
    pub provider_kind: ProviderKind,

    /// Number of successfully evaluated samples (skipped cycles excluded)
    pub uptime_samples: u64,

    /// Most recent evaluated sample
    pub current: Option<Sample>,

    /// Rolling mean kappa over the window
    pub avg_kappa: f64,

    /// Rolling mean epsilon over the window
    pub avg_epsilon: f64,

    /// Controller state mirrored after each cycle
    pub controller_state: ControllerState,

    /// SAFE verdicts observed while armed
    pub safe_observed: u64,

    /// WARNING verdicts observed while armed
    pub warnings_observed: u64,

    /// Count of per-cycle provider faults observed so far
    pub sample_faults: u64,

    /// Description of the most recent fault, if any
    pub last_fault: Option<String>,
}

impl MonitorState {
    /// Fresh state for a newly constructed guard
    pub fn new(provider_kind: ProviderKind) -> Self {
        Self {
            status: MonitorStatus::Initializing,
            provider_kind,
            uptime_samples: 0,
            current: None,
            avg_kappa: 0.0,
            avg_epsilon: 0.0,
            controller_state: ControllerState::Armed,
            safe_observed: 0,
            warnings_observed: 0,
            sample_faults: 0,
            last_fault: None,
        }
    }

    /// Record a per-cycle fault so it stays observable
    pub fn record_fault(&mut self, description: impl Into<String>) {
        self.sample_faults += 1;
        self.last_fault = Some(description.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_state() {
        let state = MonitorState::new(ProviderKind::Fallback);

        assert_eq!(state.status, MonitorStatus::Initializing);
        assert_eq!(state.provider_kind, ProviderKind::Fallback);
        assert_eq!(state.uptime_samples, 0);
        assert_eq!(state.controller_state, ControllerState::Armed);
        assert!(state.current.is_none());
        assert!(state.last_fault.is_none());
    }

    #[test]
    fn test_record_fault() {
        let mut state = MonitorState::new(ProviderKind::Privileged);

        state.record_fault("sample timed out");
        state.record_fault("sample returned NaN");

        assert_eq!(state.sample_faults, 2);
        assert_eq!(state.last_fault.as_deref(), Some("sample returned NaN"));
    }

    #[test]
    fn test_status_serde_names() {
        assert_eq!(
            serde_json::to_string(&MonitorStatus::Running).unwrap(),
            "\"RUNNING\""
        );
        assert_eq!(
            serde_json::to_string(&MonitorStatus::Shutdown).unwrap(),
            "\"SHUTDOWN\""
        );
    }
}
