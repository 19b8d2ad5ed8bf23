/*!
 * Status reporting
 *
 * Read-only snapshots of the monitor's state for external consumption,
 * safe to take concurrently with an active loop cycle.
 */

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::config::Thresholds;
use crate::controller::ControllerState;
use crate::provider::ProviderKind;
use crate::state::{MonitorState, MonitorStatus};

/// Structured status snapshot
///
/// Field names are part of the external contract and must stay stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    /// Lifecycle status of the monitor
    pub current_status: MonitorStatus,

    /// Kappa of the most recent evaluated sample (0.0 before the first)
    pub current_kappa: f64,

    /// Epsilon of the most recent evaluated sample (0.0 before the first)
    pub current_epsilon: f64,

    /// Rolling mean kappa over the window
    pub avg_kappa_10: f64,

    /// Rolling mean epsilon over the window
    pub avg_epsilon_10: f64,

    /// Number of successfully evaluated samples
    pub uptime_samples: u64,

    /// Configured safety thresholds
    pub thresholds: Thresholds,

    /// Which provider implementation is running
    pub provider_kind: ProviderKind,

    /// Controller state as of the last completed cycle
    pub controller_state: ControllerState,

    /// SAFE verdicts observed while armed
    pub safe_observed: u64,

    /// WARNING verdicts observed while armed
    pub warnings_observed: u64,

    /// Count of per-cycle provider faults so far
    pub sample_faults: u64,

    /// Description of the most recent fault, if any
    pub last_fault: Option<String>,
}

/// Read-only access to the monitor's state
///
/// Cheap to clone and safe to use from any task: every read copies a
/// consistent snapshot under the state mutex, never a partially updated
/// view or a live reference.
#[derive(Clone)]
pub struct StatusReporter {
    state: Arc<Mutex<MonitorState>>,
    thresholds: Thresholds,
}

impl StatusReporter {
    pub(crate) fn new(state: Arc<Mutex<MonitorState>>, thresholds: Thresholds) -> Self {
        Self { state, thresholds }
    }

    /// Take a status snapshot
    pub fn get_status_report(&self) -> StatusReport {
        let state = self.state.lock().unwrap().clone();

        let (current_kappa, current_epsilon) = state
            .current
            .as_ref()
            .map(|s| (s.kappa, s.epsilon))
            .unwrap_or((0.0, 0.0));

        StatusReport {
            current_status: state.status,
            current_kappa,
            current_epsilon,
            avg_kappa_10: state.avg_kappa,
            avg_epsilon_10: state.avg_epsilon,
            uptime_samples: state.uptime_samples,
            thresholds: self.thresholds,
            provider_kind: state.provider_kind,
            controller_state: state.controller_state,
            safe_observed: state.safe_observed,
            warnings_observed: state.warnings_observed,
            sample_faults: state.sample_faults,
            last_fault: state.last_fault,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Sample;

    fn reporter_over(state: MonitorState) -> StatusReporter {
        StatusReporter::new(Arc::new(Mutex::new(state)), Thresholds::default())
    }

    #[test]
    fn test_report_before_first_sample() {
        let report = reporter_over(MonitorState::new(ProviderKind::Fallback)).get_status_report();

        assert_eq!(report.current_status, MonitorStatus::Initializing);
        assert_eq!(report.current_kappa, 0.0);
        assert_eq!(report.current_epsilon, 0.0);
        assert_eq!(report.uptime_samples, 0);
        assert_eq!(report.provider_kind, ProviderKind::Fallback);
    }

    #[test]
    fn test_report_reflects_state() {
        let mut state = MonitorState::new(ProviderKind::Privileged);
        state.status = MonitorStatus::Running;
        state.uptime_samples = 2;
        state.current = Some(Sample::new(0.445, 0.289, 2));
        state.avg_kappa = 0.3395;
        state.avg_epsilon = 0.2225;

        let report = reporter_over(state).get_status_report();

        assert_eq!(report.current_status, MonitorStatus::Running);
        assert_eq!(report.current_kappa, 0.445);
        assert_eq!(report.uptime_samples, 2);
        assert!((report.avg_kappa_10 - 0.3395).abs() < 1e-9);
        assert_eq!(report.thresholds.kappa, 0.8);
        assert_eq!(report.provider_kind, ProviderKind::Privileged);
    }

    #[test]
    fn test_stable_field_names() {
        let report = reporter_over(MonitorState::new(ProviderKind::Fallback)).get_status_report();
        let json = serde_json::to_value(&report).unwrap();

        // External contract: these keys must exist under exactly these names
        for key in [
            "current_status",
            "current_kappa",
            "current_epsilon",
            "avg_kappa_10",
            "avg_epsilon_10",
            "uptime_samples",
            "thresholds",
        ] {
            assert!(json.get(key).is_some(), "missing report field {key}");
        }
        assert!(json["thresholds"].get("kappa").is_some());
        assert!(json["thresholds"].get("epsilon").is_some());
    }

    #[test]
    fn test_snapshot_is_decoupled_from_state() {
        let state = Arc::new(Mutex::new(MonitorState::new(ProviderKind::Fallback)));
        let reporter = StatusReporter::new(state.clone(), Thresholds::default());

        let before = reporter.get_status_report();
        state.lock().unwrap().uptime_samples = 99;
        let after = reporter.get_status_report();

        assert_eq!(before.uptime_samples, 0);
        assert_eq!(after.uptime_samples, 99);
    }
}
