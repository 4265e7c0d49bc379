//! Hinge-sensor input.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use dms_core::FoldStatus;

use super::policy::FoldModePolicy;

/// Turns raw fold-status readings into policy input.
pub struct FoldStateManager {
    status: Mutex<FoldStatus>,
    policy: Arc<dyn FoldModePolicy>,
}

impl FoldStateManager {
    pub fn new(policy: Arc<dyn FoldModePolicy>) -> Self {
        Self {
            status: Mutex::new(FoldStatus::Unknown),
            policy,
        }
    }

    pub fn current_status(&self) -> FoldStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handles one sensor reading.  `UNKNOWN` and repeated readings are
    /// ignored.  Returns `true` when the reading was accepted.
    pub fn handle_sensor_change(&self, status: FoldStatus) -> bool {
        {
            let mut current = self.status.lock().unwrap_or_else(PoisonError::into_inner);
            if status == FoldStatus::Unknown || status == *current {
                debug!(?status, "fold status ignored");
                return false;
            }
            info!(target: "dms::telemetry", event = "FOLD_STATUS_CHANGE", from = ?*current, to = ?status);
            *current = status;
        }

        let core = self.policy.core();
        core.power().refresh_activity();
        core.set_fold_status(status);
        core.host().notify_fold_status_changed(status);
        if core.is_locked() {
            info!(?status, "fold display status locked; mode unchanged");
        } else {
            self.policy.send_sensor_result(status);
        }
        true
    }
}
