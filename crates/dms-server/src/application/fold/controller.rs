//! Facade over the fold policy and the sensor manager.

use std::sync::Arc;

use tracing::info;

use dms_core::{FoldCreaseRegion, FoldDisplayMode, FoldStatus, ModeChangeReason};

use super::policy::FoldModePolicy;
use super::sensor::FoldStateManager;
use super::PowerTask;

pub struct FoldScreenController {
    policy: Arc<dyn FoldModePolicy>,
    sensor: FoldStateManager,
}

impl FoldScreenController {
    pub fn new(policy: Arc<dyn FoldModePolicy>) -> Self {
        let sensor = FoldStateManager::new(policy.clone());
        Self { policy, sensor }
    }

    pub fn policy(&self) -> &dyn FoldModePolicy {
        self.policy.as_ref()
    }

    pub fn fold_display_mode(&self) -> FoldDisplayMode {
        self.policy.current_mode()
    }

    /// Explicit mode request from a client.
    pub fn set_fold_display_mode(&self, mode: FoldDisplayMode) {
        self.set_fold_display_mode_with_reason(mode, ModeChangeReason::Default);
    }

    pub fn set_fold_display_mode_with_reason(&self, mode: FoldDisplayMode, reason: ModeChangeReason) {
        info!(?mode, ?reason, "fold display mode requested");
        self.policy.change_screen_display_mode(mode, reason);
    }

    pub fn lock_fold_display_status(&self, locked: bool) {
        self.policy.lock_display_status(locked);
    }

    pub fn set_on_boot_animation(&self, on: bool) {
        self.policy.set_on_boot_animation(on);
    }

    pub fn handle_sensor_change(&self, status: FoldStatus) -> bool {
        self.sensor.handle_sensor_change(status)
    }

    pub fn fold_status(&self) -> FoldStatus {
        self.sensor.current_status()
    }

    pub fn current_crease_region(&self) -> FoldCreaseRegion {
        self.policy.crease_region()
    }

    /// Entry point for the ordered task worker.
    pub fn run_power_task(&self, task: PowerTask) {
        self.policy.core().run_task(task);
    }
}
