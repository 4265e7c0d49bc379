//! The fold display mode state machine shared by both device policies.
//!
//! A transition to a new mode runs in three parts:
//!
//! 1. the concrete policy performs its synchronous steps and returns a
//!    [`TransitionPlan`] (which panel goes dark, which lights up);
//! 2. the plan's power tasks are posted to the ordered scheduler;
//! 3. the mode is recorded, the bound screen takes the new panel's property
//!    and listeners are told.
//!
//! Only one transition runs at a time.  A request arriving while one is in
//! flight is dropped; once the last task of the running transition
//! finishes, a differing last request is reported through
//! [`FoldScreenHost::notify_display_mode_update_requested`] so the caller
//! can ask again.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use dms_core::{
    FoldCreaseRegion, FoldDisplayMode, FoldStatus, ModeChangeReason, PowerStatus,
    PropertyChangeReason, SurfaceScreenId,
};

use super::{FoldScreenHost, PowerTask};
use crate::infrastructure::power::PowerManager;
use crate::infrastructure::render_surface::TP_TYPE_POWER_CTRL;
use crate::infrastructure::scheduler::TaskScheduler;

/// Side effects of one transition, produced by the concrete policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionPlan {
    /// Power tasks in the order they must run.
    pub tasks: Vec<(&'static str, PowerTask)>,
    /// Panel whose property the bound screen adopts.
    pub property: Option<(SurfaceScreenId, PropertyChangeReason)>,
    pub power_off: Option<SurfaceScreenId>,
    pub power_on: Option<SurfaceScreenId>,
}

#[derive(Debug, Clone, Default)]
struct FoldPolicyState {
    current_mode: FoldDisplayMode,
    last_requested: FoldDisplayMode,
    running: bool,
    /// Posted tasks that have not run yet, plus one token held while a
    /// transition is still being dispatched.
    pending_tasks: u32,
    on_boot_animation: bool,
    fold_status: FoldStatus,
    locked: bool,
    active_panel: Option<SurfaceScreenId>,
}

/// State and collaborators common to every fold policy.
pub struct FoldPolicyCore {
    state: Mutex<FoldPolicyState>,
    host: Arc<dyn FoldScreenHost>,
    power: Arc<dyn PowerManager>,
    scheduler: Arc<dyn TaskScheduler<PowerTask>>,
}

impl FoldPolicyCore {
    pub fn new(
        host: Arc<dyn FoldScreenHost>,
        power: Arc<dyn PowerManager>,
        scheduler: Arc<dyn TaskScheduler<PowerTask>>,
    ) -> Self {
        Self {
            state: Mutex::new(FoldPolicyState::default()),
            host,
            power,
            scheduler,
        }
    }

    pub fn host(&self) -> &dyn FoldScreenHost {
        self.host.as_ref()
    }

    pub fn power(&self) -> &dyn PowerManager {
        self.power.as_ref()
    }

    pub fn current_mode(&self) -> FoldDisplayMode {
        self.lock().current_mode
    }

    pub fn last_requested_mode(&self) -> FoldDisplayMode {
        self.lock().last_requested
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub fn pending_tasks(&self) -> u32 {
        self.lock().pending_tasks
    }

    pub fn is_on_boot_animation(&self) -> bool {
        self.lock().on_boot_animation
    }

    pub fn fold_status(&self) -> FoldStatus {
        self.lock().fold_status
    }

    pub fn set_fold_status(&self, status: FoldStatus) {
        self.lock().fold_status = status;
    }

    pub fn is_locked(&self) -> bool {
        self.lock().locked
    }

    /// Physical panel the bound screen currently shows.
    pub fn active_panel(&self) -> Option<SurfaceScreenId> {
        self.lock().active_panel
    }

    /// Executes one scheduled task and releases its pending slot.
    pub fn run_task(&self, task: PowerTask) {
        debug!(?task, "running fold power task");
        match task {
            PowerTask::ScreenPower { screen, status } => {
                if status == PowerStatus::Off {
                    self.power.set_keyguard_drawn_done(false);
                }
                self.host.set_screen_power(screen, status);
            }
            PowerTask::ScreenPowerOnAndActivate {
                screen,
                screen_was_on,
            } => {
                self.host.set_screen_power(screen, PowerStatus::On);
                if screen_was_on {
                    self.power.refresh_activity();
                } else {
                    self.power.wakeup_device_async();
                }
            }
            PowerTask::SwitchActiveScreen {
                screen,
                tp_power_ctrl,
            } => {
                debug!(%screen, "touch input handed to dark panel");
                self.host.set_tp_feature_config(TP_TYPE_POWER_CTRL, tp_power_ctrl);
            }
            PowerTask::WakeUp {
                reason,
                tp_power_ctrl,
            } => {
                if reason == ModeChangeReason::Recover {
                    info!("recover transition: skipping wake-up");
                    self.host.set_tp_feature_config(TP_TYPE_POWER_CTRL, tp_power_ctrl);
                } else {
                    self.power.wakeup_device_async();
                }
            }
        }
        self.finish_task();
    }

    fn finish_task(&self) {
        let follow_up = {
            let mut state = self.lock();
            state.pending_tasks = state.pending_tasks.saturating_sub(1);
            if state.pending_tasks > 0 || !state.running {
                return;
            }
            state.running = false;
            (state.last_requested != state.current_mode).then_some(state.last_requested)
        };
        debug!("fold transition complete");
        if let Some(mode) = follow_up {
            info!(requested = ?mode, "fold mode request arrived during transition");
            self.host.notify_display_mode_update_requested(mode);
        }
    }

    fn lock(&self) -> MutexGuard<'_, FoldPolicyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A device-specific fold policy.
///
/// Implementors supply the mode tables and the per-mode steps; the provided
/// methods run the shared state machine.
pub trait FoldModePolicy: Send + Sync {
    fn core(&self) -> &FoldPolicyCore;

    /// Mode matching a hinge state; `Unknown` when the state drives nothing.
    fn mode_for_status(&self, status: FoldStatus) -> FoldDisplayMode;

    /// Panel adopted while the boot animation is still showing.
    fn boot_target(&self, mode: FoldDisplayMode) -> Option<(SurfaceScreenId, PropertyChangeReason)>;

    /// Performs the synchronous steps of switching to `mode` and returns
    /// the rest.  `None` means the policy does not support `mode`.
    fn begin_transition(&self, mode: FoldDisplayMode, reason: ModeChangeReason) -> Option<TransitionPlan>;

    fn crease_region(&self) -> FoldCreaseRegion;

    fn change_screen_display_mode(&self, mode: FoldDisplayMode, reason: ModeChangeReason) {
        let core = self.core();
        let booting = {
            let mut state = core.lock();
            state.last_requested = mode;
            if state.running {
                warn!(requested = ?mode, current = ?state.current_mode, "fold transition running; request dropped");
                return;
            }
            if state.current_mode == mode {
                debug!(?mode, "already in requested fold mode");
                return;
            }
            if !state.on_boot_animation {
                state.running = true;
                state.pending_tasks = 1;
            }
            state.on_boot_animation
        };

        if booting {
            match self.boot_target(mode) {
                Some((panel, reason)) => {
                    core.host.apply_fold_property(panel, reason, false);
                    core.lock().active_panel = Some(panel);
                    info!(?mode, %panel, "boot animation running: property switched, mode deferred");
                }
                None => debug!(?mode, "no boot-time target for mode"),
            }
            return;
        }

        let Some(plan) = self.begin_transition(mode, reason) else {
            warn!(?mode, "fold mode not supported by this device");
            let mut state = core.lock();
            state.running = false;
            state.pending_tasks = 0;
            return;
        };

        info!(
            target: "dms::telemetry",
            event = "FOLD_STATUS_CHANGE_BEGIN",
            power_off = ?plan.power_off,
            power_on = ?plan.power_on,
            ?mode,
            ?reason
        );

        for (label, task) in plan.tasks {
            core.lock().pending_tasks += 1;
            if let Err(e) = core.scheduler.post_async_task(task, label) {
                error!(task = label, error = %e, "failed to post fold power task");
                let mut state = core.lock();
                state.pending_tasks = state.pending_tasks.saturating_sub(1);
            }
        }

        core.lock().current_mode = mode;
        if let Some((panel, property_reason)) = plan.property {
            if core.host.apply_fold_property(panel, property_reason, true) {
                core.lock().active_panel = Some(panel);
            }
        }
        core.host.notify_fold_display_mode_changed(mode);
        core.host.switch_scroll_param(mode);
        info!(target: "dms::telemetry", event = "DISPLAY_MODE_CHANGE", ?mode);

        core.finish_task();
    }

    fn send_sensor_result(&self, status: FoldStatus) {
        let mode = self.mode_for_status(status);
        if mode == FoldDisplayMode::Unknown {
            debug!(?status, "fold status maps to no display mode");
            return;
        }
        self.change_screen_display_mode(mode, ModeChangeReason::Default);
    }

    /// Sets the boot flag.  Clearing it re-applies the mode that matches the
    /// last fold status if that differs from the current one.
    fn set_on_boot_animation(&self, on: bool) {
        let core = self.core();
        core.lock().on_boot_animation = on;
        if on {
            return;
        }
        let mode = self.mode_for_status(core.fold_status());
        if mode != FoldDisplayMode::Unknown && mode != core.current_mode() {
            info!(?mode, "boot animation finished; recovering fold mode");
            self.change_screen_display_mode(mode, ModeChangeReason::Default);
        }
    }

    fn lock_display_status(&self, locked: bool) {
        self.core().lock().locked = locked;
        info!(locked, "fold display status lock");
    }

    fn current_mode(&self) -> FoldDisplayMode {
        self.core().current_mode()
    }
}
