//! Fold display mode management for foldable devices.
//!
//! # How a fold transition works (for beginners)
//!
//! A foldable phone has two physical panels but shows one logical screen.
//! Folding the device must switch that screen from the large inner panel to
//! the small outer one:
//!
//! ```text
//!  sensor: FOLDED ──► FoldStateManager ──► policy.send_sensor_result
//!                                              │
//!                                 change_screen_display_mode(MAIN)
//!                                              │
//!             ┌────────────────────────────────┼────────────────────────┐
//!             ▼                                ▼                        ▼
//!   post PowerTask::ScreenPower       apply MAIN panel property   notify listeners
//!   (FULL off, then MAIN on)          to the bound screen         (mode changed)
//! ```
//!
//! Power changes are [`PowerTask`] values posted to an ordered scheduler, so
//! "panel A off" always runs before "panel B on".  The policy does not run
//! them itself; whoever drains the queue hands each task back through
//! [`FoldScreenController::run_power_task`].
//!
//! # Sub-modules
//!
//! - **`policy`**          – the shared state machine ([`FoldModePolicy`]).
//! - **`single_display`**  – one screen toggled between FULL and MAIN panels.
//! - **`dual_display`**    – MAIN and SUB panels.
//! - **`sensor`**          – hinge-sensor input ([`FoldStateManager`]).
//! - **`controller`**      – the facade the service talks to.

use dms_core::{
    DisplayId, FoldDisplayMode, FoldStatus, ModeChangeReason, PowerStatus, PropertyChangeReason,
    Rect, SurfaceScreenId,
};

pub mod controller;
pub mod dual_display;
pub mod policy;
pub mod sensor;
pub mod single_display;

pub use controller::FoldScreenController;
pub use dual_display::DualDisplayFoldPolicy;
pub use policy::{FoldModePolicy, FoldPolicyCore, TransitionPlan};
pub use sensor::FoldStateManager;
pub use single_display::SingleDisplayFoldPolicy;

/// Touch-panel value selecting the inner (expanded) panel.
pub const TP_VALUE_FULL: &str = "0";
/// Touch-panel value selecting the outer (folded) panel.
pub const TP_VALUE_MAIN: &str = "1";
/// Power-control value used when waking into the inner panel.
pub const TP_POWER_CTRL_FULL: &str = "0,1";
/// Power-control value used when the outer panel stays dark.
pub const TP_POWER_CTRL_MAIN: &str = "1,1";

/// Physical panels of a foldable device and where its hinge lies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldPanels {
    /// Panel used while expanded (FULL on single-display, MAIN on dual).
    pub primary: SurfaceScreenId,
    /// Panel used while folded (MAIN on single-display, SUB on dual).
    pub secondary: SurfaceScreenId,
    pub crease: Rect,
}

/// Side effect executed by the ordered task worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerTask {
    /// Powers a panel on or off.
    ScreenPower {
        screen: SurfaceScreenId,
        status: PowerStatus,
    },
    /// Powers a panel on, then refreshes user activity when the device
    /// screen was already lit or wakes the device when it was dark.
    ScreenPowerOnAndActivate {
        screen: SurfaceScreenId,
        screen_was_on: bool,
    },
    /// Leaves the panel dark but hands touch input to it.
    SwitchActiveScreen {
        screen: SurfaceScreenId,
        tp_power_ctrl: &'static str,
    },
    /// Wakes the device; a recover transition reconfigures the touch panel
    /// instead of waking.
    WakeUp {
        reason: ModeChangeReason,
        tp_power_ctrl: &'static str,
    },
}

/// Everything the fold policies need from the rest of the service.
pub trait FoldScreenHost: Send + Sync {
    /// Copies the property of `physical` onto the fold-bound screen and
    /// re-targets its display node.  With `notify` set, listeners receive a
    /// display size change.  Returns `false` when the screen or the panel's
    /// property is unknown.
    fn apply_fold_property(
        &self,
        physical: SurfaceScreenId,
        reason: PropertyChangeReason,
        notify: bool,
    ) -> bool;

    fn set_screen_power(&self, physical: SurfaceScreenId, status: PowerStatus);

    fn set_tp_feature_config(&self, tp_type: i32, value: &str);

    fn notify_screen_switched(&self);

    fn switch_scroll_param(&self, mode: FoldDisplayMode);

    fn notify_fold_display_mode_changed(&self, mode: FoldDisplayMode);

    /// The most recent request differs from the mode that was applied.
    fn notify_display_mode_update_requested(&self, mode: FoldDisplayMode);

    fn notify_fold_status_changed(&self, status: FoldStatus);

    fn default_display_id(&self) -> Option<DisplayId>;
}
