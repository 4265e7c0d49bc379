//! Fold policy for devices that show one logical screen on either an inner
//! (FULL) or an outer (MAIN) panel.

use dms_core::{
    DisplayId, FoldCreaseRegion, FoldDisplayMode, FoldStatus, ModeChangeReason, PowerStatus,
    PropertyChangeReason, SurfaceScreenId,
};

use super::policy::{FoldModePolicy, FoldPolicyCore, TransitionPlan};
use super::{
    FoldPanels, PowerTask, TP_POWER_CTRL_FULL, TP_POWER_CTRL_MAIN, TP_VALUE_FULL, TP_VALUE_MAIN,
};
use crate::infrastructure::render_surface::TP_TYPE;

pub struct SingleDisplayFoldPolicy {
    panels: FoldPanels,
    core: FoldPolicyCore,
}

impl SingleDisplayFoldPolicy {
    pub fn new(panels: FoldPanels, core: FoldPolicyCore) -> Self {
        Self { panels, core }
    }

    fn full(&self) -> SurfaceScreenId {
        self.panels.primary
    }

    fn main(&self) -> SurfaceScreenId {
        self.panels.secondary
    }

    fn to_main(&self) -> TransitionPlan {
        let host = self.core.host();
        let power = self.core.power();
        host.notify_screen_switched();
        host.set_tp_feature_config(TP_TYPE, TP_VALUE_MAIN);

        let off = PowerTask::ScreenPower {
            screen: self.full(),
            status: PowerStatus::Off,
        };
        let tasks = if power.is_fold_screen_on() {
            vec![
                ("screenOffFullTask", off),
                (
                    "screenOnMainTask",
                    PowerTask::ScreenPower {
                        screen: self.main(),
                        status: PowerStatus::On,
                    },
                ),
            ]
        } else {
            // Folding a dark device: the outer panel stays off.
            power.force_skip_screen_off_animation();
            vec![
                ("screenOffFullTask", off),
                (
                    "switchMainTask",
                    PowerTask::SwitchActiveScreen {
                        screen: self.main(),
                        tp_power_ctrl: TP_POWER_CTRL_MAIN,
                    },
                ),
            ]
        };

        TransitionPlan {
            tasks,
            property: Some((self.main(), PropertyChangeReason::FoldScreenFolding)),
            power_off: Some(self.full()),
            power_on: Some(self.main()),
        }
    }

    fn to_full(&self, reason: ModeChangeReason) -> TransitionPlan {
        let host = self.core.host();
        let power = self.core.power();
        host.notify_screen_switched();
        host.set_tp_feature_config(TP_TYPE, TP_VALUE_FULL);

        let off = PowerTask::ScreenPower {
            screen: self.main(),
            status: PowerStatus::Off,
        };
        // An ambient-display screen-off can still be cancelled in place;
        // only a truly dark device needs the wake sequence.
        let tasks = if power.is_fold_screen_on() || power.try_cancel_screen_off() {
            vec![
                ("screenOffMainTask", off),
                (
                    "screenOnFullTask",
                    PowerTask::ScreenPower {
                        screen: self.full(),
                        status: PowerStatus::On,
                    },
                ),
            ]
        } else {
            vec![
                ("screenOffMainTask", off),
                (
                    "wakeUpTask",
                    PowerTask::WakeUp {
                        reason,
                        tp_power_ctrl: TP_POWER_CTRL_FULL,
                    },
                ),
            ]
        };

        TransitionPlan {
            tasks,
            property: Some((self.full(), PropertyChangeReason::FoldScreenExpand)),
            power_off: Some(self.main()),
            power_on: Some(self.full()),
        }
    }
}

impl FoldModePolicy for SingleDisplayFoldPolicy {
    fn core(&self) -> &FoldPolicyCore {
        &self.core
    }

    fn mode_for_status(&self, status: FoldStatus) -> FoldDisplayMode {
        match status {
            FoldStatus::Expand | FoldStatus::HalfFold => FoldDisplayMode::Full,
            FoldStatus::Folded => FoldDisplayMode::Main,
            FoldStatus::Unknown => FoldDisplayMode::Unknown,
        }
    }

    fn boot_target(&self, mode: FoldDisplayMode) -> Option<(SurfaceScreenId, PropertyChangeReason)> {
        match mode {
            FoldDisplayMode::Main => Some((self.main(), PropertyChangeReason::FoldScreenFolding)),
            FoldDisplayMode::Full => Some((self.full(), PropertyChangeReason::FoldScreenExpand)),
            _ => None,
        }
    }

    fn begin_transition(&self, mode: FoldDisplayMode, reason: ModeChangeReason) -> Option<TransitionPlan> {
        match mode {
            FoldDisplayMode::Main => Some(self.to_main()),
            FoldDisplayMode::Full => Some(self.to_full(reason)),
            FoldDisplayMode::Coordination => Some(coordination_plan(
                &self.core,
                self.full(),
                self.main(),
            )),
            FoldDisplayMode::Unknown | FoldDisplayMode::Sub | FoldDisplayMode::GlobalFull => None,
        }
    }

    fn crease_region(&self) -> FoldCreaseRegion {
        FoldCreaseRegion {
            display_id: self.core.host().default_display_id().unwrap_or(DisplayId(0)),
            areas: vec![self.panels.crease],
        }
    }
}

/// Both panels lit at once; the second one also wakes a dark device.
pub(crate) fn coordination_plan(
    core: &FoldPolicyCore,
    first: SurfaceScreenId,
    second: SurfaceScreenId,
) -> TransitionPlan {
    let screen_was_on = core.power().is_screen_on();
    TransitionPlan {
        tasks: vec![
            (
                "screenOnFirstTask",
                PowerTask::ScreenPower {
                    screen: first,
                    status: PowerStatus::On,
                },
            ),
            (
                "screenOnSecondTask",
                PowerTask::ScreenPowerOnAndActivate {
                    screen: second,
                    screen_was_on,
                },
            ),
        ],
        property: None,
        power_off: None,
        power_on: Some(second),
    }
}
