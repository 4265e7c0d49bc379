//! Fold policy for devices with a MAIN (inner) and a SUB (outer) panel.

use dms_core::{
    DisplayId, FoldCreaseRegion, FoldDisplayMode, FoldStatus, ModeChangeReason, PowerStatus,
    PropertyChangeReason, SurfaceScreenId,
};

use super::policy::{FoldModePolicy, FoldPolicyCore, TransitionPlan};
use super::single_display::coordination_plan;
use super::{FoldPanels, PowerTask, TP_VALUE_FULL, TP_VALUE_MAIN};
use crate::infrastructure::render_surface::TP_TYPE;

pub struct DualDisplayFoldPolicy {
    panels: FoldPanels,
    core: FoldPolicyCore,
}

impl DualDisplayFoldPolicy {
    pub fn new(panels: FoldPanels, core: FoldPolicyCore) -> Self {
        Self { panels, core }
    }

    fn switch_panel(
        &self,
        off: SurfaceScreenId,
        on: SurfaceScreenId,
        tp_value: &str,
        reason: PropertyChangeReason,
    ) -> TransitionPlan {
        self.core.host().set_tp_feature_config(TP_TYPE, tp_value);
        let screen_was_on = self.core.power().is_screen_on();
        TransitionPlan {
            tasks: vec![
                (
                    "screenOffTask",
                    PowerTask::ScreenPower {
                        screen: off,
                        status: PowerStatus::Off,
                    },
                ),
                (
                    "screenOnTask",
                    PowerTask::ScreenPowerOnAndActivate {
                        screen: on,
                        screen_was_on,
                    },
                ),
            ],
            property: Some((on, reason)),
            power_off: Some(off),
            power_on: Some(on),
        }
    }
}

impl FoldModePolicy for DualDisplayFoldPolicy {
    fn core(&self) -> &FoldPolicyCore {
        &self.core
    }

    fn mode_for_status(&self, status: FoldStatus) -> FoldDisplayMode {
        match status {
            FoldStatus::Expand | FoldStatus::HalfFold => FoldDisplayMode::Main,
            FoldStatus::Folded => FoldDisplayMode::Sub,
            FoldStatus::Unknown => FoldDisplayMode::Unknown,
        }
    }

    fn boot_target(&self, mode: FoldDisplayMode) -> Option<(SurfaceScreenId, PropertyChangeReason)> {
        match mode {
            FoldDisplayMode::Sub => Some((self.panels.secondary, PropertyChangeReason::FoldScreenFolding)),
            FoldDisplayMode::Main => Some((self.panels.primary, PropertyChangeReason::FoldScreenExpand)),
            _ => None,
        }
    }

    fn begin_transition(&self, mode: FoldDisplayMode, _reason: ModeChangeReason) -> Option<TransitionPlan> {
        let FoldPanels {
            primary, secondary, ..
        } = self.panels;
        match mode {
            FoldDisplayMode::Sub => Some(self.switch_panel(
                primary,
                secondary,
                TP_VALUE_MAIN,
                PropertyChangeReason::FoldScreenFolding,
            )),
            FoldDisplayMode::Main => Some(self.switch_panel(
                secondary,
                primary,
                TP_VALUE_FULL,
                PropertyChangeReason::FoldScreenExpand,
            )),
            FoldDisplayMode::Coordination => Some(coordination_plan(&self.core, primary, secondary)),
            FoldDisplayMode::Unknown | FoldDisplayMode::Full | FoldDisplayMode::GlobalFull => None,
        }
    }

    fn crease_region(&self) -> FoldCreaseRegion {
        FoldCreaseRegion {
            display_id: self.core.host().default_display_id().unwrap_or(DisplayId(0)),
            areas: vec![self.panels.crease],
        }
    }
}
