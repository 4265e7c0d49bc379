//! Fold-related value types.

use serde::{Deserialize, Serialize};

use crate::domain::ids::DisplayId;
use crate::domain::types::Rect;

/// Logical configuration of a foldable device's screens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum FoldDisplayMode {
    #[default]
    Unknown = 0,
    Full = 1,
    Main = 2,
    Sub = 3,
    Coordination = 4,
    GlobalFull = 5,
}

/// Hinge state reported by the fold sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum FoldStatus {
    #[default]
    Unknown = 0,
    Expand = 1,
    Folded = 2,
    HalfFold = 3,
}

/// Why a fold display mode change was requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeChangeReason {
    #[default]
    Default,
    /// Re-applying a mode after an abnormal state; never wakes the device.
    Recover,
}

/// Reason tag attached to a screen property refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyChangeReason {
    FoldScreenExpand,
    FoldScreenFolding,
}

/// Region of the display covered by the hinge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldCreaseRegion {
    pub display_id: DisplayId,
    pub areas: Vec<Rect>,
}
