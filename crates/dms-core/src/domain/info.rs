//! Snapshot DTOs handed to clients.
//!
//! These are plain copies of entity state at query time.  They carry ids,
//! never references, so a client holding one cannot observe or cause later
//! mutations of the topology.

use serde::{Deserialize, Serialize};

use crate::domain::ids::{DisplayId, ScreenId};
use crate::domain::types::{
    Orientation, Point, Rotation, ScreenCombination, ScreenMode, ScreenType,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenInfo {
    pub id: ScreenId,
    pub name: String,
    /// Group the screen currently belongs to.
    pub parent: Option<ScreenId>,
    pub screen_type: ScreenType,
    pub virtual_width: u32,
    pub virtual_height: u32,
    pub virtual_pixel_ratio: f32,
    pub rotation: Rotation,
    pub orientation: Orientation,
    pub mode_id: u32,
    pub modes: Vec<ScreenMode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenGroupInfo {
    pub info: ScreenInfo,
    pub combination: ScreenCombination,
    /// Child ids in ascending order; `positions[i]` belongs to `children[i]`.
    pub children: Vec<ScreenId>,
    pub positions: Vec<Point>,
    pub mirror_source: Option<ScreenId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub id: DisplayId,
    pub screen_id: ScreenId,
    pub width: u32,
    pub height: u32,
    pub refresh_rate: u32,
    pub rotation: Rotation,
    pub orientation: Orientation,
    pub virtual_pixel_ratio: f32,
    pub alive: bool,
}
