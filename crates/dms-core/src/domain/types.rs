//! Small value types shared by screens, groups and displays.

use serde::{Deserialize, Serialize};

/// One supported resolution/refresh combination of a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenMode {
    pub width: u32,
    pub height: u32,
    pub refresh_rate: u32,
}

impl ScreenMode {
    pub const fn new(width: u32, height: u32, refresh_rate: u32) -> Self {
        Self {
            width,
            height,
            refresh_rate,
        }
    }
}

/// Placement of a group child, in pixels relative to the group origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Clockwise rotation of the rendered content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl Rotation {
    /// `true` when content keeps the panel's native aspect (0° or 180°).
    pub fn is_vertical(self) -> bool {
        matches!(self, Rotation::Rotation0 | Rotation::Rotation180)
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Rotation0 => 0,
            Rotation::Rotation90 => 90,
            Rotation::Rotation180 => 180,
            Rotation::Rotation270 => 270,
        }
    }
}

/// Requested orientation of a screen.  Discriminants match the values used
/// by window-manager clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Orientation {
    #[default]
    Unspecified = 0,
    Vertical = 1,
    Horizontal = 2,
    ReverseVertical = 3,
    ReverseHorizontal = 4,
    Sensor = 5,
    SensorVertical = 6,
    SensorHorizontal = 7,
    AutoRotationRestricted = 8,
    AutoRotationPortraitRestricted = 9,
    AutoRotationLandscapeRestricted = 10,
    Locked = 11,
}

impl Orientation {
    /// Fixed rotation implied by an explicit orientation, `None` for the
    /// sensor-driven and unspecified ones.
    pub fn implied_rotation(self) -> Option<Rotation> {
        match self {
            Orientation::Vertical => Some(Rotation::Rotation0),
            Orientation::Horizontal => Some(Rotation::Rotation90),
            Orientation::ReverseVertical => Some(Rotation::Rotation180),
            Orientation::ReverseHorizontal => Some(Rotation::Rotation270),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScreenType {
    #[default]
    Undefined,
    Real,
    Virtual,
}

/// How the children of a screen group share content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScreenCombination {
    Alone,
    Expand,
    Mirror,
    Unique,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerStatus {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorGamut {
    Invalid,
    Native,
    StandardBt601,
    StandardBt709,
    DciP3,
    Srgb,
    AdobeRgb,
    DisplayP3,
    Bt2020,
    Bt2100Pq,
    Bt2100Hlg,
    DisplayBt2020,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamutMap {
    #[default]
    Constant,
    Extension,
    HdrConstant,
    HdrExtension,
}

/// Opaque handle to a producer surface that a virtual screen renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceHandle(pub u64);

/// Parameters for creating a virtual screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualScreenOption {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub density: f32,
    pub surface: Option<SurfaceHandle>,
    pub flags: u32,
    pub is_for_shot: bool,
}

impl VirtualScreenOption {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            density: 1.0,
            surface: None,
            flags: 0,
            is_for_shot: true,
        }
    }
}

/// Captured display content, tightly packed RGBA8.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_is_vertical_for_0_and_180() {
        assert!(Rotation::Rotation0.is_vertical());
        assert!(Rotation::Rotation180.is_vertical());
        assert!(!Rotation::Rotation90.is_vertical());
        assert!(!Rotation::Rotation270.is_vertical());
    }

    #[test]
    fn test_orientation_implied_rotation() {
        assert_eq!(
            Orientation::Horizontal.implied_rotation(),
            Some(Rotation::Rotation90)
        );
        assert_eq!(
            Orientation::ReverseHorizontal.implied_rotation(),
            Some(Rotation::Rotation270)
        );
        assert_eq!(Orientation::Sensor.implied_rotation(), None);
        assert_eq!(Orientation::Unspecified.implied_rotation(), None);
    }
}
