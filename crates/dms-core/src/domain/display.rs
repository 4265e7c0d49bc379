//! Logical display: what window clients see of a screen.

use crate::domain::events::DisplayChangeEvent;
use crate::domain::ids::{DisplayId, ScreenId};
use crate::domain::info::DisplayInfo;
use crate::domain::screen::ScreenEntity;
use crate::domain::types::{Orientation, Rotation};

pub const DEFAULT_DISPLAY_WIDTH: u32 = 720;
pub const DEFAULT_DISPLAY_HEIGHT: u32 = 1280;
pub const DEFAULT_REFRESH_RATE: u32 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayEntity {
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

impl DisplayEntity {
    /// A display with the built-in defaults, not yet derived from a screen.
    pub fn new(id: DisplayId, screen_id: ScreenId) -> Self {
        Self {
            id,
            screen_id,
            width: DEFAULT_DISPLAY_WIDTH,
            height: DEFAULT_DISPLAY_HEIGHT,
            refresh_rate: DEFAULT_REFRESH_RATE,
            rotation: Rotation::Rotation0,
            orientation: Orientation::Unspecified,
            virtual_pixel_ratio: 1.0,
            alive: true,
        }
    }

    pub fn from_screen(id: DisplayId, screen: &ScreenEntity) -> Self {
        let mut display = Self::new(id, screen.id);
        display.update_from(screen);
        display
    }

    /// Re-derives every field from `screen` and reports the most
    /// significant kind of change, or `None` if nothing moved.
    ///
    /// Precedence: rotation, size, pixel ratio, refresh rate, orientation.
    pub fn update_from(&mut self, screen: &ScreenEntity) -> Option<DisplayChangeEvent> {
        let property = screen.property();
        let (width, height) = if screen.rotation.is_vertical() {
            (property.width, property.height)
        } else {
            (property.height, property.width)
        };

        let event = if screen.rotation != self.rotation {
            Some(DisplayChangeEvent::UpdateRotation)
        } else if (width, height) != (self.width, self.height) {
            Some(DisplayChangeEvent::DisplaySizeChanged)
        } else if screen.virtual_pixel_ratio != self.virtual_pixel_ratio {
            Some(DisplayChangeEvent::DisplayVirtualPixelRatioChanged)
        } else if property.refresh_rate != self.refresh_rate {
            Some(DisplayChangeEvent::UpdateRefreshRate)
        } else if screen.orientation != self.orientation {
            Some(DisplayChangeEvent::UpdateOrientation)
        } else {
            None
        };

        self.width = width;
        self.height = height;
        self.refresh_rate = property.refresh_rate;
        self.rotation = screen.rotation;
        self.orientation = screen.orientation;
        self.virtual_pixel_ratio = screen.virtual_pixel_ratio;
        event
    }

    pub fn is_vertical(&self) -> bool {
        self.rotation.is_vertical()
    }

    pub fn to_info(&self) -> DisplayInfo {
        DisplayInfo {
            id: self.id,
            screen_id: self.screen_id,
            width: self.width,
            height: self.height,
            refresh_rate: self.refresh_rate,
            rotation: self.rotation,
            orientation: self.orientation,
            virtual_pixel_ratio: self.virtual_pixel_ratio,
            alive: self.alive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::SurfaceScreenId;
    use crate::domain::types::{ScreenMode, ScreenType};

    fn screen() -> ScreenEntity {
        ScreenEntity::new(
            ScreenId(0),
            SurfaceScreenId(7),
            ScreenType::Real,
            vec![ScreenMode::new(1920, 1080, 60), ScreenMode::new(1280, 720, 90)],
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_new_display_uses_defaults() {
        let d = DisplayEntity::new(DisplayId(0), ScreenId(0));
        assert_eq!((d.width, d.height, d.refresh_rate), (720, 1280, 60));
        assert_eq!(d.virtual_pixel_ratio, 1.0);
    }

    #[test]
    fn test_from_screen_copies_active_mode() {
        let d = DisplayEntity::from_screen(DisplayId(3), &screen());
        assert_eq!((d.width, d.height, d.refresh_rate), (1920, 1080, 60));
        assert_eq!(d.screen_id, ScreenId(0));
        assert_eq!(d.rotation, Rotation::Rotation0);
    }

    #[test]
    fn test_update_from_rotated_screen_swaps_size_and_reports_rotation() {
        // Arrange
        let mut s = screen();
        let mut d = DisplayEntity::from_screen(DisplayId(0), &s);
        s.set_orientation(Orientation::Horizontal);

        // Act
        let event = d.update_from(&s);

        // Assert
        assert_eq!(event, Some(DisplayChangeEvent::UpdateRotation));
        assert_eq!((d.width, d.height), (1080, 1920));
        assert!(!d.is_vertical());
    }

    #[test]
    fn test_update_from_mode_change_reports_size_change() {
        let mut s = screen();
        let mut d = DisplayEntity::from_screen(DisplayId(0), &s);
        s.set_active_mode(1).unwrap();
        assert_eq!(d.update_from(&s), Some(DisplayChangeEvent::DisplaySizeChanged));
        assert_eq!(d.refresh_rate, 90);
    }

    #[test]
    fn test_update_from_unchanged_screen_reports_nothing() {
        let s = screen();
        let mut d = DisplayEntity::from_screen(DisplayId(0), &s);
        assert_eq!(d.update_from(&s), None);
    }

    #[test]
    fn test_update_from_pixel_ratio_change() {
        let mut s = screen();
        let mut d = DisplayEntity::from_screen(DisplayId(0), &s);
        s.virtual_pixel_ratio = 2.0;
        assert_eq!(
            d.update_from(&s),
            Some(DisplayChangeEvent::DisplayVirtualPixelRatioChanged)
        );
    }
}
