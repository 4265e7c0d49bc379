//! Single-screen entity of the topology model.
//!
//! A [`ScreenEntity`] can only be built from a non-empty mode list and an
//! in-range active index, so a half-initialised screen never exists: the
//! "connect failed, screen not ready" case is the constructor's `Err`.

use crate::domain::ids::{NodeHandle, ScreenId, SurfaceScreenId};
use crate::domain::info::ScreenInfo;
use crate::domain::types::{Orientation, Rotation, ScreenMode, ScreenType};
use crate::error::{DmError, DmResult};

/// Rendering bounds of a screen.
///
/// Normally derived from the active mode.  On foldable devices the bounds
/// are overwritten with the active physical panel's property when the fold
/// mode changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenProperty {
    pub width: u32,
    pub height: u32,
    pub refresh_rate: u32,
    pub phys_width: u32,
    pub phys_height: u32,
}

impl From<ScreenMode> for ScreenProperty {
    fn from(mode: ScreenMode) -> Self {
        Self {
            width: mode.width,
            height: mode.height,
            refresh_rate: mode.refresh_rate,
            phys_width: mode.width,
            phys_height: mode.height,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScreenEntity {
    pub id: ScreenId,
    pub surface_id: SurfaceScreenId,
    pub name: String,
    pub screen_type: ScreenType,
    pub virtual_pixel_ratio: f32,
    pub rotation: Rotation,
    pub orientation: Orientation,
    /// Display node owned by this screen while it is attached to the tree.
    pub node: Option<NodeHandle>,
    modes: Vec<ScreenMode>,
    active_mode_index: usize,
    group_id: Option<ScreenId>,
    last_group_id: Option<ScreenId>,
    property: ScreenProperty,
}

impl ScreenEntity {
    /// Builds a screen from the modes reported by the rendering surface.
    ///
    /// # Errors
    ///
    /// [`DmError::InvalidParam`] when `modes` is empty or `active_mode_index`
    /// does not index into it.
    pub fn new(
        id: ScreenId,
        surface_id: SurfaceScreenId,
        screen_type: ScreenType,
        modes: Vec<ScreenMode>,
        active_mode_index: usize,
    ) -> DmResult<Self> {
        let active = validate_modes(&modes, active_mode_index)?;
        Ok(Self {
            id,
            surface_id,
            name: format!("screen_{}", id.0),
            screen_type,
            virtual_pixel_ratio: 1.0,
            rotation: Rotation::Rotation0,
            orientation: Orientation::Unspecified,
            node: None,
            modes,
            active_mode_index,
            group_id: None,
            last_group_id: None,
            property: ScreenProperty::from(active),
        })
    }

    pub fn modes(&self) -> &[ScreenMode] {
        &self.modes
    }

    pub fn active_mode_index(&self) -> usize {
        self.active_mode_index
    }

    pub fn active_mode(&self) -> ScreenMode {
        self.modes[self.active_mode_index]
    }

    /// Switches to another supported mode and resets the bounds to it.
    ///
    /// # Errors
    ///
    /// [`DmError::InvalidParam`] when `index >= modes().len()`.
    pub fn set_active_mode(&mut self, index: usize) -> DmResult<()> {
        let mode = validate_modes(&self.modes, index)?;
        self.active_mode_index = index;
        self.property = ScreenProperty::from(mode);
        Ok(())
    }

    /// Replaces the whole mode list, e.g. after the renderer reports a
    /// hot-plugged panel's new capabilities.
    pub fn replace_modes(&mut self, modes: Vec<ScreenMode>, active_mode_index: usize) -> DmResult<()> {
        let mode = validate_modes(&modes, active_mode_index)?;
        self.modes = modes;
        self.active_mode_index = active_mode_index;
        self.property = ScreenProperty::from(mode);
        Ok(())
    }

    pub fn property(&self) -> ScreenProperty {
        self.property
    }

    /// Overwrites the bounds with a physical panel's property (fold path).
    pub fn apply_property(&mut self, property: ScreenProperty) {
        self.property = property;
    }

    /// Stores `orientation` and adopts the rotation it implies.
    ///
    /// Returns `true` when the rotation changed as well.
    pub fn set_orientation(&mut self, orientation: Orientation) -> bool {
        self.orientation = orientation;
        match orientation.implied_rotation() {
            Some(rotation) if rotation != self.rotation => {
                self.rotation = rotation;
                true
            }
            _ => false,
        }
    }

    pub fn group_id(&self) -> Option<ScreenId> {
        self.group_id
    }

    pub fn last_group_id(&self) -> Option<ScreenId> {
        self.last_group_id
    }

    /// Moves the screen into `group`, remembering where it came from.
    ///
    /// The previous group pointer is cleared before the new one is set, so
    /// the entity never refers to two groups at once.
    pub fn join_group(&mut self, group: ScreenId) {
        self.last_group_id = self.group_id.take();
        self.group_id = Some(group);
    }

    /// Detaches the screen from its group and returns the old group id.
    pub fn leave_group(&mut self) -> Option<ScreenId> {
        let old = self.group_id.take();
        if old.is_some() {
            self.last_group_id = old;
        }
        old
    }

    pub fn to_info(&self) -> ScreenInfo {
        ScreenInfo {
            id: self.id,
            name: self.name.clone(),
            parent: self.group_id,
            screen_type: self.screen_type,
            virtual_width: self.property.width,
            virtual_height: self.property.height,
            virtual_pixel_ratio: self.virtual_pixel_ratio,
            rotation: self.rotation,
            orientation: self.orientation,
            mode_id: self.active_mode_index as u32,
            modes: self.modes.clone(),
        }
    }
}

fn validate_modes(modes: &[ScreenMode], index: usize) -> DmResult<ScreenMode> {
    if modes.is_empty() {
        return Err(DmError::invalid("screen reports no supported modes"));
    }
    modes.get(index).copied().ok_or_else(|| {
        DmError::invalid(format!(
            "mode index {index} out of range ({} modes)",
            modes.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modes() -> Vec<ScreenMode> {
        vec![ScreenMode::new(1920, 1080, 60), ScreenMode::new(1280, 720, 60)]
    }

    fn screen() -> ScreenEntity {
        ScreenEntity::new(ScreenId(0), SurfaceScreenId(7), ScreenType::Real, modes(), 0).unwrap()
    }

    #[test]
    fn test_new_screen_rejects_empty_modes() {
        let result = ScreenEntity::new(ScreenId(0), SurfaceScreenId(1), ScreenType::Real, vec![], 0);
        assert!(matches!(result, Err(DmError::InvalidParam(_))));
    }

    #[test]
    fn test_new_screen_rejects_out_of_range_active_index() {
        let result = ScreenEntity::new(ScreenId(0), SurfaceScreenId(1), ScreenType::Real, modes(), 2);
        assert!(matches!(result, Err(DmError::InvalidParam(_))));
    }

    #[test]
    fn test_new_screen_takes_bounds_from_active_mode() {
        let s = screen();
        assert_eq!(s.property().width, 1920);
        assert_eq!(s.property().height, 1080);
        assert_eq!(s.to_info().virtual_width, 1920);
    }

    #[test]
    fn test_set_active_mode_updates_bounds() {
        // Arrange
        let mut s = screen();

        // Act
        s.set_active_mode(1).unwrap();

        // Assert
        assert_eq!(s.active_mode_index(), 1);
        assert_eq!(s.property().width, 1280);
    }

    #[test]
    fn test_set_active_mode_out_of_range_keeps_state() {
        let mut s = screen();
        for bad in [2usize, 3, usize::MAX] {
            assert!(matches!(s.set_active_mode(bad), Err(DmError::InvalidParam(_))));
        }
        assert_eq!(s.active_mode_index(), 0);
    }

    #[test]
    fn test_join_group_records_previous_group() {
        // Arrange
        let mut s = screen();
        s.join_group(ScreenId(10));

        // Act
        s.join_group(ScreenId(11));

        // Assert
        assert_eq!(s.group_id(), Some(ScreenId(11)));
        assert_eq!(s.last_group_id(), Some(ScreenId(10)));
    }

    #[test]
    fn test_set_orientation_reports_rotation_change() {
        let mut s = screen();
        assert!(s.set_orientation(Orientation::Horizontal));
        assert_eq!(s.rotation, Rotation::Rotation90);
        // Same rotation again: orientation stored, rotation unchanged.
        assert!(!s.set_orientation(Orientation::Horizontal));
        // Sensor orientation keeps the current rotation.
        assert!(!s.set_orientation(Orientation::Sensor));
        assert_eq!(s.rotation, Rotation::Rotation90);
        assert_eq!(s.orientation, Orientation::Sensor);
    }
}
