//! Rendering-surface seam.
//!
//! Everything the service needs from the compositor goes through the
//! [`RenderSurface`] trait: querying a panel's modes, powering it, and
//! building the display-node tree that decides what is drawn where.
//!
//! # Testability
//!
//! [`mock::MockRenderSurface`] keeps every node and call in memory so tests
//! can assert the exact tree the topology controller built.  The service
//! binary also runs on it, seeded from the `[[mock_screens]]` config table,
//! until a compositor backend is wired in.

use tokio::sync::mpsc;

use dms_core::{
    ColorGamut, FoldDisplayMode, GamutMap, NodeHandle, PixelBuffer, PowerStatus, ScreenMode,
    SurfaceHandle, SurfaceScreenId, VirtualScreenOption,
};

pub mod mock;

/// Numeric status returned by the rendering backend on failure.
pub type BackendStatus = i32;

/// Hot-plug notification delivered by the rendering backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenConnection {
    Connected,
    Disconnected,
    ModeChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceConnectionEvent {
    pub surface_id: SurfaceScreenId,
    pub connection: ScreenConnection,
}

/// What a new display node should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayNodeConfig {
    /// Panel the node draws to; `None` for group container nodes.
    pub surface_id: Option<SurfaceScreenId>,
    /// Node whose content is reproduced instead of the node's own subtree.
    pub mirror_of: Option<NodeHandle>,
}

impl DisplayNodeConfig {
    pub fn screen(surface_id: SurfaceScreenId) -> Self {
        Self {
            surface_id: Some(surface_id),
            mirror_of: None,
        }
    }

    pub fn mirrored(surface_id: SurfaceScreenId, source: NodeHandle) -> Self {
        Self {
            surface_id: Some(surface_id),
            mirror_of: Some(source),
        }
    }

    pub fn container(mirror_of: Option<NodeHandle>) -> Self {
        Self {
            surface_id: None,
            mirror_of,
        }
    }
}

/// Touch-panel feature id selecting the active panel.
pub const TP_TYPE: i32 = 12;
/// Touch-panel feature id for the panel's power-control mode.
pub const TP_TYPE_POWER_CTRL: i32 = 18;

pub trait RenderSurface: Send + Sync {
    /// Returns a receiver for hot-plug events.  Only the most recent
    /// subscriber receives events.
    fn subscribe_connection_events(&self) -> mpsc::UnboundedReceiver<SurfaceConnectionEvent>;

    fn supported_modes(&self, surface_id: SurfaceScreenId) -> Vec<ScreenMode>;

    /// Index of the active mode, `None` if the backend cannot tell.
    fn active_mode(&self, surface_id: SurfaceScreenId) -> Option<usize>;

    fn set_screen_active_mode(
        &self,
        surface_id: SurfaceScreenId,
        index: usize,
    ) -> Result<(), BackendStatus>;

    fn set_screen_power_status(&self, surface_id: SurfaceScreenId, status: PowerStatus);

    fn create_display_node(&self, config: DisplayNodeConfig) -> Option<NodeHandle>;

    fn set_display_offset(&self, node: NodeHandle, x: i32, y: i32);

    /// Re-targets an existing node at another panel.
    fn set_display_node_screen(&self, node: NodeHandle, surface_id: SurfaceScreenId);

    /// Attaches `child` under `parent`, or under the tree root when `parent`
    /// is `None`.
    fn add_child(&self, parent: Option<NodeHandle>, child: NodeHandle, z_order: i32);

    fn remove_from_tree(&self, node: NodeHandle);

    fn create_virtual_screen(&self, option: &VirtualScreenOption) -> Option<SurfaceScreenId>;

    fn remove_virtual_screen(&self, surface_id: SurfaceScreenId);

    fn set_virtual_screen_surface(
        &self,
        surface_id: SurfaceScreenId,
        surface: SurfaceHandle,
    ) -> Result<(), BackendStatus>;

    fn supported_color_gamuts(
        &self,
        surface_id: SurfaceScreenId,
    ) -> Result<Vec<ColorGamut>, BackendStatus>;

    fn color_gamut(&self, surface_id: SurfaceScreenId) -> Result<ColorGamut, BackendStatus>;

    fn set_color_gamut(&self, surface_id: SurfaceScreenId, index: u32) -> Result<(), BackendStatus>;

    fn gamut_map(&self, surface_id: SurfaceScreenId) -> Result<GamutMap, BackendStatus>;

    fn set_gamut_map(&self, surface_id: SurfaceScreenId, map: GamutMap)
        -> Result<(), BackendStatus>;

    fn take_snapshot(&self, surface_id: SurfaceScreenId) -> Option<PixelBuffer>;

    fn set_tp_feature_config(&self, tp_type: i32, value: &str);

    /// Tells the compositor the active fold panel is about to change.
    fn notify_screen_switched(&self);

    /// Applies the scroll/animation tuning for a fold display mode.
    fn set_scroll_param(&self, mode: FoldDisplayMode);
}
