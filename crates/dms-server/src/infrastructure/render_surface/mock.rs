//! In-memory rendering surface.
//!
//! Records every call and keeps a model of panels and display nodes so tests
//! can inspect the node tree the topology controller produced.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc::{self, UnboundedSender};

use dms_core::{
    ColorGamut, FoldDisplayMode, GamutMap, NodeHandle, PixelBuffer, PowerStatus, ScreenMode,
    SurfaceHandle, SurfaceScreenId, VirtualScreenOption,
};

use super::{
    BackendStatus, DisplayNodeConfig, RenderSurface, ScreenConnection, SurfaceConnectionEvent,
};

/// Status the mock reports for out-of-range arguments.
pub const INVALID_ARGUMENTS_STATUS: BackendStatus = 3;

/// First surface id handed out for virtual screens.
const FIRST_VIRTUAL_SURFACE_ID: u64 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    SetPower(SurfaceScreenId, PowerStatus),
    SetActiveMode(SurfaceScreenId, usize),
    CreateNode(NodeHandle, DisplayNodeConfig),
    SetOffset(NodeHandle, i32, i32),
    SetNodeScreen(NodeHandle, SurfaceScreenId),
    AddChild {
        parent: Option<NodeHandle>,
        child: NodeHandle,
        z_order: i32,
    },
    RemoveFromTree(NodeHandle),
    TpFeatureConfig(i32, String),
    ScreenSwitched,
    ScrollParam(FoldDisplayMode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockNode {
    pub config: DisplayNodeConfig,
    pub surface_id: Option<SurfaceScreenId>,
    pub offset: (i32, i32),
    pub parent: Option<NodeHandle>,
    pub attached: bool,
}

#[derive(Debug, Clone)]
struct MockPanel {
    modes: Vec<ScreenMode>,
    active: Option<usize>,
    power: Option<PowerStatus>,
    gamuts: Vec<ColorGamut>,
    gamut_index: usize,
    gamut_map: GamutMap,
    surface: Option<SurfaceHandle>,
}

impl MockPanel {
    fn new(modes: Vec<ScreenMode>, active: Option<usize>) -> Self {
        Self {
            modes,
            active,
            power: None,
            gamuts: vec![ColorGamut::Native],
            gamut_index: 0,
            gamut_map: GamutMap::Constant,
            surface: None,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    panels: HashMap<SurfaceScreenId, MockPanel>,
    nodes: HashMap<NodeHandle, MockNode>,
    next_node: u64,
    next_virtual: u64,
    calls: Vec<RenderCall>,
    backend_failure: Option<BackendStatus>,
    refuse_nodes: bool,
}

/// A mock implementation of [`RenderSurface`].
pub struct MockRenderSurface {
    state: Mutex<MockState>,
    events: Mutex<Option<UnboundedSender<SurfaceConnectionEvent>>>,
}

impl MockRenderSurface {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                next_virtual: FIRST_VIRTUAL_SURFACE_ID,
                ..Default::default()
            }),
            events: Mutex::new(None),
        }
    }

    /// Registers a panel without announcing it.
    pub fn add_panel(&self, surface_id: SurfaceScreenId, modes: Vec<ScreenMode>, active: Option<usize>) {
        self.lock()
            .panels
            .insert(surface_id, MockPanel::new(modes, active));
    }

    /// Registers a panel and announces it to the subscriber.
    pub fn plug(&self, surface_id: SurfaceScreenId, modes: Vec<ScreenMode>, active: Option<usize>) {
        self.add_panel(surface_id, modes, active);
        self.emit(surface_id, ScreenConnection::Connected);
    }

    pub fn unplug(&self, surface_id: SurfaceScreenId) {
        self.lock().panels.remove(&surface_id);
        self.emit(surface_id, ScreenConnection::Disconnected);
    }

    /// Replaces a panel's modes and announces the change.
    pub fn change_modes(&self, surface_id: SurfaceScreenId, modes: Vec<ScreenMode>, active: Option<usize>) {
        if let Some(panel) = self.lock().panels.get_mut(&surface_id) {
            panel.modes = modes;
            panel.active = active;
        }
        self.emit(surface_id, ScreenConnection::ModeChanged);
    }

    /// Makes every fallible backend call fail with `status` (or succeed again
    /// with `None`).
    pub fn fail_backend_with(&self, status: Option<BackendStatus>) {
        self.lock().backend_failure = status;
    }

    pub fn refuse_node_creation(&self, refuse: bool) {
        self.lock().refuse_nodes = refuse;
    }

    pub fn set_supported_gamuts(&self, surface_id: SurfaceScreenId, gamuts: Vec<ColorGamut>) {
        if let Some(panel) = self.lock().panels.get_mut(&surface_id) {
            panel.gamuts = gamuts;
            panel.gamut_index = 0;
        }
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Power calls in the order they were made.
    pub fn power_calls(&self) -> Vec<(SurfaceScreenId, PowerStatus)> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                RenderCall::SetPower(id, status) => Some((*id, *status)),
                _ => None,
            })
            .collect()
    }

    pub fn tp_configs(&self) -> Vec<(i32, String)> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                RenderCall::TpFeatureConfig(tp, value) => Some((*tp, value.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn power_status(&self, surface_id: SurfaceScreenId) -> Option<PowerStatus> {
        self.lock().panels.get(&surface_id).and_then(|p| p.power)
    }

    pub fn node(&self, node: NodeHandle) -> Option<MockNode> {
        self.lock().nodes.get(&node).cloned()
    }

    /// Nodes currently attached to the tree.
    pub fn attached_node_count(&self) -> usize {
        self.lock().nodes.values().filter(|n| n.attached).count()
    }

    pub fn virtual_surface(&self, surface_id: SurfaceScreenId) -> Option<SurfaceHandle> {
        self.lock().panels.get(&surface_id).and_then(|p| p.surface)
    }

    pub fn has_panel(&self, surface_id: SurfaceScreenId) -> bool {
        self.lock().panels.contains_key(&surface_id)
    }

    fn emit(&self, surface_id: SurfaceScreenId, connection: ScreenConnection) {
        let guard = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = guard.as_ref() {
            // A dropped receiver only means nobody is listening any more.
            let _ = tx.send(SurfaceConnectionEvent {
                surface_id,
                connection,
            });
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fallible<T>(&self, f: impl FnOnce(&mut MockState) -> Result<T, BackendStatus>) -> Result<T, BackendStatus> {
        let mut state = self.lock();
        if let Some(status) = state.backend_failure {
            return Err(status);
        }
        f(&mut state)
    }
}

impl Default for MockRenderSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSurface for MockRenderSurface {
    fn subscribe_connection_events(&self) -> mpsc::UnboundedReceiver<SurfaceConnectionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.events.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        rx
    }

    fn supported_modes(&self, surface_id: SurfaceScreenId) -> Vec<ScreenMode> {
        self.lock()
            .panels
            .get(&surface_id)
            .map(|p| p.modes.clone())
            .unwrap_or_default()
    }

    fn active_mode(&self, surface_id: SurfaceScreenId) -> Option<usize> {
        self.lock().panels.get(&surface_id).and_then(|p| p.active)
    }

    fn set_screen_active_mode(&self, surface_id: SurfaceScreenId, index: usize) -> Result<(), BackendStatus> {
        self.fallible(|state| {
            state.calls.push(RenderCall::SetActiveMode(surface_id, index));
            let panel = state
                .panels
                .get_mut(&surface_id)
                .ok_or(INVALID_ARGUMENTS_STATUS)?;
            if index >= panel.modes.len() {
                return Err(INVALID_ARGUMENTS_STATUS);
            }
            panel.active = Some(index);
            Ok(())
        })
    }

    fn set_screen_power_status(&self, surface_id: SurfaceScreenId, status: PowerStatus) {
        let mut state = self.lock();
        state.calls.push(RenderCall::SetPower(surface_id, status));
        if let Some(panel) = state.panels.get_mut(&surface_id) {
            panel.power = Some(status);
        }
    }

    fn create_display_node(&self, config: DisplayNodeConfig) -> Option<NodeHandle> {
        let mut state = self.lock();
        if state.refuse_nodes {
            return None;
        }
        let handle = NodeHandle(state.next_node);
        state.next_node += 1;
        state.nodes.insert(
            handle,
            MockNode {
                config,
                surface_id: config.surface_id,
                offset: (0, 0),
                parent: None,
                attached: false,
            },
        );
        state.calls.push(RenderCall::CreateNode(handle, config));
        Some(handle)
    }

    fn set_display_offset(&self, node: NodeHandle, x: i32, y: i32) {
        let mut state = self.lock();
        state.calls.push(RenderCall::SetOffset(node, x, y));
        if let Some(n) = state.nodes.get_mut(&node) {
            n.offset = (x, y);
        }
    }

    fn set_display_node_screen(&self, node: NodeHandle, surface_id: SurfaceScreenId) {
        let mut state = self.lock();
        state.calls.push(RenderCall::SetNodeScreen(node, surface_id));
        if let Some(n) = state.nodes.get_mut(&node) {
            n.surface_id = Some(surface_id);
        }
    }

    fn add_child(&self, parent: Option<NodeHandle>, child: NodeHandle, z_order: i32) {
        let mut state = self.lock();
        state.calls.push(RenderCall::AddChild {
            parent,
            child,
            z_order,
        });
        if let Some(n) = state.nodes.get_mut(&child) {
            n.parent = parent;
            n.attached = true;
        }
    }

    fn remove_from_tree(&self, node: NodeHandle) {
        let mut state = self.lock();
        state.calls.push(RenderCall::RemoveFromTree(node));
        if let Some(n) = state.nodes.get_mut(&node) {
            n.parent = None;
            n.attached = false;
        }
    }

    fn create_virtual_screen(&self, option: &VirtualScreenOption) -> Option<SurfaceScreenId> {
        let mut state = self.lock();
        if state.backend_failure.is_some() {
            return None;
        }
        let id = SurfaceScreenId(state.next_virtual);
        state.next_virtual += 1;
        let mut panel = MockPanel::new(
            vec![ScreenMode::new(option.width, option.height, 60)],
            Some(0),
        );
        panel.surface = option.surface;
        state.panels.insert(id, panel);
        Some(id)
    }

    fn remove_virtual_screen(&self, surface_id: SurfaceScreenId) {
        self.lock().panels.remove(&surface_id);
    }

    fn set_virtual_screen_surface(&self, surface_id: SurfaceScreenId, surface: SurfaceHandle) -> Result<(), BackendStatus> {
        self.fallible(|state| {
            let panel = state
                .panels
                .get_mut(&surface_id)
                .ok_or(INVALID_ARGUMENTS_STATUS)?;
            panel.surface = Some(surface);
            Ok(())
        })
    }

    fn supported_color_gamuts(&self, surface_id: SurfaceScreenId) -> Result<Vec<ColorGamut>, BackendStatus> {
        self.fallible(|state| {
            state
                .panels
                .get(&surface_id)
                .map(|p| p.gamuts.clone())
                .ok_or(INVALID_ARGUMENTS_STATUS)
        })
    }

    fn color_gamut(&self, surface_id: SurfaceScreenId) -> Result<ColorGamut, BackendStatus> {
        self.fallible(|state| {
            let panel = state.panels.get(&surface_id).ok_or(INVALID_ARGUMENTS_STATUS)?;
            panel
                .gamuts
                .get(panel.gamut_index)
                .copied()
                .ok_or(INVALID_ARGUMENTS_STATUS)
        })
    }

    fn set_color_gamut(&self, surface_id: SurfaceScreenId, index: u32) -> Result<(), BackendStatus> {
        self.fallible(|state| {
            let panel = state
                .panels
                .get_mut(&surface_id)
                .ok_or(INVALID_ARGUMENTS_STATUS)?;
            let index = index as usize;
            if index >= panel.gamuts.len() {
                return Err(INVALID_ARGUMENTS_STATUS);
            }
            panel.gamut_index = index;
            Ok(())
        })
    }

    fn gamut_map(&self, surface_id: SurfaceScreenId) -> Result<GamutMap, BackendStatus> {
        self.fallible(|state| {
            state
                .panels
                .get(&surface_id)
                .map(|p| p.gamut_map)
                .ok_or(INVALID_ARGUMENTS_STATUS)
        })
    }

    fn set_gamut_map(&self, surface_id: SurfaceScreenId, map: GamutMap) -> Result<(), BackendStatus> {
        self.fallible(|state| {
            let panel = state
                .panels
                .get_mut(&surface_id)
                .ok_or(INVALID_ARGUMENTS_STATUS)?;
            panel.gamut_map = map;
            Ok(())
        })
    }

    /// Returns a 1/8-scale blank thumbnail of the active mode; `None` when
    /// the panel is powered off.
    fn take_snapshot(&self, surface_id: SurfaceScreenId) -> Option<PixelBuffer> {
        let state = self.lock();
        let panel = state.panels.get(&surface_id)?;
        if panel.power == Some(PowerStatus::Off) {
            return None;
        }
        let mode = panel.modes.get(panel.active?)?;
        let (width, height) = (mode.width / 8, mode.height / 8);
        Some(PixelBuffer {
            width,
            height,
            data: vec![0; (width * height * 4) as usize],
        })
    }

    fn set_tp_feature_config(&self, tp_type: i32, value: &str) {
        self.lock()
            .calls
            .push(RenderCall::TpFeatureConfig(tp_type, value.to_string()));
    }

    fn notify_screen_switched(&self) {
        self.lock().calls.push(RenderCall::ScreenSwitched);
    }

    fn set_scroll_param(&self, mode: FoldDisplayMode) {
        self.lock().calls.push(RenderCall::ScrollParam(mode));
    }
}
