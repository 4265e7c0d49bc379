//! DisplayManagerService: the context object every entry point goes through.
//!
//! One instance is built in `main.rs` and shared by the IPC server, the
//! surface-event pump and the fold task worker.  There is no global state.
//!
//! # Locking (for beginners)
//!
//! Screen and display registries live together in one [`Topology`] behind a
//! single mutex, so the display projection always observes the same screen
//! state the command just produced.  Change events are collected while the
//! lock is held and published after it is released: a listener that reacts
//! by calling back into the service cannot deadlock.
//!
//! The fold policy has its own lock and reaches the topology only through
//! the [`FoldScreenHost`] implementation on [`SharedTopology`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

use dms_core::protocol::AgentId;
use dms_core::{
    ChangeEvent, ColorGamut, DisplayChangeEvent, DisplayId, DisplayInfo, DmError, DmResult,
    FoldCreaseRegion, FoldDisplayMode, FoldStatus, GamutMap, ListenerKind, Orientation,
    PixelBuffer, Point, PowerStatus, PropertyChangeReason, ScreenGroupInfo, ScreenId, ScreenInfo,
    ScreenProperty, SnapshotError, SurfaceHandle, SurfaceScreenId, VirtualScreenOption,
};

use crate::application::display_topology::DisplayTopologyController;
use crate::application::fold::{FoldScreenController, FoldScreenHost, PowerTask};
use crate::application::screen_topology::{
    ScreenTopologyController, TopologyEvent, TopologyOptions,
};
use crate::infrastructure::listeners::{EventSink, ListenerRegistry};
use crate::infrastructure::render_surface::{
    RenderSurface, ScreenConnection, SurfaceConnectionEvent,
};

// ── Topology ──────────────────────────────────────────────────────────────────

/// Screen registry plus the display projection derived from it.
pub struct Topology {
    pub screens: ScreenTopologyController,
    pub displays: DisplayTopologyController,
}

impl Topology {
    pub fn new(render: Arc<dyn RenderSurface>, options: TopologyOptions) -> Self {
        Self {
            screens: ScreenTopologyController::new(render, options),
            displays: DisplayTopologyController::new(),
        }
    }

    /// Feeds screen-level events into the display projection and returns
    /// everything listeners must hear, in order.
    pub fn apply(&mut self, events: Vec<TopologyEvent>) -> Vec<ChangeEvent> {
        let mut out = Vec::new();
        for event in events {
            match event {
                TopologyEvent::Connected(id) => {
                    out.push(ChangeEvent::ScreenConnected(id));
                    out.extend(self.displays.sync_screen(&self.screens, id));
                }
                TopologyEvent::Disconnected(id) => {
                    out.extend(self.displays.on_screen_disconnected(id));
                    out.push(ChangeEvent::ScreenDisconnected(id));
                }
                TopologyEvent::Changed { id, event } => {
                    out.push(ChangeEvent::ScreenChanged {
                        ids: vec![id],
                        event,
                    });
                    out.extend(self.displays.sync_screen(&self.screens, id));
                }
                TopologyEvent::GroupChanged { ids, event } => {
                    for id in &ids {
                        out.extend(self.displays.sync_screen(&self.screens, *id));
                    }
                    out.push(ChangeEvent::ScreenGroupChanged { ids, event });
                }
            }
        }
        out
    }
}

/// The lock-guarded [`Topology`] together with its outbound collaborators.
pub struct SharedTopology {
    state: Mutex<Topology>,
    render: Arc<dyn RenderSurface>,
    events: Arc<dyn EventSink>,
}

impl SharedTopology {
    pub fn new(
        render: Arc<dyn RenderSurface>,
        options: TopologyOptions,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            state: Mutex::new(Topology::new(render.clone(), options)),
            render,
            events,
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&Topology) -> R) -> R {
        f(&self.lock())
    }

    /// Runs a screen-level mutation, derives the display changes under the
    /// same lock, then publishes.
    pub fn mutate_with<R>(
        &self,
        f: impl FnOnce(&mut ScreenTopologyController) -> DmResult<(R, Vec<TopologyEvent>)>,
    ) -> DmResult<R> {
        let (value, changes) = {
            let mut topology = self.lock();
            let (value, events) = f(&mut topology.screens)?;
            (value, topology.apply(events))
        };
        self.publish(changes);
        Ok(value)
    }

    pub fn mutate(
        &self,
        f: impl FnOnce(&mut ScreenTopologyController) -> DmResult<Vec<TopologyEvent>>,
    ) -> DmResult<()> {
        self.mutate_with(|screens| f(screens).map(|events| ((), events)))
    }

    pub fn record_physical_property(&self, surface_id: SurfaceScreenId, property: ScreenProperty) {
        self.lock()
            .screens
            .record_physical_property(surface_id, property);
    }

    pub fn on_surface_connection_event(&self, event: SurfaceConnectionEvent) {
        debug!(surface_id = %event.surface_id, connection = ?event.connection, "surface event");
        let result = self.mutate(|screens| {
            Ok(match event.connection {
                ScreenConnection::Connected => screens.on_surface_screen_connected(event.surface_id),
                ScreenConnection::Disconnected => {
                    screens.on_surface_screen_disconnected(event.surface_id)
                }
                ScreenConnection::ModeChanged => {
                    screens.on_surface_screen_mode_changed(event.surface_id)
                }
            })
        });
        if let Err(e) = result {
            warn!(error = %e, "surface event not applied");
        }
    }

    fn publish(&self, events: Vec<ChangeEvent>) {
        for event in events {
            self.events.publish(event);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Topology> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FoldScreenHost for SharedTopology {
    fn apply_fold_property(
        &self,
        physical: SurfaceScreenId,
        reason: PropertyChangeReason,
        notify: bool,
    ) -> bool {
        let (synced, current) = {
            let mut guard = self.lock();
            let topology = &mut *guard;
            let Some(id) = topology.screens.apply_fold_property(physical) else {
                return false;
            };
            let synced = topology.displays.sync_screen(&topology.screens, id);
            let current = topology
                .displays
                .display_id_for_screen(id)
                .and_then(|display_id| topology.displays.display(display_id));
            (synced, current)
        };
        debug!(%physical, ?reason, notify, "fold property switched");
        if !notify {
            return true;
        }
        if !synced.is_empty() {
            self.publish(synced);
        } else if let Some(info) = current {
            // Panels of equal geometry still count as a size change.
            self.events.publish(ChangeEvent::DisplayChanged {
                info,
                event: DisplayChangeEvent::DisplaySizeChanged,
            });
        }
        true
    }

    fn set_screen_power(&self, physical: SurfaceScreenId, status: PowerStatus) {
        self.render.set_screen_power_status(physical, status);
    }

    fn set_tp_feature_config(&self, tp_type: i32, value: &str) {
        self.render.set_tp_feature_config(tp_type, value);
    }

    fn notify_screen_switched(&self) {
        self.render.notify_screen_switched();
    }

    fn switch_scroll_param(&self, mode: FoldDisplayMode) {
        self.render.set_scroll_param(mode);
    }

    fn notify_fold_display_mode_changed(&self, mode: FoldDisplayMode) {
        self.events.publish(ChangeEvent::FoldDisplayModeChanged(mode));
    }

    fn notify_display_mode_update_requested(&self, mode: FoldDisplayMode) {
        self.events
            .publish(ChangeEvent::FoldDisplayModeUpdateRequested(mode));
    }

    fn notify_fold_status_changed(&self, status: FoldStatus) {
        self.events.publish(ChangeEvent::FoldStatusChanged(status));
    }

    fn default_display_id(&self) -> Option<DisplayId> {
        self.read(|t| t.displays.default_display_id(&t.screens))
    }
}

// ── Service ───────────────────────────────────────────────────────────────────

pub struct DisplayManagerService {
    topology: Arc<SharedTopology>,
    listeners: Arc<ListenerRegistry>,
    fold: Option<Arc<FoldScreenController>>,
    render: Arc<dyn RenderSurface>,
}

impl DisplayManagerService {
    pub fn new(
        topology: Arc<SharedTopology>,
        listeners: Arc<ListenerRegistry>,
        fold: Option<Arc<FoldScreenController>>,
    ) -> Self {
        let render = topology.render.clone();
        Self {
            topology,
            listeners,
            fold,
            render,
        }
    }

    pub fn topology(&self) -> &SharedTopology {
        &self.topology
    }

    pub fn fold_controller(&self) -> Option<&FoldScreenController> {
        self.fold.as_deref()
    }

    pub fn on_surface_connection_event(&self, event: SurfaceConnectionEvent) {
        self.topology.on_surface_connection_event(event);
    }

    // ── Displays ──────────────────────────────────────────────────────────────

    pub fn get_default_display_id(&self) -> Option<DisplayId> {
        self.topology
            .read(|t| t.displays.default_display_id(&t.screens))
    }

    pub fn get_display_by_id(&self, id: DisplayId) -> Option<DisplayInfo> {
        self.topology.read(|t| t.displays.display(id))
    }

    pub fn get_all_display_ids(&self) -> Vec<DisplayId> {
        self.topology.read(|t| t.displays.all_display_ids())
    }

    pub fn get_screen_id_by_display_id(&self, id: DisplayId) -> Option<ScreenId> {
        self.topology.read(|t| t.displays.screen_id_for_display(id))
    }

    pub fn get_display_id_by_screen_id(&self, id: ScreenId) -> Option<DisplayId> {
        self.topology.read(|t| t.displays.display_id_for_screen(id))
    }

    /// Captures the content of a display.
    ///
    /// # Errors
    ///
    /// - [`SnapshotError::NoPermission`] when the caller may not capture.
    /// - [`SnapshotError::Failed`] for an unknown display.
    /// - [`SnapshotError::SystemAbnormal`] when the backend produced nothing.
    pub fn get_display_snapshot(
        &self,
        id: DisplayId,
        has_permission: bool,
    ) -> Result<PixelBuffer, SnapshotError> {
        if !has_permission {
            return Err(SnapshotError::NoPermission);
        }
        let surface_id = self
            .topology
            .read(|t| {
                t.displays
                    .screen_id_for_display(id)
                    .and_then(|screen| t.screens.screen(screen))
                    .map(|screen| screen.surface_id)
            })
            .ok_or(SnapshotError::Failed)?;
        self.render.take_snapshot(surface_id).ok_or_else(|| {
            warn!(display_id = %id, %surface_id, "snapshot returned no pixels");
            SnapshotError::SystemAbnormal
        })
    }

    // ── Screens ───────────────────────────────────────────────────────────────

    pub fn get_all_screen_infos(&self) -> Vec<ScreenInfo> {
        self.topology.read(|t| t.screens.all_screen_infos())
    }

    pub fn get_all_screen_ids(&self) -> Vec<ScreenId> {
        self.topology.read(|t| t.screens.all_screen_ids())
    }

    pub fn get_screen_info_by_id(&self, id: ScreenId) -> Option<ScreenInfo> {
        self.topology.read(|t| t.screens.screen_info(id))
    }

    pub fn get_screen_group_info_by_id(&self, id: ScreenId) -> Option<ScreenGroupInfo> {
        self.topology.read(|t| t.screens.group_info(id))
    }

    pub fn create_virtual_screen(&self, option: &VirtualScreenOption) -> DmResult<ScreenId> {
        self.topology
            .mutate_with(|screens| screens.create_virtual_screen(option))
    }

    pub fn destroy_virtual_screen(&self, id: ScreenId) -> DmResult<()> {
        self.topology
            .mutate(|screens| screens.destroy_virtual_screen(id))
    }

    pub fn set_virtual_screen_surface(&self, id: ScreenId, surface: SurfaceHandle) -> DmResult<()> {
        self.topology.mutate(|screens| {
            screens.set_virtual_screen_surface(id, surface)?;
            Ok(Vec::new())
        })
    }

    pub fn make_mirror(&self, main: ScreenId, targets: &[ScreenId]) -> DmResult<()> {
        self.topology
            .mutate(|screens| screens.make_mirror(main, targets))
    }

    pub fn make_expand(&self, ids: &[ScreenId], points: &[Point]) -> DmResult<()> {
        self.topology
            .mutate(|screens| screens.make_expand(ids, points))
    }

    pub fn stop_mirror(&self, ids: &[ScreenId]) -> DmResult<()> {
        self.topology.mutate(|screens| screens.stop_mirror(ids))
    }

    pub fn stop_expand(&self, ids: &[ScreenId]) -> DmResult<()> {
        self.topology.mutate(|screens| screens.stop_expand(ids))
    }

    pub fn set_screen_active_mode(&self, id: ScreenId, mode_index: u32) -> DmResult<()> {
        self.topology
            .mutate(|screens| screens.set_screen_active_mode(id, mode_index))
    }

    pub fn set_orientation(&self, id: ScreenId, orientation: Orientation) -> DmResult<()> {
        self.topology
            .mutate(|screens| screens.set_orientation(id, orientation))
    }

    pub fn set_virtual_pixel_ratio(&self, id: ScreenId, ratio: f32) -> DmResult<()> {
        self.topology
            .mutate(|screens| screens.set_virtual_pixel_ratio(id, ratio))
    }

    pub fn get_supported_color_gamuts(&self, id: ScreenId) -> DmResult<Vec<ColorGamut>> {
        self.topology.read(|t| t.screens.supported_color_gamuts(id))
    }

    pub fn get_color_gamut(&self, id: ScreenId) -> DmResult<ColorGamut> {
        self.topology.read(|t| t.screens.color_gamut(id))
    }

    pub fn set_color_gamut(&self, id: ScreenId, index: u32) -> DmResult<()> {
        self.topology.read(|t| t.screens.set_color_gamut(id, index))
    }

    pub fn get_gamut_map(&self, id: ScreenId) -> DmResult<GamutMap> {
        self.topology.read(|t| t.screens.gamut_map(id))
    }

    pub fn set_gamut_map(&self, id: ScreenId, map: GamutMap) -> DmResult<()> {
        self.topology.read(|t| t.screens.set_gamut_map(id, map))
    }

    // ── Fold ──────────────────────────────────────────────────────────────────

    pub fn is_foldable(&self) -> bool {
        self.fold.is_some()
    }

    pub fn get_fold_status(&self) -> FoldStatus {
        self.fold
            .as_ref()
            .map_or(FoldStatus::Unknown, |f| f.fold_status())
    }

    pub fn get_fold_display_mode(&self) -> FoldDisplayMode {
        self.fold
            .as_ref()
            .map_or(FoldDisplayMode::Unknown, |f| f.fold_display_mode())
    }

    pub fn set_fold_display_mode(&self, mode: FoldDisplayMode) -> DmResult<()> {
        self.require_fold()?.set_fold_display_mode(mode);
        Ok(())
    }

    pub fn lock_fold_display_status(&self, locked: bool) -> DmResult<()> {
        self.require_fold()?.lock_fold_display_status(locked);
        Ok(())
    }

    pub fn get_current_fold_crease_region(&self) -> Option<FoldCreaseRegion> {
        self.fold.as_ref().map(|f| f.current_crease_region())
    }

    /// Hinge-sensor input.  Ignored on devices that do not fold.
    pub fn handle_fold_sensor(&self, status: FoldStatus) {
        if let Some(fold) = &self.fold {
            fold.handle_sensor_change(status);
        }
    }

    pub fn set_on_boot_animation(&self, on: bool) {
        if let Some(fold) = &self.fold {
            fold.set_on_boot_animation(on);
        }
    }

    pub fn run_power_task(&self, task: PowerTask) {
        match &self.fold {
            Some(fold) => fold.run_power_task(task),
            None => warn!(?task, "power task without fold controller"),
        }
    }

    fn require_fold(&self) -> DmResult<&FoldScreenController> {
        self.fold
            .as_deref()
            .ok_or_else(|| DmError::StateConflict("device is not foldable".to_string()))
    }

    // ── Listeners ─────────────────────────────────────────────────────────────

    /// Registers `agent` for `kinds`.
    ///
    /// # Errors
    ///
    /// [`DmError::StateConflict`] when the agent already listens to one of
    /// the kinds, [`DmError::InvalidParam`] when `kinds` is empty.
    pub fn register_listener(
        &self,
        agent: AgentId,
        kinds: &[ListenerKind],
    ) -> DmResult<UnboundedReceiver<ChangeEvent>> {
        self.listeners.register(agent, kinds)
    }

    pub fn unregister_agent(&self, agent: AgentId) -> usize {
        self.listeners.unregister_agent(agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::render_surface::mock::MockRenderSurface;
    use dms_core::ScreenMode;
    use uuid::Uuid;

    fn service() -> (Arc<MockRenderSurface>, DisplayManagerService) {
        let mock = Arc::new(MockRenderSurface::new());
        let listeners = Arc::new(ListenerRegistry::new());
        let topology = Arc::new(SharedTopology::new(
            mock.clone(),
            TopologyOptions::default(),
            listeners.clone(),
        ));
        (mock, DisplayManagerService::new(topology, listeners, None))
    }

    fn connect(mock: &MockRenderSurface, service: &DisplayManagerService, surface: u64) {
        mock.add_panel(
            SurfaceScreenId(surface),
            vec![ScreenMode::new(1920, 1080, 60)],
            Some(0),
        );
        service.on_surface_connection_event(SurfaceConnectionEvent {
            surface_id: SurfaceScreenId(surface),
            connection: ScreenConnection::Connected,
        });
    }

    #[test]
    fn test_connect_publishes_screen_then_display_event() {
        // Arrange
        let (mock, service) = service();
        let mut rx = service
            .register_listener(Uuid::new_v4(), &[ListenerKind::Screen, ListenerKind::Display])
            .unwrap();

        // Act
        connect(&mock, &service, 7);

        // Assert
        let screen_id = service.get_all_screen_ids()[0];
        assert_eq!(rx.try_recv().unwrap(), ChangeEvent::ScreenConnected(screen_id));
        assert!(matches!(rx.try_recv().unwrap(), ChangeEvent::DisplayCreated(info) if info.screen_id == screen_id));
    }

    #[test]
    fn test_snapshot_without_permission_is_refused() {
        let (mock, service) = service();
        connect(&mock, &service, 0);
        let display = service.get_default_display_id().unwrap();

        assert_eq!(
            service.get_display_snapshot(display, false),
            Err(SnapshotError::NoPermission)
        );
    }

    #[test]
    fn test_snapshot_of_unknown_display_fails() {
        let (_mock, service) = service();
        assert_eq!(
            service.get_display_snapshot(DisplayId(42), true),
            Err(SnapshotError::Failed)
        );
    }

    #[test]
    fn test_snapshot_of_dark_panel_is_system_abnormal() {
        let (mock, service) = service();
        connect(&mock, &service, 0);
        let display = service.get_default_display_id().unwrap();
        mock.set_screen_power_status(SurfaceScreenId(0), PowerStatus::Off);

        assert_eq!(
            service.get_display_snapshot(display, true),
            Err(SnapshotError::SystemAbnormal)
        );
    }

    #[test]
    fn test_snapshot_returns_pixels() {
        let (mock, service) = service();
        connect(&mock, &service, 0);
        let display = service.get_default_display_id().unwrap();

        let buffer = service.get_display_snapshot(display, true).unwrap();

        assert_eq!((buffer.width, buffer.height), (240, 135));
    }

    #[test]
    fn test_fold_requests_on_non_foldable_device_conflict() {
        let (_mock, service) = service();
        assert!(!service.is_foldable());
        assert!(matches!(
            service.set_fold_display_mode(FoldDisplayMode::Main),
            Err(DmError::StateConflict(_))
        ));
        assert_eq!(service.get_fold_display_mode(), FoldDisplayMode::Unknown);
    }

    #[test]
    fn test_screen_and_display_id_lookups() {
        let (mock, service) = service();
        connect(&mock, &service, 3);
        let screen = service.get_all_screen_ids()[0];

        let display = service.get_display_id_by_screen_id(screen).unwrap();

        assert_eq!(service.get_screen_id_by_display_id(display), Some(screen));
    }
}
