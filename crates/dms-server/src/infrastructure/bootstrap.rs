//! Assembles a [`DisplayManagerService`] from configuration and concrete
//! adapters.
//!
//! `main.rs` passes the channel-backed scheduler and spawns the worker
//! tasks; integration tests pass a `ManualTaskScheduler` and drive
//! everything synchronously.

use std::sync::{Arc, Weak};

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use dms_core::{ScreenMode, ScreenProperty, SurfaceScreenId};

use crate::application::fold::{
    DualDisplayFoldPolicy, FoldModePolicy, FoldPanels, FoldPolicyCore, FoldScreenController,
    FoldScreenHost, PowerTask, SingleDisplayFoldPolicy,
};
use crate::application::screen_topology::TopologyOptions;
use crate::application::service::{DisplayManagerService, SharedTopology};
use crate::infrastructure::listeners::ListenerRegistry;
use crate::infrastructure::power::PowerManager;
use crate::infrastructure::render_surface::mock::MockRenderSurface;
use crate::infrastructure::render_surface::{RenderSurface, SurfaceConnectionEvent};
use crate::infrastructure::scheduler::{TaskQueue, TaskScheduler};
use crate::infrastructure::storage::config::{AppConfig, FoldPolicyKind, MockScreenEntry};

pub fn topology_options(config: &AppConfig) -> TopologyOptions {
    let mut options = TopologyOptions {
        default_virtual_pixel_ratio: config.service.default_virtual_pixel_ratio,
        ..TopologyOptions::default()
    };
    if config.fold.enabled {
        // The secondary panel never becomes a screen; the primary panel's
        // screen is re-targeted to it instead.
        options.shadow_surfaces = vec![config.fold.secondary()];
        options.fold_bound_surface = Some(config.fold.primary());
    }
    options
}

/// Builds the service and, when folding is enabled, its fold controller.
pub fn build_service(
    config: &AppConfig,
    render: Arc<dyn RenderSurface>,
    power: Arc<dyn PowerManager>,
    scheduler: Arc<dyn TaskScheduler<PowerTask>>,
) -> Arc<DisplayManagerService> {
    let listeners = Arc::new(ListenerRegistry::new());
    let topology = Arc::new(SharedTopology::new(
        render,
        topology_options(config),
        listeners.clone(),
    ));

    let fold = config.fold.enabled.then(|| {
        for entry in &config.fold.physical_screens {
            topology.record_physical_property(
                SurfaceScreenId(entry.id),
                ScreenProperty::from(ScreenMode::new(entry.width, entry.height, entry.refresh_rate)),
            );
        }
        let panels = FoldPanels {
            primary: config.fold.primary(),
            secondary: config.fold.secondary(),
            crease: config.fold.crease_region,
        };
        let host: Arc<dyn FoldScreenHost> = topology.clone();
        let core = FoldPolicyCore::new(host, power, scheduler);
        let policy: Arc<dyn FoldModePolicy> = match config.fold.policy {
            FoldPolicyKind::Single => Arc::new(SingleDisplayFoldPolicy::new(panels, core)),
            FoldPolicyKind::Dual => Arc::new(DualDisplayFoldPolicy::new(panels, core)),
        };
        info!(policy = ?config.fold.policy, primary = %panels.primary, secondary = %panels.secondary, "fold controller enabled");
        Arc::new(FoldScreenController::new(policy))
    });

    let service = Arc::new(DisplayManagerService::new(topology, listeners, fold));
    if config.fold.on_boot_animation {
        service.set_on_boot_animation(true);
    }
    service
}

/// Panels the mock backend starts with.  Without explicit entries a plain
/// device gets one 1080p panel and a foldable device gets both its panels.
pub fn mock_screens(config: &AppConfig) -> Vec<MockScreenEntry> {
    if !config.mock_screens.is_empty() {
        return config.mock_screens.clone();
    }
    if !config.fold.enabled {
        return vec![MockScreenEntry {
            surface_id: 0,
            modes: vec![ScreenMode::new(1920, 1080, 60)],
            active_mode: 0,
        }];
    }
    let panel_mode = |id: u64, fallback: ScreenMode| {
        config
            .fold
            .physical_screens
            .iter()
            .find(|p| p.id == id)
            .map_or(fallback, |p| ScreenMode::new(p.width, p.height, p.refresh_rate))
    };
    vec![
        MockScreenEntry {
            surface_id: config.fold.primary_screen_id,
            modes: vec![panel_mode(config.fold.primary_screen_id, ScreenMode::new(2224, 2496, 60))],
            active_mode: 0,
        },
        MockScreenEntry {
            surface_id: config.fold.secondary_screen_id,
            modes: vec![panel_mode(config.fold.secondary_screen_id, ScreenMode::new(1008, 2232, 60))],
            active_mode: 0,
        },
    ]
}

/// Announces every configured panel.  Subscribe to connection events first.
pub fn plug_mock_screens(config: &AppConfig, mock: &MockRenderSurface) {
    for entry in mock_screens(config) {
        debug!(surface_id = entry.surface_id, modes = entry.modes.len(), "plugging mock panel");
        mock.plug(SurfaceScreenId(entry.surface_id), entry.modes, Some(entry.active_mode));
    }
}

/// Feeds backend connection events into the service until the backend
/// drops its sender.
pub async fn pump_surface_events(
    service: Arc<DisplayManagerService>,
    mut events: UnboundedReceiver<SurfaceConnectionEvent>,
) {
    while let Some(event) = events.recv().await {
        service.on_surface_connection_event(event);
    }
    info!("surface event stream closed");
}

/// Drains the fold power-task queue in order.  Holds only a weak reference
/// so the service can be dropped while the worker idles.
pub async fn run_power_worker(queue: TaskQueue<PowerTask>, service: Weak<DisplayManagerService>) {
    queue
        .run(move |task| match service.upgrade() {
            Some(service) => service.run_power_task(task),
            None => debug!(?task, "service gone; power task dropped"),
        })
        .await;
}
