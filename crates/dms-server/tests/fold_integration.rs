//! Integration tests for fold display mode transitions.
//!
//! # Purpose
//!
//! These tests run the fold state machine inside a fully assembled service:
//! both physical panels are announced by the mock backend, the power
//! manager is simulated, and power tasks sit in a `ManualTaskScheduler`
//! until the test drains them.  Holding the tasks back is what makes a
//! transition observable while it is still "running".
//!
//! # Device layout used here
//!
//! ```text
//! surface 0  2224x2496  primary   (FULL on single-display, MAIN on dual)
//! surface 5  1008x2232  secondary (MAIN on single-display, SUB on dual)
//! ```
//!
//! Only the primary panel becomes a screen.  Every transition re-targets
//! that screen at the panel being lit.

use std::sync::Arc;

use uuid::Uuid;

use dms_core::{
    ChangeEvent, DisplayChangeEvent, FoldDisplayMode, FoldStatus, ListenerKind, ModeChangeReason,
    PowerStatus, ScreenId, SurfaceScreenId,
};
use dms_server::application::fold::PowerTask;
use dms_server::application::service::DisplayManagerService;
use dms_server::infrastructure::bootstrap;
use dms_server::infrastructure::power::simulated::SimulatedPowerManager;
use dms_server::infrastructure::render_surface::mock::MockRenderSurface;
use dms_server::infrastructure::render_surface::{RenderSurface, TP_TYPE, TP_TYPE_POWER_CTRL};
use dms_server::infrastructure::scheduler::ManualTaskScheduler;
use dms_server::infrastructure::storage::config::{AppConfig, FoldPolicyKind};

const PRIMARY: SurfaceScreenId = SurfaceScreenId(0);
const SECONDARY: SurfaceScreenId = SurfaceScreenId(5);

struct Device {
    mock: Arc<MockRenderSurface>,
    power: Arc<SimulatedPowerManager>,
    scheduler: Arc<ManualTaskScheduler<PowerTask>>,
    service: Arc<DisplayManagerService>,
}

impl Device {
    fn new(policy: FoldPolicyKind) -> Self {
        let mut config = AppConfig::default();
        config.fold.enabled = true;
        config.fold.policy = policy;

        let mock = Arc::new(MockRenderSurface::new());
        let power = Arc::new(SimulatedPowerManager::new());
        let scheduler: Arc<ManualTaskScheduler<PowerTask>> = Arc::new(ManualTaskScheduler::new());
        let service =
            bootstrap::build_service(&config, mock.clone(), power.clone(), scheduler.clone());

        let mut events = mock.subscribe_connection_events();
        bootstrap::plug_mock_screens(&config, &mock);
        while let Ok(event) = events.try_recv() {
            service.on_surface_connection_event(event);
        }
        mock.clear_calls();

        Self {
            mock,
            power,
            scheduler,
            service,
        }
    }

    fn run_tasks(&self) -> usize {
        self.scheduler
            .run_all(|task| self.service.run_power_task(task))
    }

    fn bound_screen(&self) -> ScreenId {
        self.service.get_all_screen_ids()[0]
    }

    fn bound_width(&self) -> u32 {
        self.service
            .get_screen_info_by_id(self.bound_screen())
            .expect("bound screen")
            .virtual_width
    }
}

#[test]
fn test_only_primary_panel_becomes_a_screen() {
    let device = Device::new(FoldPolicyKind::Single);

    assert!(device.service.is_foldable());
    assert_eq!(device.service.get_all_screen_ids().len(), 1);
    assert_eq!(device.bound_width(), 2224);
}

/// Folding: FULL off, then MAIN on; the screen adopts MAIN's size.
#[test]
fn test_folding_switches_bound_screen_to_outer_panel() {
    // Arrange
    let device = Device::new(FoldPolicyKind::Single);
    let mut rx = device
        .service
        .register_listener(Uuid::new_v4(), &[ListenerKind::FoldDisplayMode, ListenerKind::FoldStatus])
        .unwrap();

    // Act
    device.service.handle_fold_sensor(FoldStatus::Folded);

    // Assert: state is recorded before the tasks run
    assert_eq!(device.service.get_fold_display_mode(), FoldDisplayMode::Main);
    assert_eq!(device.service.get_fold_status(), FoldStatus::Folded);
    assert_eq!(device.bound_width(), 1008);
    assert_eq!(device.scheduler.labels(), vec!["screenOffFullTask", "screenOnMainTask"]);
    assert_eq!(rx.try_recv().unwrap(), ChangeEvent::FoldStatusChanged(FoldStatus::Folded));
    assert_eq!(
        rx.try_recv().unwrap(),
        ChangeEvent::FoldDisplayModeChanged(FoldDisplayMode::Main)
    );

    // Act: drain the ordered queue
    assert_eq!(device.run_tasks(), 2);

    // Assert: power-off precedes power-on
    assert_eq!(
        device.mock.power_calls(),
        vec![(PRIMARY, PowerStatus::Off), (SECONDARY, PowerStatus::On)]
    );
    assert!(device.mock.tp_configs().contains(&(TP_TYPE, "1".to_string())));
}

#[test]
fn test_repeated_request_schedules_tasks_once() {
    // Arrange
    let device = Device::new(FoldPolicyKind::Single);

    // Act
    device.service.set_fold_display_mode(FoldDisplayMode::Main).unwrap();
    device.service.set_fold_display_mode(FoldDisplayMode::Main).unwrap();

    // Assert
    assert_eq!(device.scheduler.len(), 2);
    device.run_tasks();
    device.service.set_fold_display_mode(FoldDisplayMode::Main).unwrap();
    assert!(device.scheduler.is_empty());
}

/// A request during a running transition is dropped, then reported.
#[test]
fn test_request_during_transition_is_dropped_and_reported() {
    // Arrange
    let device = Device::new(FoldPolicyKind::Single);
    let mut rx = device
        .service
        .register_listener(Uuid::new_v4(), &[ListenerKind::FoldDisplayMode])
        .unwrap();

    // Act
    device.service.set_fold_display_mode(FoldDisplayMode::Main).unwrap();
    device.service.set_fold_display_mode(FoldDisplayMode::Full).unwrap();

    // Assert
    assert_eq!(device.service.get_fold_display_mode(), FoldDisplayMode::Main);
    assert_eq!(device.scheduler.len(), 2);
    assert_eq!(
        rx.try_recv().unwrap(),
        ChangeEvent::FoldDisplayModeChanged(FoldDisplayMode::Main)
    );

    device.run_tasks();
    assert_eq!(
        rx.try_recv().unwrap(),
        ChangeEvent::FoldDisplayModeUpdateRequested(FoldDisplayMode::Full)
    );
    assert_eq!(device.service.get_fold_display_mode(), FoldDisplayMode::Main);
}

/// Boot animation: property switches at once, power and mode wait.
#[test]
fn test_boot_animation_defers_mode_until_cleared() {
    // Arrange: settle in FULL
    let device = Device::new(FoldPolicyKind::Single);
    device.service.set_fold_display_mode(FoldDisplayMode::Full).unwrap();
    device.run_tasks();
    device.mock.clear_calls();
    device.service.set_on_boot_animation(true);

    // Act
    device.service.handle_fold_sensor(FoldStatus::Folded);

    // Assert
    assert_eq!(device.bound_width(), 1008);
    assert!(device.scheduler.is_empty());
    assert!(device.mock.power_calls().is_empty());
    assert_eq!(device.service.get_fold_display_mode(), FoldDisplayMode::Full);

    // Act: boot animation ends
    device.service.set_on_boot_animation(false);

    // Assert: the mode matching the last reading is applied for real
    assert_eq!(device.service.get_fold_display_mode(), FoldDisplayMode::Main);
    assert_eq!(device.run_tasks(), 2);
    assert_eq!(
        device.mock.power_calls(),
        vec![(PRIMARY, PowerStatus::Off), (SECONDARY, PowerStatus::On)]
    );
}

#[test]
fn test_unfolding_dark_device_wakes_it() {
    // Arrange
    let device = Device::new(FoldPolicyKind::Single);
    device.service.handle_fold_sensor(FoldStatus::Folded);
    device.run_tasks();
    device.power.set_screen_on(false);

    // Act
    device.service.handle_fold_sensor(FoldStatus::Expand);

    // Assert
    assert_eq!(device.scheduler.labels(), vec!["screenOffMainTask", "wakeUpTask"]);
    device.run_tasks();
    assert_eq!(device.power.wakeup_count(), 1);
    assert_eq!(device.bound_width(), 2224);
}

#[test]
fn test_unfolding_during_ambient_display_cancels_screen_off() {
    // Arrange
    let device = Device::new(FoldPolicyKind::Single);
    device.service.handle_fold_sensor(FoldStatus::Folded);
    device.run_tasks();
    device.power.set_screen_on(false);
    device.power.set_screen_off_cancellable(true);
    device.mock.clear_calls();

    // Act
    device.service.handle_fold_sensor(FoldStatus::Expand);
    device.run_tasks();

    // Assert
    assert_eq!(device.power.wakeup_count(), 0);
    assert_eq!(
        device.mock.power_calls(),
        vec![(SECONDARY, PowerStatus::Off), (PRIMARY, PowerStatus::On)]
    );
}

#[test]
fn test_recover_transition_reconfigures_touch_instead_of_waking() {
    // Arrange
    let device = Device::new(FoldPolicyKind::Single);
    device.service.handle_fold_sensor(FoldStatus::Folded);
    device.run_tasks();
    device.power.set_screen_on(false);
    let fold = device.service.fold_controller().expect("foldable");

    // Act
    fold.set_fold_display_mode_with_reason(FoldDisplayMode::Full, ModeChangeReason::Recover);
    device.run_tasks();

    // Assert
    assert_eq!(device.power.wakeup_count(), 0);
    assert!(device
        .mock
        .tp_configs()
        .contains(&(TP_TYPE_POWER_CTRL, "0,1".to_string())));
}

#[test]
fn test_locked_status_keeps_mode_but_tracks_sensor() {
    let device = Device::new(FoldPolicyKind::Single);
    device.service.lock_fold_display_status(true).unwrap();

    device.service.handle_fold_sensor(FoldStatus::Folded);

    assert_eq!(device.service.get_fold_status(), FoldStatus::Folded);
    assert_eq!(device.service.get_fold_display_mode(), FoldDisplayMode::Unknown);
    assert!(device.scheduler.is_empty());
}

#[test]
fn test_crease_region_reported_on_default_display() {
    let device = Device::new(FoldPolicyKind::Single);

    let region = device
        .service
        .get_current_fold_crease_region()
        .expect("foldable");

    assert_eq!(Some(region.display_id), device.service.get_default_display_id());
    assert_eq!(region.areas[0].y, 1064);
    assert_eq!(region.areas[0].height, 171);
}

#[test]
fn test_dual_display_folding_lights_sub_panel() {
    // Arrange
    let device = Device::new(FoldPolicyKind::Dual);

    // Act
    device.service.handle_fold_sensor(FoldStatus::Folded);
    device.run_tasks();

    // Assert
    assert_eq!(device.service.get_fold_display_mode(), FoldDisplayMode::Sub);
    assert_eq!(
        device.mock.power_calls(),
        vec![(PRIMARY, PowerStatus::Off), (SECONDARY, PowerStatus::On)]
    );
    assert!(device.mock.tp_configs().contains(&(TP_TYPE, "1".to_string())));
    assert_eq!(device.bound_width(), 1008);
}

#[test]
fn test_fold_switch_reports_display_size_change() {
    // Arrange
    let device = Device::new(FoldPolicyKind::Single);
    let display_id = device.service.get_default_display_id().unwrap();
    let mut rx = device
        .service
        .register_listener(Uuid::new_v4(), &[ListenerKind::Display])
        .unwrap();

    // Act
    device.service.handle_fold_sensor(FoldStatus::Folded);

    // Assert
    let display = device.service.get_display_by_id(display_id).unwrap();
    assert_eq!((display.width, display.height), (1008, 2232));
    assert!(matches!(
        rx.try_recv().unwrap(),
        ChangeEvent::DisplayChanged {
            info,
            event: DisplayChangeEvent::DisplaySizeChanged,
        } if info.id == display_id
    ));
    while let Ok(event) = rx.try_recv() {
        assert!(
            !matches!(event, ChangeEvent::DisplayChanged { .. }),
            "display change reported twice: {event:?}"
        );
    }
}
