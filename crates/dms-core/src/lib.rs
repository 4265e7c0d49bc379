//! # dms-core
//!
//! Shared library for the display manager service containing the topology
//! entities, the id mapping between the service and rendering-surface id
//! spaces, the error taxonomy and the IPC protocol.
//!
//! This crate is used by both the service and the command-line client.
//! It has zero dependencies on rendering APIs, async runtimes, or sockets.
//!
//! # Architecture overview (for beginners)
//!
//! The display manager tracks every screen a device can render to (built-in
//! panels, external monitors, virtual screens used for casting or capture),
//! how those screens are combined (mirrored, extended side by side), and the
//! logical *displays* that applications see.
//!
//! - **`domain`** – Pure topology logic.  Screens, screen groups, displays,
//!   fold modes, change events and snapshot DTOs.
//!
//! - **`protocol`** – How requests and responses travel between a client
//!   process and the service: serde types plus a length-prefixed frame codec.
//!
//! - **`error`** – The kinds of failure a command can report and their
//!   numeric IPC codes.

pub mod domain;
pub mod error;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `dms_core::ScreenId` instead of `dms_core::domain::ids::ScreenId`.
pub use domain::display::DisplayEntity;
pub use domain::events::{
    ChangeEvent, DisplayChangeEvent, ListenerKind, ScreenChangeEvent, ScreenGroupChangeEvent,
};
pub use domain::fold::{
    FoldCreaseRegion, FoldDisplayMode, FoldStatus, ModeChangeReason, PropertyChangeReason,
};
pub use domain::group::ScreenGroup;
pub use domain::ids::{DisplayId, NodeHandle, ScreenId, ScreenIdManager, SurfaceScreenId};
pub use domain::info::{DisplayInfo, ScreenGroupInfo, ScreenInfo};
pub use domain::screen::{ScreenEntity, ScreenProperty};
pub use domain::types::{
    ColorGamut, GamutMap, Orientation, PixelBuffer, Point, PowerStatus, Rect, Rotation,
    ScreenCombination, ScreenMode, ScreenType, SurfaceHandle, VirtualScreenOption,
};
pub use error::{DmError, DmResult, SnapshotError};
pub use protocol::{Request, Response};
