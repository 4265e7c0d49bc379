//! Request and response messages exchanged between clients and the service.
//!
//! Every request gets exactly one response, except [`Request::Subscribe`]:
//! after its acknowledgement the connection carries [`Response::Event`]
//! frames until the client disconnects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::events::{ChangeEvent, ListenerKind};
use crate::domain::fold::{FoldCreaseRegion, FoldDisplayMode, FoldStatus};
use crate::domain::ids::{DisplayId, ScreenId};
use crate::domain::info::{DisplayInfo, ScreenGroupInfo, ScreenInfo};
use crate::domain::types::{
    ColorGamut, GamutMap, Orientation, PixelBuffer, Point, SurfaceHandle, VirtualScreenOption,
};
use crate::error::{DmError, SnapshotError};

/// Identifies the process that owns a listener registration.
pub type AgentId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    // ── Displays ──────────────────────────────────────────────────────────────
    GetDefaultDisplayId,
    GetDisplayById(DisplayId),
    GetAllDisplayIds,
    GetDisplaySnapshot(DisplayId),

    // ── Screens ───────────────────────────────────────────────────────────────
    GetAllScreenInfos,
    GetAllScreenIds,
    GetScreenInfoById(ScreenId),
    GetScreenGroupInfoById(ScreenId),
    CreateVirtualScreen(VirtualScreenOption),
    DestroyVirtualScreen(ScreenId),
    SetVirtualScreenSurface {
        id: ScreenId,
        surface: SurfaceHandle,
    },
    MakeMirror {
        main: ScreenId,
        targets: Vec<ScreenId>,
    },
    MakeExpand {
        ids: Vec<ScreenId>,
        points: Vec<Point>,
    },
    StopMirror(Vec<ScreenId>),
    StopExpand(Vec<ScreenId>),
    SetScreenActiveMode {
        id: ScreenId,
        mode_index: u32,
    },
    SetOrientation {
        id: ScreenId,
        orientation: Orientation,
    },
    SetVirtualPixelRatio {
        id: ScreenId,
        ratio: f32,
    },
    GetSupportedColorGamuts(ScreenId),
    GetColorGamut(ScreenId),
    SetColorGamut {
        id: ScreenId,
        index: u32,
    },
    GetGamutMap(ScreenId),
    SetGamutMap {
        id: ScreenId,
        map: GamutMap,
    },

    // ── Fold ──────────────────────────────────────────────────────────────────
    IsFoldable,
    GetFoldStatus,
    GetFoldDisplayMode,
    SetFoldDisplayMode(FoldDisplayMode),
    LockFoldDisplayStatus(bool),
    GetCurrentFoldCreaseRegion,

    // ── Listeners ─────────────────────────────────────────────────────────────
    Subscribe {
        agent: AgentId,
        kinds: Vec<ListenerKind>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    Status(Result<(), DmError>),
    CreatedScreen(Result<ScreenId, DmError>),
    DefaultDisplayId(Option<DisplayId>),
    Display(Option<DisplayInfo>),
    DisplayIds(Vec<DisplayId>),
    Snapshot(Result<PixelBuffer, SnapshotError>),
    Screen(Option<ScreenInfo>),
    Screens(Vec<ScreenInfo>),
    ScreenIds(Vec<ScreenId>),
    ScreenGroup(Option<ScreenGroupInfo>),
    ColorGamuts(Result<Vec<ColorGamut>, DmError>),
    ColorGamut(Result<ColorGamut, DmError>),
    GamutMap(Result<GamutMap, DmError>),
    Foldable(bool),
    FoldStatus(FoldStatus),
    FoldDisplayMode(FoldDisplayMode),
    CreaseRegion(Option<FoldCreaseRegion>),
    Event(ChangeEvent),
}
