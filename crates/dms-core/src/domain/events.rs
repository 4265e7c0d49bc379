//! Change notifications published to listeners.
//!
//! Every notification the service emits is one variant of [`ChangeEvent`].
//! Listeners subscribe to a [`ListenerKind`] and only receive the variants
//! that belong to it.

use serde::{Deserialize, Serialize};

use crate::domain::fold::{FoldDisplayMode, FoldStatus};
use crate::domain::ids::{DisplayId, ScreenId};
use crate::domain::info::DisplayInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScreenChangeEvent {
    UpdateOrientation,
    UpdateRotation,
    ChangeMode,
    VirtualPixelRatioChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScreenGroupChangeEvent {
    AddToGroup,
    RemoveFromGroup,
    ChangeGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayChangeEvent {
    UpdateOrientation,
    UpdateRotation,
    DisplaySizeChanged,
    DisplayVirtualPixelRatioChanged,
    UpdateRefreshRate,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListenerKind {
    Screen,
    Display,
    FoldDisplayMode,
    FoldStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChangeEvent {
    ScreenConnected(ScreenId),
    ScreenDisconnected(ScreenId),
    ScreenChanged {
        ids: Vec<ScreenId>,
        event: ScreenChangeEvent,
    },
    ScreenGroupChanged {
        ids: Vec<ScreenId>,
        event: ScreenGroupChangeEvent,
    },
    DisplayCreated(DisplayInfo),
    DisplayDestroyed(DisplayId),
    DisplayChanged {
        info: DisplayInfo,
        event: DisplayChangeEvent,
    },
    FoldDisplayModeChanged(FoldDisplayMode),
    /// The last requested mode differs from the applied one once a
    /// transition finished; the caller decides whether to request again.
    FoldDisplayModeUpdateRequested(FoldDisplayMode),
    FoldStatusChanged(FoldStatus),
}

impl ChangeEvent {
    pub fn listener_kind(&self) -> ListenerKind {
        match self {
            ChangeEvent::ScreenConnected(_)
            | ChangeEvent::ScreenDisconnected(_)
            | ChangeEvent::ScreenChanged { .. }
            | ChangeEvent::ScreenGroupChanged { .. } => ListenerKind::Screen,
            ChangeEvent::DisplayCreated(_)
            | ChangeEvent::DisplayDestroyed(_)
            | ChangeEvent::DisplayChanged { .. } => ListenerKind::Display,
            ChangeEvent::FoldDisplayModeChanged(_)
            | ChangeEvent::FoldDisplayModeUpdateRequested(_) => ListenerKind::FoldDisplayMode,
            ChangeEvent::FoldStatusChanged(_) => ListenerKind::FoldStatus,
        }
    }
}
