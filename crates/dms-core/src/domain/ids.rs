//! Identifier newtypes and the service ↔ surface screen id mapping.
//!
//! # Two id spaces (for beginners)
//!
//! Every physical or virtual screen is known under two different numbers:
//!
//! - the **surface id** is handed out by the rendering subsystem.  It may be
//!   reused when a panel is unplugged and plugged back in.
//! - the **service id** is handed out by this service.  It is never reused
//!   during a process lifetime, so clients can hold on to it safely.
//!
//! Mixing the two up is an easy bug to write, so each space gets its own
//! newtype and the compiler refuses to compare a [`ScreenId`] with a
//! [`SurfaceScreenId`].  [`ScreenIdManager`] is the only place where one is
//! converted into the other.
//!
//! Screen *groups* live in the service id space as well: a group id is
//! allocated from the same counter as screen ids but has no surface mapping.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Service-assigned screen (or screen group) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScreenId(pub u64);

/// Rendering-subsystem screen identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SurfaceScreenId(pub u64);

/// Logical display identifier.  Kept apart from [`ScreenId`] even though the
/// projection is normally 1:1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DisplayId(pub u64);

/// Handle to a display node owned by the rendering subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeHandle(pub u64);

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SurfaceScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rs:{}", self.0)
    }
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

// ── ScreenIdManager ───────────────────────────────────────────────────────────

/// Bidirectional mapping between service ids and surface ids.
///
/// Service ids are allocated from a monotonically increasing counter that is
/// shared with screen-group ids.  The manager performs no locking of its own;
/// it lives inside the topology state and is only touched while the topology
/// lock is held.
///
/// # Examples
///
/// ```rust
/// use dms_core::domain::ids::{ScreenIdManager, SurfaceScreenId};
///
/// let mut ids = ScreenIdManager::new();
/// let service = ids.create_mapping(SurfaceScreenId(7)).unwrap();
/// assert_eq!(ids.to_surface_id(service), Some(SurfaceScreenId(7)));
/// assert_eq!(ids.to_service_id(SurfaceScreenId(7)), Some(service));
/// ```
#[derive(Debug, Default)]
pub struct ScreenIdManager {
    next_id: u64,
    service_to_surface: HashMap<ScreenId, SurfaceScreenId>,
    surface_to_service: HashMap<SurfaceScreenId, ScreenId>,
}

impl ScreenIdManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh service id without recording any surface mapping.
    ///
    /// Used for screen groups.  Returns `None` once the id space is
    /// exhausted instead of wrapping around onto live ids.
    pub fn allocate_id(&mut self) -> Option<ScreenId> {
        let id = self.next_id;
        self.next_id = self.next_id.checked_add(1)?;
        Some(ScreenId(id))
    }

    /// Allocates a service id for `surface_id` and records both directions.
    ///
    /// If `surface_id` is already mapped the existing service id is returned
    /// unchanged.
    pub fn create_mapping(&mut self, surface_id: SurfaceScreenId) -> Option<ScreenId> {
        if let Some(existing) = self.surface_to_service.get(&surface_id) {
            return Some(*existing);
        }
        let id = self.allocate_id()?;
        self.service_to_surface.insert(id, surface_id);
        self.surface_to_service.insert(surface_id, id);
        Some(id)
    }

    /// Removes both directions of the mapping for `service_id`.
    ///
    /// Returns `false` when the id was not mapped.
    pub fn remove(&mut self, service_id: ScreenId) -> bool {
        match self.service_to_surface.remove(&service_id) {
            Some(surface_id) => {
                self.surface_to_service.remove(&surface_id);
                true
            }
            None => false,
        }
    }

    pub fn to_surface_id(&self, service_id: ScreenId) -> Option<SurfaceScreenId> {
        self.service_to_surface.get(&service_id).copied()
    }

    pub fn to_service_id(&self, surface_id: SurfaceScreenId) -> Option<ScreenId> {
        self.surface_to_service.get(&surface_id).copied()
    }

    pub fn has_service_id(&self, service_id: ScreenId) -> bool {
        self.service_to_surface.contains_key(&service_id)
    }

    pub fn has_surface_id(&self, surface_id: SurfaceScreenId) -> bool {
        self.surface_to_service.contains_key(&surface_id)
    }

    /// Number of live mappings.
    pub fn len(&self) -> usize {
        self.service_to_surface.len()
    }

    pub fn is_empty(&self) -> bool {
        self.service_to_surface.is_empty()
    }
}
