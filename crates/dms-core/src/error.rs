//! Error taxonomy shared by the topology controllers and the IPC boundary.
//!
//! Commands return [`DmResult`]; queries return `Option`/`Vec` and never
//! fail.  [`DmError::code`] maps each kind onto the numeric codes that IPC
//! clients expect.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kinds of failure a display-manager command can report.
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
pub enum DmError {
    /// Malformed request shape (arity mismatch, index out of range, zero size).
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Reference to an unknown screen, group or display.
    #[error("{kind} {id} not found")]
    NotFound { kind: String, id: u64 },

    /// The caller lacks the permission for this operation.
    #[error("permission denied")]
    PermissionDenied,

    /// The rendering-surface layer rejected the call.
    #[error("rendering backend failed during {op} with status {status}")]
    BackendFailure { op: String, status: i32 },

    /// The request conflicts with current state.
    #[error("state conflict: {0}")]
    StateConflict(String),
}

impl DmError {
    /// Convenience constructor for [`DmError::NotFound`].
    pub fn not_found(kind: &str, id: u64) -> Self {
        DmError::NotFound {
            kind: kind.to_string(),
            id,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        DmError::InvalidParam(reason.into())
    }

    /// Numeric code reported over IPC (`0` is reserved for success).
    pub fn code(&self) -> i32 {
        match self {
            DmError::NotFound { .. } => DM_ERROR_NULLPTR,
            DmError::InvalidParam(_) => DM_ERROR_INVALID_PARAM,
            DmError::BackendFailure { .. } => DM_ERROR_RENDER_SERVICE_FAILED,
            DmError::StateConflict(_) => DM_ERROR_INVALID_CALLING,
            DmError::PermissionDenied => DM_ERROR_NOT_SYSTEM_APP,
        }
    }
}

pub const DM_OK: i32 = 0;
pub const DM_ERROR_NULLPTR: i32 = 120;
pub const DM_ERROR_INVALID_PARAM: i32 = 130;
pub const DM_ERROR_RENDER_SERVICE_FAILED: i32 = 150;
pub const DM_ERROR_INVALID_CALLING: i32 = 170;
pub const DM_ERROR_NOT_SYSTEM_APP: i32 = 202;

pub type DmResult<T> = Result<T, DmError>;

/// Outcome of a failed display capture, kept apart from [`DmError`] so UI
/// code can tell a permission prompt from a transient backend failure.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotError {
    #[error("no permission to capture the display")]
    NoPermission,
    #[error("system abnormal while capturing the display")]
    SystemAbnormal,
    #[error("display capture failed")]
    Failed,
}
