//! Infrastructure layer for the display manager service.
//!
//! Contains the adapters the application layer talks to through traits:
//! the rendering surface, the power manager, the ordered task scheduler,
//! the change-listener registry, configuration storage and the TCP IPC
//! server.
//!
//! **Dependency rule**: `application` may name the seam traits declared here
//! (`RenderSurface`, `PowerManager`, `TaskScheduler`, `EventSink`) but never
//! a concrete adapter.  `bootstrap` and the tests pick the implementations.

pub mod bootstrap;
pub mod ipc;
pub mod listeners;
pub mod power;
pub mod render_surface;
pub mod scheduler;
pub mod storage;
