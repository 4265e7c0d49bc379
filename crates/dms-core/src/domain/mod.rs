//! Domain entities for the display manager service.
//!
//! This module contains pure topology logic with no infrastructure
//! dependencies: no rendering calls, no threads, no I/O.
//!
//! # What lives here? (for beginners)
//!
//! - **`ids`** – the service and surface id spaces and the mapping between them.
//! - **`screen`** / **`group`** – the screen topology model.  Groups hold
//!   child ids, never the children themselves.
//! - **`display`** – the client-facing projection of a screen.
//! - **`fold`** – fold display modes and hinge states.
//! - **`events`** / **`info`** – what leaves the service: change events and
//!   snapshot DTOs.
//!
//! The controllers that *own* these entities live in the `dms-server` crate.
//! Keeping the entities here means they can be unit-tested without any
//! mocks at all.

pub mod display;
pub mod events;
pub mod fold;
pub mod group;
pub mod ids;
pub mod info;
pub mod screen;
pub mod types;
