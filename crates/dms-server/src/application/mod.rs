//! Application layer of the display manager service.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure topology rules in `dms-core`) and the infrastructure (rendering
//! backend, power manager, sockets, config files).
//!
//! Code in this layer:
//!
//! - **Orchestrates** domain entities to fulfil one command, e.g. "mirror
//!   screen 0 onto screen 3" touches two groups, two display nodes and the
//!   display projection.
//! - **Depends on traits** (`RenderSurface`, `PowerManager`, `TaskScheduler`,
//!   `EventSink`) so tests can plug in mocks.
//! - **Performs no I/O of its own**.
//!
//! # Sub-modules
//!
//! - **`screen_topology`** – Screen and screen-group registry.  Reacts to
//!   panels appearing and disappearing and executes mirror/expand commands.
//!
//! - **`display_topology`** – Projects eligible screens onto logical
//!   displays and reports created/changed/destroyed displays.
//!
//! - **`fold`** – The fold-mode state machine: sensor input, the two panel
//!   policies and the ordered power task sequence.
//!
//! - **`service`** – `DisplayManagerService`, the single context object the
//!   IPC server and the event pumps call into.

pub mod display_topology;
pub mod fold;
pub mod screen_topology;
pub mod service;
