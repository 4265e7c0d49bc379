//! TCP IPC endpoint.
//!
//! Clients open a TCP connection and exchange length-prefixed bincode
//! frames (see `dms_core::protocol::codec`).  Every [`Request`] gets exactly
//! one [`Response`]; a `Subscribe` request additionally turns the connection
//! into an event stream that lives until the client disconnects.
//!
//! - **`handler`** – Maps one request onto a `DisplayManagerService` call.
//! - **`server`**  – Accept loop and per-connection tasks.
//!
//! [`Request`]: dms_core::Request
//! [`Response`]: dms_core::Response

pub mod handler;
pub mod server;

pub use handler::{RequestHandler, ServiceRequestHandler};
pub use server::{bind, run_server, serve};
