//! dms-ctl library crate.
//!
//! Command-line client for the display manager service.  Each invocation
//! opens one TCP connection, sends one request (or subscribes), and prints
//! the answer as JSON.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! dmsctl <command>
//!         ↓
//! [dms-ctl]
//!   ├── application/      Subcommand → Request, Response → JSON
//!   └── infrastructure/
//!         └── client/     TCP connection to the service (dms-core codec)
//!         ↓
//! dms-server  (length-prefixed bincode frames over TCP, port 24900)
//! ```
//!
//! # For beginners: why a library and a binary?
//!
//! The translation between command-line arguments and protocol messages is
//! pure and worth testing without a running service.  Keeping it in the
//! library lets `main.rs` stay a thin shell around parsing and I/O.

/// Application layer: command mapping and output rendering.
pub mod application;

/// Infrastructure layer: connection to the service.
pub mod infrastructure;
