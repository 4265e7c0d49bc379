//! Application layer for dms-ctl.
//!
//! Knows which [`Request`](dms_core::Request) each subcommand sends and how
//! each [`Response`](dms_core::Response) is printed.  It never touches a
//! socket.

pub mod commands;

pub use commands::{parse_point, render, Command, CommandError, FoldModeArg, OrientationArg};
