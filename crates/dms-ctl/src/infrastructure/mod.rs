//! Infrastructure layer for dms-ctl: the TCP connection to the service.

pub mod client;

pub use client::{ClientError, DmsClient};
