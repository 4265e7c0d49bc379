//! Storage infrastructure: configuration file persistence.
//!
//! The service keeps no topology on disk; every screen is rediscovered from
//! live connect events.  The only file it reads is the TOML configuration
//! handled by the `config` sub-module:
//!
//! - Resolving the platform-appropriate config path.
//! - Falling back to defaults when the file does not exist (first run).
//! - Writing a config back out, used by tests and by `--write-default-config`.

pub mod config;
