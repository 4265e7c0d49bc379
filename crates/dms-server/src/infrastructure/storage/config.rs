//! TOML-based configuration for the display manager service.
//!
//! Read from the path given on the command line, or from the platform config
//! directory:
//! - Linux:    `$XDG_CONFIG_HOME/dms/config.toml` or `~/.config/dms/config.toml`
//! - macOS:    `~/Library/Application Support/DisplayManager/config.toml`
//! - Windows:  `%APPDATA%\DisplayManager\config.toml`
//!
//! Example:
//!
//! ```toml
//! [service]
//! log_level = "debug"
//! default_virtual_pixel_ratio = 1.5
//!
//! [ipc]
//! port = 24900
//!
//! [fold]
//! enabled = true
//! policy = "single"
//!
//! [[fold.physical_screens]]
//! id = 5
//! width = 1008
//! height = 2232
//! refresh_rate = 60
//!
//! [[mock_screens]]
//! surface_id = 0
//! active_mode = 0
//! modes = [{ width = 2224, height = 2496, refresh_rate = 60 }]
//! ```
//!
//! # Serde default values
//!
//! Every field has a `#[serde(default = "...")]` helper, so a missing file,
//! a missing section and a missing key all fall back to the same values as
//! [`AppConfig::default`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dms_core::{Rect, ScreenMode, SurfaceScreenId};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The file parsed but describes an impossible setup.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub ipc: IpcConfig,
    #[serde(default)]
    pub fold: FoldConfig,
    /// Panels the in-memory rendering surface reports at start-up.
    #[serde(default)]
    pub mock_screens: Vec<MockScreenEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    /// `tracing` log level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Virtual pixel ratio given to newly connected screens.
    #[serde(default = "default_virtual_pixel_ratio")]
    pub default_virtual_pixel_ratio: f32,
    /// Whether IPC clients may capture display content.
    #[serde(default = "default_true")]
    pub allow_snapshot: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IpcConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_ipc_port")]
    pub port: u16,
}

/// Which fold state machine drives the panels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FoldPolicyKind {
    /// One logical screen toggled between an inner and an outer panel.
    Single,
    /// MAIN and SUB panels, lit one at a time.
    Dual,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoldConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_fold_policy")]
    pub policy: FoldPolicyKind,
    /// Panel the fold-bound screen is created from (FULL / MAIN).
    #[serde(default = "default_primary_screen_id")]
    pub primary_screen_id: u64,
    /// The other panel (MAIN on single-display devices, SUB on dual).
    #[serde(default = "default_secondary_screen_id")]
    pub secondary_screen_id: u64,
    #[serde(default = "default_crease_region")]
    pub crease_region: Rect,
    /// Start in the boot-animation state.
    #[serde(default)]
    pub on_boot_animation: bool,
    /// Physical panel properties that are not reported by a connect event.
    #[serde(default)]
    pub physical_screens: Vec<PhysicalScreenEntry>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhysicalScreenEntry {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_refresh_rate")]
    pub refresh_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MockScreenEntry {
    pub surface_id: u64,
    pub modes: Vec<ScreenMode>,
    #[serde(default)]
    pub active_mode: usize,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_virtual_pixel_ratio() -> f32 {
    1.0
}
fn default_true() -> bool {
    true
}
fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}
fn default_ipc_port() -> u16 {
    24900
}
fn default_fold_policy() -> FoldPolicyKind {
    FoldPolicyKind::Single
}
fn default_primary_screen_id() -> u64 {
    0
}
fn default_secondary_screen_id() -> u64 {
    5
}
fn default_crease_region() -> Rect {
    Rect {
        x: 0,
        y: 1064,
        width: 2496,
        height: 171,
    }
}
fn default_refresh_rate() -> u32 {
    60
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            default_virtual_pixel_ratio: default_virtual_pixel_ratio(),
            allow_snapshot: default_true(),
        }
    }
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_ipc_port(),
        }
    }
}

impl Default for FoldConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            policy: default_fold_policy(),
            primary_screen_id: default_primary_screen_id(),
            secondary_screen_id: default_secondary_screen_id(),
            crease_region: default_crease_region(),
            on_boot_animation: false,
            physical_screens: Vec::new(),
        }
    }
}

impl FoldConfig {
    pub fn primary(&self) -> SurfaceScreenId {
        SurfaceScreenId(self.primary_screen_id)
    }

    pub fn secondary(&self) -> SurfaceScreenId {
        SurfaceScreenId(self.secondary_screen_id)
    }
}

impl AppConfig {
    /// Rejects combinations the service cannot run with.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratio = self.service.default_virtual_pixel_ratio;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "default_virtual_pixel_ratio must be positive, got {ratio}"
            )));
        }
        if self.fold.enabled && self.fold.primary_screen_id == self.fold.secondary_screen_id {
            return Err(ConfigError::Invalid(
                "fold primary and secondary screen ids must differ".to_string(),
            ));
        }
        Ok(())
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads `AppConfig` from `path` (or the default location), returning
/// `AppConfig::default()` if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed and
/// [`ConfigError::Invalid`] if validation fails.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };

    let cfg = match std::fs::read_to_string(&path) {
        Ok(content) => toml::from_str::<AppConfig>(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
        Err(e) => return Err(ConfigError::Io { path, source: e }),
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("DisplayManager"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("dms"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("DisplayManager")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_default_has_expected_ipc_endpoint() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.ipc.port, 24900);
        assert_eq!(cfg.ipc.bind_address, "127.0.0.1");
    }

    #[test]
    fn test_fold_config_default_matches_single_display_device() {
        let cfg = FoldConfig::default();
        assert!(!cfg.enabled);
        assert_eq!(cfg.policy, FoldPolicyKind::Single);
        assert_eq!(cfg.primary(), SurfaceScreenId(0));
        assert_eq!(cfg.secondary(), SurfaceScreenId(5));
        assert_eq!(cfg.crease_region.y, 1064);
        assert_eq!(cfg.crease_region.height, 171);
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("parse");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_toml_fills_missing_keys() {
        // Arrange
        let text = r#"
            [service]
            log_level = "debug"

            [fold]
            enabled = true
            policy = "dual"

            [[fold.physical_screens]]
            id = 5
            width = 1008
            height = 2232

            [[mock_screens]]
            surface_id = 0
            modes = [{ width = 2224, height = 2496, refresh_rate = 60 }]
        "#;

        // Act
        let cfg: AppConfig = toml::from_str(text).expect("parse");

        // Assert
        assert_eq!(cfg.service.log_level, "debug");
        assert_eq!(cfg.service.default_virtual_pixel_ratio, 1.0);
        assert_eq!(cfg.fold.policy, FoldPolicyKind::Dual);
        assert_eq!(cfg.fold.physical_screens[0].refresh_rate, 60);
        assert_eq!(cfg.mock_screens[0].active_mode, 0);
        assert_eq!(cfg.ipc.port, 24900);
    }

    #[test]
    fn test_validate_rejects_non_positive_pixel_ratio() {
        let mut cfg = AppConfig::default();
        cfg.service.default_virtual_pixel_ratio = 0.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_identical_fold_panels() {
        let mut cfg = AppConfig::default();
        cfg.fold.enabled = true;
        cfg.fold.secondary_screen_id = cfg.fold.primary_screen_id;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_save_then_load_from_explicit_path() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("dms-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.ipc.port = 25000;
        cfg.fold.enabled = true;

        // Act
        save_config(&cfg, &path).expect("save");
        let loaded = load_config(Some(&path)).expect("load");

        // Assert
        assert_eq!(loaded, cfg);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let path = std::env::temp_dir().join(format!("dms-missing-{}.toml", uuid::Uuid::new_v4()));
        assert_eq!(load_config(Some(&path)).expect("load"), AppConfig::default());
    }
}
