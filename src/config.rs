//! Configuration module.
//!
//! Handles loading, validating, and merging `layerstack.toml`. Stock defaults
//! are the base layer; a `layerstack.toml` in the assets root overrides any
//! subset of keys.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! default_collection = "default_collection"  # Used when a request names none
//! emblem_layer = "Emblem"   # Layer dropped when a QR payload is supplied
//!
//! [engraving]
//! max_chars = 20            # Longer text is truncated
//! box_width_ratio = 0.7     # Box width as a fraction of image width
//! box_height = 70           # Box height in pixels
//! bottom_margin = 40        # Gap below the box in pixels
//! corner_radius = 10        # Rounded corner radius in pixels
//! box_opacity = 0.5         # Dark box fill opacity
//! font_size = 48            # Text size in pixels
//!
//! [qr]
//! size_ratio = 0.3          # QR edge as a fraction of the shorter image side
//! opacity = 0.5             # QR overlay opacity
//! module_px = 8             # Pixels per module for standalone QR images
//!
//! [processing]
//! max_processes = 4         # Max parallel scan workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config file name, looked up in the assets root.
pub const CONFIG_FILENAME: &str = "layerstack.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Compositor configuration loaded from `layerstack.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Collection used when a request does not name one.
    pub default_collection: String,
    /// Layer omitted from the plan when a QR payload is supplied.
    pub emblem_layer: String,
    pub engraving: EngravingConfig,
    pub qr: QrConfig,
    pub processing: ProcessingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_collection: "default_collection".to_string(),
            emblem_layer: "Emblem".to_string(),
            engraving: EngravingConfig::default(),
            qr: QrConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_collection.trim().is_empty() {
            return Err(ConfigError::Validation(
                "default_collection must not be empty".into(),
            ));
        }
        check_ratio("engraving.box_width_ratio", self.engraving.box_width_ratio)?;
        check_ratio("engraving.box_opacity", self.engraving.box_opacity)?;
        check_ratio("qr.size_ratio", self.qr.size_ratio)?;
        check_ratio("qr.opacity", self.qr.opacity)?;
        if self.engraving.max_chars == 0 {
            return Err(ConfigError::Validation(
                "engraving.max_chars must be non-zero".into(),
            ));
        }
        if self.engraving.font_size == 0 {
            return Err(ConfigError::Validation(
                "engraving.font_size must be non-zero".into(),
            ));
        }
        if self.qr.module_px == 0 {
            return Err(ConfigError::Validation(
                "qr.module_px must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

fn check_ratio(key: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{key} must be in (0, 1]")))
    }
}

/// Engraving text box settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngravingConfig {
    pub max_chars: usize,
    pub box_width_ratio: f64,
    pub box_height: u32,
    pub bottom_margin: u32,
    pub corner_radius: u32,
    pub box_opacity: f64,
    pub font_size: u32,
}

impl Default for EngravingConfig {
    fn default() -> Self {
        Self {
            max_chars: 20,
            box_width_ratio: 0.7,
            box_height: 70,
            bottom_margin: 40,
            corner_radius: 10,
            box_opacity: 0.5,
            font_size: 48,
        }
    }
}

/// QR overlay settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QrConfig {
    pub size_ratio: f64,
    pub opacity: f64,
    pub module_px: u32,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            size_ratio: 0.3,
            opacity: 0.5,
            module_px: 8,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel scan workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `layerstack.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `layerstack.toml` in the assets root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(assets_root: &Path) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(assets_root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `layerstack.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# layerstack configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Place this file in the assets root
# (next to the collection directories). Unknown keys will cause an error.

# Collection used when a request does not name one.
default_collection = "default_collection"

# Layer left out of the composite when a QR payload is supplied; the QR
# stamp takes its place.
emblem_layer = "Emblem"

# ---------------------------------------------------------------------------
# Engraving text box
# ---------------------------------------------------------------------------
[engraving]
# Text longer than this many characters is truncated.
max_chars = 20

# Box width as a fraction of the image width (centered).
box_width_ratio = 0.7

# Box height and its distance from the bottom edge, in pixels.
box_height = 70
bottom_margin = 40

# Rounded corner radius in pixels.
corner_radius = 10

# Opacity of the dark box fill (0-1].
box_opacity = 0.5

# Bold monospace text size in pixels.
font_size = 48

# ---------------------------------------------------------------------------
# QR code
# ---------------------------------------------------------------------------
[qr]
# QR edge as a fraction of the image's shorter side (centered).
size_ratio = 0.3

# Overlay opacity (0-1].
opacity = 0.5

# Pixels per module for standalone QR images.
module_px = 8

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for pre-warming the layer cache.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
