//! Parameter types for overlay decorators.
//!
//! These structs describe *what* to draw, not *how*. They are built from the
//! `[engraving]` and `[qr]` config sections and handed to the decorators in
//! [`engrave`](super::engrave) and [`qr`](super::qr).
//!
//! - [`EngravingParams`]: text box geometry, opacity, font size, character cap.
//! - [`QrParams`]: overlay size ratio and opacity, standalone module size.

use crate::config::{EngravingConfig, QrConfig};

/// Engraving text box settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EngravingParams {
    /// Text beyond this many characters is dropped before drawing.
    pub max_chars: usize,
    /// Box width as a fraction of the image width.
    pub box_width_ratio: f64,
    pub box_height: u32,
    /// Gap between the box's bottom edge and the image's bottom edge.
    pub bottom_margin: u32,
    pub corner_radius: u32,
    /// Fill opacity of the dark box.
    pub box_opacity: f64,
    pub font_size: u32,
}

impl Default for EngravingParams {
    fn default() -> Self {
        Self::from(&EngravingConfig::default())
    }
}

impl From<&EngravingConfig> for EngravingParams {
    fn from(config: &EngravingConfig) -> Self {
        Self {
            max_chars: config.max_chars,
            box_width_ratio: config.box_width_ratio,
            box_height: config.box_height,
            bottom_margin: config.bottom_margin,
            corner_radius: config.corner_radius,
            box_opacity: config.box_opacity,
            font_size: config.font_size,
        }
    }
}

/// QR overlay and standalone rendering settings.
#[derive(Debug, Clone, PartialEq)]
pub struct QrParams {
    /// Overlay edge as a fraction of the image's shorter side.
    pub size_ratio: f64,
    /// Overlay opacity.
    pub opacity: f64,
    /// Pixels per module for the standalone QR image.
    pub module_px: u32,
}

impl Default for QrParams {
    fn default() -> Self {
        Self::from(&QrConfig::default())
    }
}

impl From<&QrConfig> for QrParams {
    fn from(config: &QrConfig) -> Self {
        Self {
            size_ratio: config.size_ratio,
            opacity: config.opacity,
            module_px: config.module_px,
        }
    }
}
