//! Shared test utilities for the layerstack test suite.
//!
//! Provides synthetic catalogs (no files), on-disk collections of generated
//! PNG layers, and small extractors for asserting on catalogs and plans.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! write_collection(tmp.path(), "pack", &[("L0_Background_1.png", RED)]);
//! let catalog = scan_collection(tmp.path(), "pack").unwrap();
//! assert_eq!(layer_names(&catalog), vec!["Background"]);
//! ```

use crate::catalog::build_catalog;
use crate::select::CompositePlan;
use crate::types::{Catalog, Layer};
use image::{Rgba, RgbaImage};
use std::path::Path;

// =========================================================================
// Colors
// =========================================================================

pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

// =========================================================================
// Synthetic catalogs
// =========================================================================

/// Catalog whose layer `i` is at level `i` with `count` variants.
///
/// Paths look like `/c/L<level>_<name>_<n>.png`; nothing is written to disk.
pub fn catalog_with_counts(layers: &[(&str, u32)]) -> Catalog {
    let filenames = layers.iter().enumerate().flat_map(|(level, (name, count))| {
        (1..=*count).map(move |n| format!("L{level}_{name}_{n}.png"))
    });
    build_catalog("c", Path::new("/c"), filenames)
}

/// Background(2), Eyes-XOR(2), Pupils(2), Eyes-AND(2) at levels 0..=3.
pub fn eyes_catalog() -> Catalog {
    catalog_with_counts(&[("Background", 2), ("Eyes-XOR", 2), ("Pupils", 2), ("Eyes-AND", 2)])
}

// =========================================================================
// On-disk fixtures
// =========================================================================

pub fn solid(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color)
}

/// Write a solid-color PNG.
pub fn write_png(path: &Path, width: u32, height: u32, color: Rgba<u8>) {
    solid(width, height, color).save(path).unwrap();
}

/// Create `<root>/<collection>/` with one 4×4 solid PNG per `(filename, color)`.
pub fn write_collection(root: &Path, collection: &str, files: &[(&str, Rgba<u8>)]) {
    let dir = root.join(collection);
    std::fs::create_dir_all(&dir).unwrap();
    for (name, color) in files {
        write_png(&dir.join(name), 4, 4, *color);
    }
}

// =========================================================================
// Extractors
// =========================================================================

/// Layer names in level order.
pub fn layer_names(catalog: &Catalog) -> Vec<&str> {
    catalog.layers.iter().map(|l| l.name.as_str()).collect()
}

/// Variant numbers of a layer, in order.
pub fn variant_numbers(layer: &Layer) -> Vec<u32> {
    layer.images.iter().map(|v| v.number).collect()
}

/// File stems of every plan entry, in order.
pub fn plan_stems(plan: &CompositePlan) -> Vec<String> {
    plan.entries
        .iter()
        .map(|e| {
            e.path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default()
        })
        .collect()
}
