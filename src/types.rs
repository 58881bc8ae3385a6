//! Shared catalog types used by the resolver, the engine, and the CLI.
//!
//! A [`Catalog`] is built once per collection and never mutated afterwards;
//! every request borrows it read-only.

use serde::Serialize;
use std::path::PathBuf;

/// Name suffix marking a mask layer.
pub const MASK_SUFFIX: &str = "-XOR";
/// Name suffix marking a conditional companion layer.
pub const CONDITIONAL_SUFFIX: &str = "-AND";

/// One numbered image option within a layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variant {
    /// 1-based number from the filename; the ordering key.
    pub number: u32,
    pub path: PathBuf,
}

/// Compositing role of a layer, derived from its name when the catalog is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerRole {
    /// Drawn as a normal overlay.
    Plain,
    /// `<root>-XOR`: its variant's alpha masks the next plan entry.
    /// `companion` is the catalog index of `<root>-AND`, when present.
    Mask { companion: Option<usize> },
    /// `<root>-AND`: only drawn alongside the matching mask.
    Conditional { root: String },
}

impl LayerRole {
    pub fn is_mask(&self) -> bool {
        matches!(self, LayerRole::Mask { .. })
    }

    pub fn is_conditional(&self) -> bool {
        matches!(self, LayerRole::Conditional { .. })
    }
}

/// A named, leveled group of alternative image variants.
///
/// Invariant: `images` is non-empty and sorted ascending by `number`, so the
/// zero-based ordinal of a variant is its position in `images`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layer {
    pub level: u32,
    pub name: String,
    pub role: LayerRole,
    pub images: Vec<Variant>,
}

impl Layer {
    /// Name with any `-XOR` suffix removed.
    pub fn mask_root(&self) -> Option<&str> {
        self.name.strip_suffix(MASK_SUFFIX)
    }

    pub fn variant_count(&self) -> usize {
        self.images.len()
    }

    /// Position of the variant whose path matches `path`.
    pub fn ordinal_of(&self, path: &std::path::Path) -> Option<usize> {
        self.images.iter().position(|v| v.path == path)
    }
}

/// Layer name and variant count, as exposed to selection UIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub name: String,
    pub count: usize,
}

/// All layers of one collection, ascending by level.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub collection: String,
    pub layers: Vec<Layer>,
}

impl Catalog {
    /// Layers that take part in normal iteration (everything but `-AND`).
    pub fn selectable_layers(&self) -> impl Iterator<Item = (usize, &Layer)> {
        self.layers
            .iter()
            .enumerate()
            .filter(|(_, l)| !l.role.is_conditional())
    }

    pub fn find_layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Name and variant count of every layer, in level order.
    pub fn groups(&self) -> Vec<Group> {
        self.layers
            .iter()
            .map(|l| Group {
                name: l.name.clone(),
                count: l.variant_count(),
            })
            .collect()
    }

    /// Number of distinct composites reachable by selection.
    ///
    /// Saturates instead of overflowing for very large catalogs.
    pub fn max_combinations(&self) -> u64 {
        self.selectable_layers()
            .map(|(_, l)| l.variant_count() as u64)
            .fold(1u64, |acc, n| acc.saturating_mul(n))
    }
}
