//! Selection resolution: from a selection source to a [`CompositePlan`].
//!
//! Three strategies produce the same plan shape: one entry per non-`-AND`
//! layer, in level order:
//!
//! - **Explicit**: caller-supplied zero-based indices keyed by layer name
//!   (case-insensitive). Missing, unparsable, or out-of-range indices fall
//!   back to the first variant; that is never an error.
//! - **Hashed**: SHA-256 of an identifier string. Digest byte `i` picks the
//!   variant of catalog layer `i` as `byte % variant_count`. Every layer
//!   consumes a byte, `-AND` layers included, so a layer's byte depends only
//!   on its position. Catalogs longer than the digest wrap around it.
//! - **Default**: the first variant of every layer.
//!
//! A suppressed layer (the emblem, when a QR payload replaces it) is left out
//! of the plan entirely, without shifting which digest byte other layers use.

use crate::types::Catalog;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Explicit per-layer indices, keyed by lower-cased layer name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplicitSelection {
    indices: HashMap<String, i64>,
}

impl ExplicitSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the index for `layer` (matched case-insensitively).
    pub fn set(&mut self, layer: &str, index: i64) {
        self.indices.insert(layer.to_lowercase(), index);
    }

    pub fn with(mut self, layer: &str, index: i64) -> Self {
        self.set(layer, index);
        self
    }

    /// Build from raw `name=value` pairs such as query parameters.
    ///
    /// Each value contributes its leading integer (`"2abc"` is 2, `"1.5"`
    /// is 1). Values with no leading integer are dropped, which makes the
    /// layer fall back to its first variant.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut selection = Self::new();
        for (key, value) in pairs {
            if let Some(index) = leading_int(value.as_ref()) {
                selection.set(key.as_ref(), index);
            }
        }
        selection
    }

    pub fn get(&self, layer: &str) -> Option<i64> {
        self.indices.get(&layer.to_lowercase()).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Leading optionally-signed decimal integer of `raw`, after leading whitespace.
fn leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let unsigned = trimmed.trim_start_matches(['+', '-']);
    let sign_len = trimmed.len() - unsigned.len();
    if sign_len > 1 {
        return None;
    }
    let digits = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if digits == 0 {
        return None;
    }
    trimmed[..sign_len + digits].parse().ok()
}

/// Where per-layer choices come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// First variant of every layer.
    Default,
    Explicit(ExplicitSelection),
    /// Deterministic choice derived from an identifier (e.g. a UUID).
    Hashed(String),
}

/// One resolved image in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    /// Index into [`Catalog::layers`].
    pub layer: usize,
    /// Zero-based variant ordinal within that layer.
    pub variant: usize,
    pub path: PathBuf,
}

/// Ordered images to composite, bottom to top.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompositePlan {
    pub entries: Vec<PlanEntry>,
}

impl CompositePlan {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> Vec<&std::path::Path> {
        self.entries.iter().map(|e| e.path.as_path()).collect()
    }
}

/// Clamp a requested index into `[0, count)`, falling back to 0.
pub fn effective_index(requested: Option<i64>, count: usize) -> usize {
    match requested {
        Some(i) if i >= 0 && (i as u64) < count as u64 => i as usize,
        _ => 0,
    }
}

/// Per-layer digest bytes for `identifier`, one per catalog layer.
pub fn hash_bytes(identifier: &str, layer_count: usize) -> Vec<u8> {
    let digest = Sha256::digest(identifier.as_bytes());
    (0..layer_count).map(|i| digest[i % digest.len()]).collect()
}

/// Resolve `selection` against `catalog` into a plan.
///
/// `suppressed` names a layer to omit (exact name match), e.g. the emblem
/// when a QR overlay takes its place.
pub fn resolve_plan(
    catalog: &Catalog,
    selection: &Selection,
    suppressed: Option<&str>,
) -> CompositePlan {
    let digest = match selection {
        Selection::Hashed(id) => hash_bytes(id, catalog.layers.len()),
        _ => Vec::new(),
    };

    let entries: Vec<PlanEntry> = catalog
        .selectable_layers()
        .filter(|(_, layer)| suppressed != Some(layer.name.as_str()))
        .map(|(idx, layer)| {
            let count = layer.variant_count();
            let variant = match selection {
                Selection::Default => 0,
                Selection::Explicit(explicit) => effective_index(explicit.get(&layer.name), count),
                Selection::Hashed(_) => usize::from(digest[idx]) % count,
            };
            PlanEntry {
                layer: idx,
                variant,
                path: layer.images[variant].path.clone(),
            }
        })
        .collect();

    debug!(
        collection = catalog.collection.as_str(),
        entries = entries.len(),
        "resolved composite plan"
    );
    CompositePlan { entries }
}
