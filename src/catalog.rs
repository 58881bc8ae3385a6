//! Layer catalog building and caching.
//!
//! A collection is a directory under the assets root holding variant images
//! named `L<level>_<name>_<number>.png` (see [`naming`](crate::naming)):
//!
//! ```text
//! assets/
//! ├── layerstack.toml              # Optional config
//! ├── default_collection/
//! │   ├── L0_Background_1.png
//! │   ├── L0_Background_2.png
//! │   ├── L1_Eyes-XOR_1.png        # Mask for the next layer
//! │   ├── L2_Pupils_1.png
//! │   ├── L3_Eyes-AND_1.png        # Drawn with Eyes-XOR, same ordinal
//! │   └── notes.txt                # Ignored
//! └── night/
//!     └── ...
//! ```
//!
//! ## Scan rules
//!
//! - Files that do not follow the naming pattern are skipped silently.
//! - Files are grouped into layers by level; the layer takes the name of the
//!   first file (in sorted filename order) at that level. Files at the same
//!   level with a different name are skipped with a warning.
//! - Duplicate variant numbers within a layer: the last file in sorted
//!   filename order wins.
//! - Variants are sorted ascending by number, layers ascending by level.
//! - Roles ([`LayerRole`]) are assigned once here; `-XOR` layers record the
//!   index of their `-AND` companion, matched by name.
//!
//! ## Caching
//!
//! [`CatalogCache`] keeps one immutable [`Catalog`] per collection for the
//! lifetime of the process. The map itself is an immutable snapshot: inserts
//! and rebuilds build a new map and swap the pointer, so readers only hold the
//! lock long enough to clone an `Arc`.

use crate::naming::parse_variant_name;
use crate::types::{CONDITIONAL_SUFFIX, Catalog, Layer, LayerRole, MASK_SUFFIX, Variant};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error reading {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Collection not found: {0}")]
    NotFound(String),
    #[error("Invalid collection name: {0:?}")]
    InvalidName(String),
}

/// Scan one collection directory under `assets_root` into a [`Catalog`].
pub fn scan_collection(assets_root: &Path, collection: &str) -> Result<Catalog, CatalogError> {
    validate_collection_name(collection)?;
    let dir = assets_root.join(collection);
    if !dir.is_dir() {
        return Err(CatalogError::NotFound(collection.to_string()));
    }

    let filenames: Vec<String> = read_entries(&dir)?
        .into_iter()
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();

    let catalog = build_catalog(collection, &dir, filenames);
    debug!(
        collection,
        layers = catalog.layers.len(),
        "scanned collection"
    );
    Ok(catalog)
}

/// Entries of `dir`; entries that cannot be read are logged and skipped.
fn read_entries(dir: &Path) -> Result<Vec<fs::DirEntry>, CatalogError> {
    let entries = fs::read_dir(dir).map_err(|source| CatalogError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .collect())
}

/// Build a catalog from a listing of filenames inside `dir`.
///
/// Pure apart from logging: no filesystem access, so the grouping rules can
/// be tested on synthetic listings.
pub fn build_catalog(
    collection: &str,
    dir: &Path,
    filenames: impl IntoIterator<Item = String>,
) -> Catalog {
    let mut filenames: Vec<String> = filenames.into_iter().collect();
    filenames.sort();

    // level → (name, number → variant)
    let mut by_level: BTreeMap<u32, (String, BTreeMap<u32, Variant>)> = BTreeMap::new();

    for filename in &filenames {
        let Some(parsed) = parse_variant_name(filename) else {
            continue;
        };
        let (name, variants) = by_level
            .entry(parsed.level)
            .or_insert_with(|| (parsed.name.clone(), BTreeMap::new()));

        if *name != parsed.name {
            warn!(
                collection,
                file = filename.as_str(),
                level = parsed.level,
                layer = name.as_str(),
                "skipping file whose name disagrees with its level's layer"
            );
            continue;
        }

        let variant = Variant {
            number: parsed.number,
            path: dir.join(filename),
        };
        if let Some(previous) = variants.insert(parsed.number, variant) {
            debug!(
                collection,
                replaced = %previous.path.display(),
                number = parsed.number,
                "duplicate variant number, last file wins"
            );
        }
    }

    let mut layers: Vec<Layer> = by_level
        .into_iter()
        .map(|(level, (name, variants))| Layer {
            level,
            name,
            role: LayerRole::Plain,
            images: variants.into_values().collect(),
        })
        .collect();
    assign_roles(&mut layers);

    Catalog {
        collection: collection.to_string(),
        layers,
    }
}

/// Tag each layer with its compositing role.
fn assign_roles(layers: &mut [Layer]) {
    let index_by_name: HashMap<String, usize> = layers
        .iter()
        .enumerate()
        .map(|(i, l)| (l.name.clone(), i))
        .collect();

    for layer in layers.iter_mut() {
        layer.role = if let Some(root) = layer.name.strip_suffix(CONDITIONAL_SUFFIX) {
            LayerRole::Conditional {
                root: root.to_string(),
            }
        } else if let Some(root) = layer.name.strip_suffix(MASK_SUFFIX) {
            let companion = index_by_name
                .get(&format!("{root}{CONDITIONAL_SUFFIX}"))
                .copied();
            LayerRole::Mask { companion }
        } else {
            LayerRole::Plain
        };
    }
}

/// Collection identifiers are single directory names.
fn validate_collection_name(collection: &str) -> Result<(), CatalogError> {
    let bad = collection.is_empty()
        || collection == "."
        || collection == ".."
        || collection.contains(['/', '\\']);
    if bad {
        return Err(CatalogError::InvalidName(collection.to_string()));
    }
    Ok(())
}

/// List the collection directories under `assets_root`, sorted by name.
pub fn discover_collections(assets_root: &Path) -> Result<Vec<String>, CatalogError> {
    let mut names: Vec<String> = read_entries(assets_root)?
        .into_iter()
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| !name.starts_with('.'))
        .collect();
    names.sort();
    Ok(names)
}

/// Outcome of [`CatalogCache::prewarm`].
#[derive(Debug, Default)]
pub struct WarmReport {
    /// Collections now cached, default first.
    pub loaded: Vec<String>,
    /// Collections that failed to scan, with the error message.
    pub failed: Vec<(String, String)>,
}

type Snapshot = Arc<HashMap<String, Arc<Catalog>>>;

/// Process-lifetime cache of scanned catalogs, keyed by collection.
pub struct CatalogCache {
    assets_root: PathBuf,
    snapshot: RwLock<Snapshot>,
}

impl CatalogCache {
    pub fn new(assets_root: impl Into<PathBuf>) -> Self {
        Self {
            assets_root: assets_root.into(),
            snapshot: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    pub fn assets_root(&self) -> &Path {
        &self.assets_root
    }

    fn current(&self) -> Snapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Publish new catalogs by swapping in an extended copy of the map.
    fn publish(&self, catalogs: impl IntoIterator<Item = Arc<Catalog>>) {
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        let mut next: HashMap<String, Arc<Catalog>> = (**guard).clone();
        for catalog in catalogs {
            next.insert(catalog.collection.clone(), catalog);
        }
        *guard = Arc::new(next);
    }

    /// Cached catalog for `collection`, if it has been loaded.
    pub fn cached(&self, collection: &str) -> Option<Arc<Catalog>> {
        self.current().get(collection).cloned()
    }

    /// Cached catalog for `collection`, scanning it on first use.
    pub fn get(&self, collection: &str) -> Result<Arc<Catalog>, CatalogError> {
        if let Some(catalog) = self.cached(collection) {
            return Ok(catalog);
        }
        self.rebuild(collection)
    }

    /// Rescan `collection` and replace any cached catalog.
    pub fn rebuild(&self, collection: &str) -> Result<Arc<Catalog>, CatalogError> {
        let catalog = Arc::new(scan_collection(&self.assets_root, collection)?);
        self.publish([Arc::clone(&catalog)]);
        Ok(catalog)
    }

    /// Cached collection names, sorted.
    pub fn collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.current().keys().cloned().collect();
        names.sort();
        names
    }

    /// Load the default collection and every discoverable collection.
    ///
    /// Per-collection scan failures are logged and reported, never fatal.
    pub fn prewarm(&self, default_collection: &str) -> WarmReport {
        let mut report = WarmReport::default();

        let discovered = match discover_collections(&self.assets_root) {
            Ok(names) => names,
            Err(e) => {
                error!(error = %e, "failed to list collections");
                report.failed.push((self.assets_root.display().to_string(), e.to_string()));
                return report;
            }
        };

        if discovered.iter().any(|c| c == default_collection) {
            match self.rebuild(default_collection) {
                Ok(_) => report.loaded.push(default_collection.to_string()),
                Err(e) => {
                    warn!(collection = default_collection, error = %e, "skipping collection");
                    report.failed.push((default_collection.to_string(), e.to_string()));
                }
            }
        }

        let others: Vec<(String, Result<Catalog, CatalogError>)> = discovered
            .into_par_iter()
            .filter(|c| c != default_collection)
            .map(|c| {
                let result = scan_collection(&self.assets_root, &c);
                (c, result)
            })
            .collect();

        let mut fresh = Vec::new();
        for (collection, result) in others {
            match result {
                Ok(catalog) => {
                    report.loaded.push(collection);
                    fresh.push(Arc::new(catalog));
                }
                Err(e) => {
                    warn!(collection = collection.as_str(), error = %e, "skipping collection");
                    report.failed.push((collection, e.to_string()));
                }
            }
        }
        self.publish(fresh);

        info!(collections = ?report.loaded, "layer cache initialized");
        report
    }
}
