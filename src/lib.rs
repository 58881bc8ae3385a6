//! # Layerstack
//!
//! A layered PNG compositing engine. Artists drop variant images into a
//! collection directory; the engine stacks one variant per layer into a single
//! PNG, optionally cut through alpha masks, engraved with text, and stamped with
//! a QR code.
//!
//! # Architecture: Catalog → Plan → Composite
//!
//! ```text
//! 1. Catalog    assets/<collection>/  →  Catalog       (filenames → ordered layers)
//! 2. Plan       Catalog + Selection   →  CompositePlan (one variant per layer)
//! 3. Composite  CompositePlan         →  RgbaImage     (masked stack, flattened)
//! 4. Decorate   RgbaImage             →  PNG bytes     (engraving, QR stamp)
//! ```
//!
//! Catalogs are built once per collection and shared read-only; every other
//! stage works on per-request values. Plan resolution is pure, and compositing
//! is generic over a [`imaging::RasterBackend`] so the stacking rules can be
//! tested without decoding a single pixel.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`naming`] | `L<level>_<name>_<number>.png` filename parser |
//! | [`types`] | Catalog, layer, variant and layer-role types |
//! | [`catalog`] | Collection scanning and the write-once catalog cache |
//! | [`select`] | Explicit, default and hash-derived variant selection |
//! | [`composite`] | XOR mask / AND companion stacking rules |
//! | [`imaging`] | Raster backend, engraving and QR rendering |
//! | [`render`] | Request pipeline tying the stages together |
//! | [`config`] | `layerstack.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Layer Roles
//!
//! A layer's role is fixed when the catalog is built, from its name:
//!
//! - `Name-XOR` is a **mask**. Its alpha channel replaces the alpha of the
//!   layer directly above it in the plan, and the mask itself is not drawn.
//! - `Name-AND` is a **conditional** layer. It is never selected directly;
//!   it is drawn right after the masked layer when `Name-XOR` exists, using
//!   the variant at the same ordinal as the chosen mask.
//! - Anything else is **plain**.
//!
//! # Hashed Selection
//!
//! `Selection::Hashed(id)` picks `byte[i] % count` for catalog layer `i`, where
//! `byte` is the SHA-256 digest of `id`. The same identifier always yields the
//! same image for an unchanged collection.

pub mod catalog;
pub mod composite;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod render;
pub mod select;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
