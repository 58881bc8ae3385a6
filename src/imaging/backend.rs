//! Raster backend trait and shared types.
//!
//! The [`RasterBackend`] trait is the capability the compositing engine
//! depends on: decode a layer, replace an image's alpha with a mask's alpha,
//! flatten a stack, and encode the result.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use a mock whose rasters are strings, so the engine's
//! pairing logic can be checked without touching pixels.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("Failed to encode PNG: {0}")]
    Encode(String),
    #[error("Size mismatch: {what} is {actual:?}, expected {expected:?}")]
    DimensionMismatch {
        what: &'static str,
        actual: Dimensions,
        expected: Dimensions,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Operations the compositing engine needs from an image library.
pub trait RasterBackend: Sync {
    /// In-memory image type.
    type Raster;

    /// Decode an image from disk, normalized to carry an alpha channel.
    fn load(&self, path: &Path) -> Result<Self::Raster, BackendError>;

    /// Color channels of `image`, alpha channel of `mask`.
    fn apply_mask(
        &self,
        image: Self::Raster,
        mask: Self::Raster,
    ) -> Result<Self::Raster, BackendError>;

    /// Draw `overlays` onto `base` in order, later ones on top.
    fn flatten(
        &self,
        base: Self::Raster,
        overlays: Vec<Self::Raster>,
    ) -> Result<Self::Raster, BackendError>;

    /// Encode as PNG.
    fn encode_png(&self, raster: &Self::Raster) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend whose rasters are descriptive strings.
    ///
    /// `load("dir/L2_Pupils_2.png")` yields `"L2_Pupils_2"`, masking yields
    /// `"image&mask"`, and flattening joins the stack with `" + "`.
    /// Uses Mutex (not RefCell) so it satisfies the `Sync` bound.
    #[derive(Default)]
    pub struct MockBackend {
        pub operations: Mutex<Vec<RecordedOp>>,
        pub fail_on: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Load(String),
        Mask { image: String, mask: String },
        Flatten { layers: usize },
        Encode,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// A backend that fails to decode any file whose stem equals `stem`.
        pub fn failing_on(stem: &str) -> Self {
            Self {
                operations: Mutex::new(Vec::new()),
                fail_on: Some(stem.to_string()),
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }
    }

    impl RasterBackend for MockBackend {
        type Raster = String;

        fn load(&self, path: &Path) -> Result<String, BackendError> {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            self.record(RecordedOp::Load(stem.clone()));
            if self.fail_on.as_deref() == Some(stem.as_str()) {
                return Err(BackendError::Decode {
                    path: path.to_path_buf(),
                    message: "mock failure".into(),
                });
            }
            Ok(stem)
        }

        fn apply_mask(&self, image: String, mask: String) -> Result<String, BackendError> {
            self.record(RecordedOp::Mask {
                image: image.clone(),
                mask: mask.clone(),
            });
            Ok(format!("{image}&{mask}"))
        }

        fn flatten(&self, base: String, overlays: Vec<String>) -> Result<String, BackendError> {
            self.record(RecordedOp::Flatten {
                layers: overlays.len() + 1,
            });
            let mut stack = vec![base];
            stack.extend(overlays);
            Ok(stack.join(" + "))
        }

        fn encode_png(&self, raster: &String) -> Result<Vec<u8>, BackendError> {
            self.record(RecordedOp::Encode);
            Ok(raster.as_bytes().to_vec())
        }
    }

    #[test]
    fn mock_records_load_and_mask() {
        let backend = MockBackend::new();
        let image = backend.load(Path::new("/c/L2_Pupils_2.png")).unwrap();
        let mask = backend.load(Path::new("/c/L1_Eyes-XOR_1.png")).unwrap();
        let masked = backend.apply_mask(image, mask).unwrap();
        assert_eq!(masked, "L2_Pupils_2&L1_Eyes-XOR_1");

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 3);
        assert!(matches!(&ops[0], RecordedOp::Load(p) if p == "L2_Pupils_2"));
    }

    #[test]
    fn mock_failing_on_stem() {
        let backend = MockBackend::failing_on("bad");
        assert!(backend.load(Path::new("/c/bad.png")).is_err());
        assert!(backend.load(Path::new("/c/good.png")).is_ok());
    }
}
