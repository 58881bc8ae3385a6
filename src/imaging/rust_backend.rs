//! Pure Rust raster backend on top of the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode PNG | `image::ImageReader`, normalized with `to_rgba8` |
//! | Alpha mask | per-pixel join: RGB from the image, A from the mask |
//! | Flatten | straight-alpha source-over, smaller overlays centered |
//! | Encode | `image::codecs::png::PngEncoder` |

use super::backend::{BackendError, Dimensions, RasterBackend};
use super::calculations::centered_offset;
use super::overlay::draw_at;
use image::codecs::png::PngEncoder;
use image::{ImageEncoder, ImageReader, RgbaImage};
use std::path::Path;

/// Backend using the `image` crate with [`RgbaImage`] rasters.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn dimensions(image: &RgbaImage) -> Dimensions {
    Dimensions {
        width: image.width(),
        height: image.height(),
    }
}

/// Decode a PNG from memory into RGBA.
pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage, BackendError> {
    image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map(|img| img.to_rgba8())
        .map_err(|e| BackendError::Decode {
            path: "<memory>".into(),
            message: e.to_string(),
        })
}

/// Encode RGBA pixels as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, BackendError> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| BackendError::Encode(e.to_string()))?;
    Ok(out)
}

impl RasterBackend for RustBackend {
    type Raster = RgbaImage;

    fn load(&self, path: &Path) -> Result<RgbaImage, BackendError> {
        let reader = ImageReader::open(path).map_err(|source| BackendError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded = reader.decode().map_err(|e| BackendError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(decoded.to_rgba8())
    }

    fn apply_mask(&self, image: RgbaImage, mask: RgbaImage) -> Result<RgbaImage, BackendError> {
        if image.dimensions() != mask.dimensions() {
            return Err(BackendError::DimensionMismatch {
                what: "mask",
                actual: dimensions(&mask),
                expected: dimensions(&image),
            });
        }
        let mut masked = image;
        for (pixel, mask_pixel) in masked.pixels_mut().zip(mask.pixels()) {
            pixel.0[3] = mask_pixel.0[3];
        }
        Ok(masked)
    }

    fn flatten(
        &self,
        base: RgbaImage,
        overlays: Vec<RgbaImage>,
    ) -> Result<RgbaImage, BackendError> {
        let mut canvas = base;
        for overlay in &overlays {
            if overlay.width() > canvas.width() || overlay.height() > canvas.height() {
                return Err(BackendError::DimensionMismatch {
                    what: "overlay",
                    actual: dimensions(overlay),
                    expected: dimensions(&canvas),
                });
            }
            let (x, y) = centered_offset(canvas.dimensions(), overlay.dimensions());
            draw_at(&mut canvas, overlay, x, y);
        }
        Ok(canvas)
    }

    fn encode_png(&self, raster: &RgbaImage) -> Result<Vec<u8>, BackendError> {
        encode_png(raster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use image::Rgba;

    #[test]
    fn load_normalizes_rgb_to_rgba() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("rgb.png");
        image::RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let img = RustBackend::new().load(&path).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(*img.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn load_nonexistent_file_errors() {
        let err = RustBackend::new()
            .load(Path::new("/nonexistent/L0_x_1.png"))
            .unwrap_err();
        assert!(matches!(err, BackendError::Io { .. }));
    }

    #[test]
    fn load_corrupt_file_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("bad.png");
        std::fs::write(&path, b"not a png").unwrap();
        let err = RustBackend::new().load(&path).unwrap_err();
        assert!(matches!(err, BackendError::Decode { .. }));
    }

    #[test]
    fn mask_keeps_color_and_takes_mask_alpha() {
        let image = RgbaImage::from_fn(4, 4, |x, y| Rgba([x as u8 * 10, y as u8 * 10, 200, 255]));
        let mask = RgbaImage::from_fn(4, 4, |x, _| Rgba([0, 0, 0, if x < 2 { 255 } else { 0 }]));

        let masked = RustBackend::new().apply_mask(image.clone(), mask).unwrap();
        for (x, y, px) in masked.enumerate_pixels() {
            let src = image.get_pixel(x, y);
            assert_eq!(&px.0[..3], &src.0[..3]);
            assert_eq!(px.0[3], if x < 2 { 255 } else { 0 });
        }
    }

    #[test]
    fn mask_size_mismatch_errors() {
        let err = RustBackend::new()
            .apply_mask(RgbaImage::new(4, 4), RgbaImage::new(2, 2))
            .unwrap_err();
        assert!(matches!(err, BackendError::DimensionMismatch { what: "mask", .. }));
    }

    #[test]
    fn flatten_draws_later_overlays_on_top() {
        let base = solid(4, 4, RED);
        let half = RgbaImage::from_fn(4, 4, |x, _| if x < 2 { BLUE } else { CLEAR });
        let top = RgbaImage::from_fn(4, 4, |_, y| if y < 1 { GREEN } else { CLEAR });

        let out = RustBackend::new().flatten(base, vec![half, top]).unwrap();
        assert_eq!(*out.get_pixel(0, 0), GREEN);
        assert_eq!(*out.get_pixel(0, 3), BLUE);
        assert_eq!(*out.get_pixel(3, 3), RED);
    }

    #[test]
    fn flatten_keeps_opaque_base_opaque_for_every_partial_alpha() {
        let backend = RustBackend::new();
        for a in 1..=254u8 {
            let out = backend
                .flatten(solid(1, 1, WHITE), vec![solid(1, 1, Rgba([0, 0, 255, a]))])
                .unwrap();
            assert_eq!(out.get_pixel(0, 0).0[3], 255, "overlay alpha {a}");
        }
    }

    #[test]
    fn flatten_centers_smaller_overlay() {
        let out = RustBackend::new()
            .flatten(solid(4, 4, RED), vec![solid(2, 2, BLUE)])
            .unwrap();
        assert_eq!(*out.get_pixel(0, 0), RED);
        assert_eq!(*out.get_pixel(1, 1), BLUE);
        assert_eq!(*out.get_pixel(2, 2), BLUE);
        assert_eq!(*out.get_pixel(3, 3), RED);
    }

    #[test]
    fn flatten_rejects_larger_overlay() {
        let err = RustBackend::new()
            .flatten(solid(2, 2, RED), vec![solid(3, 3, BLUE)])
            .unwrap_err();
        assert!(matches!(err, BackendError::DimensionMismatch { what: "overlay", .. }));
    }

    #[test]
    fn encode_then_decode_preserves_pixels() {
        let img = RgbaImage::from_fn(5, 3, |x, y| Rgba([x as u8, y as u8, 7, 128]));
        let bytes = RustBackend::new().encode_png(&img).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(decode_png(&bytes).unwrap(), img);
    }
}
