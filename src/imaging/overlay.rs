//! Shared pieces of the overlay decorators.

use image::{Rgba, RgbaImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecorationError {
    #[error("QR code generation failed: {0}")]
    Qr(#[from] qrcode::types::QrError),
    #[error("Engraving overlay could not be parsed: {0}")]
    Svg(String),
    #[error("Cannot allocate a {width}x{height} overlay")]
    Pixmap { width: u32, height: u32 },
}

/// Multiply every pixel's alpha by `opacity` (clamped to 0..=1).
pub fn fade(image: &mut RgbaImage, opacity: f64) {
    let opacity = opacity.clamp(0.0, 1.0);
    for pixel in image.pixels_mut() {
        pixel.0[3] = (f64::from(pixel.0[3]) * opacity).round() as u8;
    }
}

/// Source-over `top` onto `canvas` at `(x, y)`, clipped to the canvas.
pub fn draw_at(canvas: &mut RgbaImage, top: &RgbaImage, x: u32, y: u32) {
    let width = top.width().min(canvas.width().saturating_sub(x));
    let height = top.height().min(canvas.height().saturating_sub(y));
    for ty in 0..height {
        for tx in 0..width {
            let src = *top.get_pixel(tx, ty);
            blend_over(canvas.get_pixel_mut(x + tx, y + ty), src);
        }
    }
}

/// Straight-alpha source-over of `src` onto `dst`.
///
/// Integer math scaled by 255 so an opaque destination stays exactly opaque.
pub fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let sa = u32::from(src.0[3]);
    if sa == 0 {
        return;
    }
    if sa == 255 {
        *dst = src;
        return;
    }
    let da = u32::from(dst.0[3]);
    let dst_weight = da * (255 - sa);
    // out_a * 255
    let out_a = sa * 255 + dst_weight;
    if out_a == 0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    for c in 0..3 {
        let num = u32::from(src.0[c]) * sa * 255 + u32::from(dst.0[c]) * dst_weight;
        dst.0[c] = ((num + out_a / 2) / out_a) as u8;
    }
    dst.0[3] = ((out_a + 127) / 255) as u8;
}
