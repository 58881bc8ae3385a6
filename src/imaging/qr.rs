//! QR code rendering and the centered QR stamp.
//!
//! Modules are black on a transparent background with a one-module quiet
//! zone. Scaling is nearest-neighbour only, so module edges stay crisp at
//! any size.

use super::calculations::qr_placement;
use super::overlay::{DecorationError, draw_at, fade};
use super::params::QrParams;
use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use qrcode::{Color, QrCode};

/// Quiet zone around the code, in modules.
const MARGIN_MODULES: u32 = 1;

const DARK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const LIGHT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Render `payload` with `module_px` pixels per module.
pub fn render_qr(payload: &str, module_px: u32) -> Result<RgbaImage, DecorationError> {
    let code = QrCode::new(payload.as_bytes())?;
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let module_px = module_px.max(1);
    let side = (modules + 2 * MARGIN_MODULES) * module_px;

    Ok(RgbaImage::from_fn(side, side, |x, y| {
        let mx = (x / module_px).checked_sub(MARGIN_MODULES);
        let my = (y / module_px).checked_sub(MARGIN_MODULES);
        match (mx, my) {
            (Some(mx), Some(my)) if mx < modules && my < modules => {
                if colors[(my * modules + mx) as usize] == Color::Dark {
                    DARK
                } else {
                    LIGHT
                }
            }
            _ => LIGHT,
        }
    }))
}

/// Stamp a QR code for `payload` over the center of `image`.
///
/// Empty payloads leave the image untouched. Generation failures propagate.
pub fn stamp_qr(
    image: &mut RgbaImage,
    payload: &str,
    params: &QrParams,
) -> Result<(), DecorationError> {
    if payload.is_empty() {
        return Ok(());
    }
    let code = render_qr(payload, 1)?;
    let rect = qr_placement(image.dimensions(), params.size_ratio);
    let mut scaled = image::imageops::resize(&code, rect.width, rect.height, FilterType::Nearest);
    fade(&mut scaled, params.opacity);
    draw_at(image, &scaled, rect.x, rect.y);
    Ok(())
}
