//! Engraving text box.
//!
//! The box and its text are described as an SVG the size of the image,
//! rasterised with `resvg`, and drawn over the composite. Fonts come from the
//! system font database, loaded once per process. A machine without any
//! monospace font still gets the box; the text simply has no glyphs.

use super::calculations::{Rect, engraving_box, truncate_chars};
use super::overlay::{DecorationError, draw_at};
use super::params::EngravingParams;
use image::{Rgba, RgbaImage};
use std::sync::{Arc, LazyLock};

const FONT_FAMILY: &str =
    "Menlo, Consolas, Monaco, 'Liberation Mono', 'DejaVu Sans Mono', Courier, monospace";

static FONT_DB: LazyLock<Arc<usvg::fontdb::Database>> = LazyLock::new(|| {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    tracing::debug!(faces = db.len(), "loaded system fonts");
    Arc::new(db)
});

/// Draw `text` in a dark rounded box near the bottom of `image`.
///
/// Text is cut to `params.max_chars` characters first; empty text is a no-op.
pub fn engrave(
    image: &mut RgbaImage,
    text: &str,
    params: &EngravingParams,
) -> Result<(), DecorationError> {
    let text = truncate_chars(text, params.max_chars);
    if text.is_empty() {
        return Ok(());
    }
    let (width, height) = image.dimensions();
    let rect = engraving_box(
        (width, height),
        params.box_width_ratio,
        params.box_height,
        params.bottom_margin,
    );
    let svg = engraving_svg((width, height), rect, text, params);
    let overlay = rasterize_svg(&svg, width, height)?;
    draw_at(image, &overlay, 0, 0);
    Ok(())
}

/// SVG document for the box and centered text.
pub(crate) fn engraving_svg(
    canvas: (u32, u32),
    rect: Rect,
    text: &str,
    params: &EngravingParams,
) -> String {
    let (width, height) = canvas;
    let cx = f64::from(width) / 2.0;
    let cy = f64::from(rect.y) + f64::from(rect.height) / 2.0;
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">
  <rect x="{x}" y="{y}" width="{w}" height="{h}" rx="{r}" ry="{r}" fill="black" fill-opacity="{opacity}"/>
  <text x="{cx}" y="{cy}" font-family="{FONT_FAMILY}" font-size="{size}" font-weight="bold" fill="white" text-anchor="middle" dominant-baseline="central">{text}</text>
</svg>"#,
        x = rect.x,
        y = rect.y,
        w = rect.width,
        h = rect.height,
        r = params.corner_radius,
        opacity = params.box_opacity,
        size = params.font_size,
        text = escape_xml(text),
    )
}

/// Escape markup characters and drop those XML 1.0 does not allow.
fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().filter(|c| is_xml_char(*c)) {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Render an SVG string into a straight-alpha RGBA image.
fn rasterize_svg(svg: &str, width: u32, height: u32) -> Result<RgbaImage, DecorationError> {
    let options = usvg::Options {
        fontdb: Arc::clone(&FONT_DB),
        ..usvg::Options::default()
    };
    let tree =
        usvg::Tree::from_str(svg, &options).map_err(|e| DecorationError::Svg(e.to_string()))?;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or(DecorationError::Pixmap { width, height })?;
    resvg::render(&tree, resvg::tiny_skia::Transform::identity(), &mut pixmap.as_mut());

    let mut out = RgbaImage::new(width, height);
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn empty_text_is_pixel_identical() {
        let mut img = white(200, 200);
        let before = img.clone();
        engrave(&mut img, "", &EngravingParams::default()).unwrap();
        assert_eq!(img, before);
    }

    #[test]
    fn zero_char_cap_is_noop() {
        let mut img = white(200, 200);
        let before = img.clone();
        let params = EngravingParams {
            max_chars: 0,
            ..EngravingParams::default()
        };
        engrave(&mut img, "hello", &params).unwrap();
        assert_eq!(img, before);
    }

    #[test]
    fn box_darkens_inside_and_leaves_outside() {
        let mut img = white(200, 200);
        engrave(&mut img, "A", &EngravingParams::default()).unwrap();

        // Box spans x 30..170, y 90..160. Sample near its left edge, away
        // from the rounded corner and the centered glyph.
        let inside = img.get_pixel(40, 125);
        assert!(inside.0[0] < 200, "box not drawn: {inside:?}");
        assert_eq!(inside.0[3], 255);

        assert_eq!(*img.get_pixel(10, 125), Rgba([255, 255, 255, 255]));
        assert_eq!(*img.get_pixel(100, 50), Rgba([255, 255, 255, 255]));
        assert_eq!(*img.get_pixel(100, 190), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn long_text_is_truncated_in_svg() {
        let params = EngravingParams::default();
        let text = truncate_chars("ABCDEFGHIJKLMNOPQRSTUVWXYZ", params.max_chars);
        let rect = engraving_box((1080, 1080), 0.7, 70, 40);
        let svg = engraving_svg((1080, 1080), rect, text, &params);
        assert!(svg.contains(">ABCDEFGHIJKLMNOPQRST</text>"));
        assert!(!svg.contains("STU"));
    }

    #[test]
    fn text_is_escaped() {
        let rect = engraving_box((100, 100), 0.7, 70, 40);
        let svg = engraving_svg((100, 100), rect, "<b>&'\"", &EngravingParams::default());
        assert!(svg.contains("&lt;b&gt;&amp;&apos;&quot;"));
    }

    #[test]
    fn control_characters_are_dropped() {
        assert_eq!(escape_xml("Hi\u{1}there\u{0}\u{1F}\u{FFFE}!"), "Hithere!");
        assert_eq!(escape_xml("tab\there"), "tab\there");
    }

    #[test]
    fn text_with_control_characters_still_renders() {
        let mut img = white(200, 200);
        engrave(&mut img, "Hi\u{1}there", &EngravingParams::default()).unwrap();
        assert!(img.get_pixel(40, 125).0[0] < 200);
    }

    #[test]
    fn hostile_text_still_renders() {
        let mut img = white(120, 120);
        engrave(&mut img, "</text><evil/>", &EngravingParams::default()).unwrap();
    }
}
