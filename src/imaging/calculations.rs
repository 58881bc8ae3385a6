//! Pure geometry for overlays.
//!
//! All functions here are pure and testable without any I/O or images.

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Top-left offset that centers `inner` inside `outer`.
///
/// Inner boxes larger than the outer box clamp to 0 on that axis.
pub fn centered_offset(outer: (u32, u32), inner: (u32, u32)) -> (u32, u32) {
    (
        outer.0.saturating_sub(inner.0) / 2,
        outer.1.saturating_sub(inner.1) / 2,
    )
}

/// Scale a length by a ratio, rounding to the nearest pixel.
pub fn scaled(length: u32, ratio: f64) -> u32 {
    (f64::from(length) * ratio).round() as u32
}

/// First `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Engraving box: horizontally centered, anchored `bottom_margin` above the bottom edge.
///
/// # Examples
/// ```
/// # use layerstack::imaging::calculations::{engraving_box, Rect};
/// // 1080×1080 canvas, 70% wide, 70 px tall, 40 px margin
/// assert_eq!(
///     engraving_box((1080, 1080), 0.7, 70, 40),
///     Rect { x: 162, y: 970, width: 756, height: 70 }
/// );
/// ```
pub fn engraving_box(
    canvas: (u32, u32),
    width_ratio: f64,
    height: u32,
    bottom_margin: u32,
) -> Rect {
    let (w, h) = canvas;
    let width = scaled(w, width_ratio).min(w);
    let height = height.min(h);
    Rect {
        x: (w - width) / 2,
        y: h.saturating_sub(height + bottom_margin),
        width,
        height,
    }
}

/// QR square: `size_ratio` of the shorter side, centered.
///
/// # Examples
/// ```
/// # use layerstack::imaging::calculations::{qr_placement, Rect};
/// assert_eq!(
///     qr_placement((1080, 1080), 0.3),
///     Rect { x: 378, y: 378, width: 324, height: 324 }
/// );
/// ```
pub fn qr_placement(canvas: (u32, u32), size_ratio: f64) -> Rect {
    let (w, h) = canvas;
    let short = w.min(h);
    let size = scaled(short, size_ratio).clamp(1, short.max(1));
    let (x, y) = centered_offset(canvas, (size, size));
    Rect {
        x,
        y,
        width: size,
        height: size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_offset_basic() {
        assert_eq!(centered_offset((10, 10), (4, 2)), (3, 4));
        assert_eq!(centered_offset((10, 10), (10, 10)), (0, 0));
        assert_eq!(centered_offset((3, 3), (2, 2)), (0, 0));
    }

    #[test]
    fn centered_offset_clamps_oversized_inner() {
        assert_eq!(centered_offset((4, 4), (8, 2)), (0, 1));
    }

    #[test]
    fn truncate_ascii() {
        assert_eq!(truncate_chars("abcdefghijklmnopqrstuvwxyz", 20), "abcdefghijklmnopqrst");
        assert_eq!(truncate_chars("short", 20), "short");
        assert_eq!(truncate_chars("", 20), "");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        let text = "ééééééééééééééééééééé"; // 21 chars, 42 bytes
        let cut = truncate_chars(text, 20);
        assert_eq!(cut.chars().count(), 20);
        assert_eq!(cut.len(), 40);
    }

    #[test]
    fn engraving_box_at_1080() {
        let r = engraving_box((1080, 1080), 0.7, 70, 40);
        assert_eq!(r.width, 756);
        assert_eq!(r.height, 70);
        assert_eq!(r.x, 162);
        assert_eq!(r.y, 1080 - 70 - 40);
    }

    #[test]
    fn engraving_box_non_square() {
        let r = engraving_box((400, 300), 0.7, 70, 40);
        assert_eq!(r, Rect { x: 60, y: 190, width: 280, height: 70 });
    }

    #[test]
    fn engraving_box_clamps_on_tiny_canvas() {
        let r = engraving_box((20, 50), 0.7, 70, 40);
        assert_eq!(r.y, 0);
        assert_eq!(r.height, 50);
        assert_eq!(r.width, 14);
        assert_eq!(r.x, 3);
    }

    #[test]
    fn qr_placement_at_1080() {
        assert_eq!(
            qr_placement((1080, 1080), 0.3),
            Rect { x: 378, y: 378, width: 324, height: 324 }
        );
    }

    #[test]
    fn qr_placement_uses_shorter_side() {
        let r = qr_placement((1000, 500), 0.3);
        assert_eq!(r.width, 150);
        assert_eq!(r.height, 150);
        assert_eq!((r.x, r.y), (425, 175));
    }

    #[test]
    fn qr_placement_never_zero() {
        assert_eq!(qr_placement((1, 1), 0.3).width, 1);
    }
}
