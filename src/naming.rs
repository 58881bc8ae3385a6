//! Centralized filename parsing for the layer variant convention.
//!
//! Every variant image in a collection is named `L<level>_<name>_<number>.png`:
//!
//! - `L0_Background_1.png` → level 0, layer "Background", variant 1
//! - `L3_Eyes-XOR_2.png` → level 3, layer "Eyes-XOR", variant 2
//! - `L12_Hat_10.png` → level 12, layer "Hat", variant 10
//!
//! The layer name may not contain underscores; whitespace around the name is
//! trimmed. Anything that does not follow the pattern is not a variant and
//! parses to `None`, so callers can skip it silently.

/// Result of parsing a variant filename like `L2_Eyes_3.png`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVariantName {
    /// Stacking level (ascending = bottom to top).
    pub level: u32,
    /// Layer (trait) name, possibly carrying a `-XOR` / `-AND` suffix.
    pub name: String,
    /// 1-based variant number.
    pub number: u32,
}

/// Parse a variant filename following the `L<level>_<name>_<number>.png` convention.
///
/// Handles these patterns:
/// - `"L0_Background_1.png"` → level=0, name="Background", number=1
/// - `"L05_Eyes-XOR_02.png"` → level=5, name="Eyes-XOR", number=2
/// - `"L1_ Hat _3.png"` → level=1, name="Hat", number=3
/// - `"L1_Hat_3.jpg"`, `"Hat_3.png"`, `"L1_My_Hat_3.png"`, `"L1__3.png"` → `None`
pub fn parse_variant_name(filename: &str) -> Option<ParsedVariantName> {
    let stem = filename.strip_suffix(".png")?;
    let rest = stem.strip_prefix('L')?;

    let (level, rest) = rest.split_once('_')?;
    let (name, number) = rest.split_once('_')?;
    if name.contains('_') {
        return None;
    }

    let level = parse_digits(level)?;
    let number = parse_digits(number)?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    Some(ParsedVariantName {
        level,
        name: name.to_string(),
        number,
    })
}

/// Build the canonical filename for a variant.
pub fn variant_filename(level: u32, name: &str, number: u32) -> String {
    format!("L{level}_{name}_{number}.png")
}

/// Digits only: no sign, no whitespace inside the group.
fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
