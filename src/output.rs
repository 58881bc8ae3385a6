//! CLI output formatting.
//!
//! Output is **layer-centric**: every line leads with the positional index
//! and the layer name, with roles, counts and files as secondary detail.
//!
//! # Output Format
//!
//! ## Groups
//!
//! ```text
//! default_collection (8 combinations)
//! 001 Background (2 variants)
//! 002 Eyes-XOR (2 variants) mask, companion Eyes-AND
//! 003 Pupils (2 variants)
//! 004 Eyes-AND (2 variants) drawn with Eyes-XOR
//! ```
//!
//! ## Plan
//!
//! ```text
//! 001 Background: 2 (L0_Background_2.png)
//! 002 Eyes-XOR: 1 (L1_Eyes-XOR_1.png)
//! 003 Pupils: 2 (L2_Pupils_2.png)
//! ```
//!
//! ## Warm
//!
//! ```text
//! Loaded 2 collections
//!     default_collection
//!     night
//! Skipped 1 collection
//!     broken: Collection not found: broken
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout.

use crate::catalog::WarmReport;
use crate::select::CompositePlan;
use crate::types::{Catalog, Group, LayerRole, MASK_SUFFIX};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn role_detail(catalog: &Catalog, role: &LayerRole) -> Option<String> {
    match role {
        LayerRole::Plain => None,
        LayerRole::Mask { companion: None } => Some("mask".to_string()),
        LayerRole::Mask {
            companion: Some(idx),
        } => Some(format!("mask, companion {}", catalog.layers[*idx].name)),
        LayerRole::Conditional { root } => Some(format!("drawn with {root}{MASK_SUFFIX}")),
    }
}

pub fn format_groups(catalog: &Catalog) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({} combinations)",
        catalog.collection,
        catalog.max_combinations()
    )];
    for (i, layer) in catalog.layers.iter().enumerate() {
        let header = format!(
            "{} {} ({})",
            format_index(i + 1),
            layer.name,
            plural(layer.variant_count(), "variant")
        );
        lines.push(match role_detail(catalog, &layer.role) {
            Some(detail) => format!("{header} {detail}"),
            None => header,
        });
    }
    lines
}

pub fn print_groups(catalog: &Catalog) {
    for line in format_groups(catalog) {
        println!("{}", line);
    }
}

/// JSON body listing each layer's name and variant count.
pub fn groups_json(groups: &[Group]) -> serde_json::Value {
    serde_json::json!({
        "status": "success",
        "groups": groups,
    })
}

pub fn format_plan(catalog: &Catalog, plan: &CompositePlan) -> Vec<String> {
    plan.entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let layer = &catalog.layers[entry.layer];
            let file = entry
                .path
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_default();
            format!(
                "{} {}: {} ({})",
                format_index(i + 1),
                layer.name,
                entry.variant + 1,
                file
            )
        })
        .collect()
}

pub fn print_plan(catalog: &Catalog, plan: &CompositePlan) {
    for line in format_plan(catalog, plan) {
        println!("{}", line);
    }
}

pub fn format_warm_report(report: &WarmReport) -> Vec<String> {
    let mut lines = vec![format!("Loaded {}", plural(report.loaded.len(), "collection"))];
    for name in &report.loaded {
        lines.push(format!("{}{}", indent(1), name));
    }
    if !report.failed.is_empty() {
        lines.push(format!("Skipped {}", plural(report.failed.len(), "collection")));
        for (name, error) in &report.failed {
            lines.push(format!("{}{}: {}", indent(1), name, error));
        }
    }
    lines
}

pub fn print_warm_report(report: &WarmReport) {
    for line in format_warm_report(report) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::{ExplicitSelection, Selection, resolve_plan};
    use crate::test_helpers::*;

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn groups_show_roles_and_combinations() {
        let catalog = eyes_catalog();
        assert_eq!(
            format_groups(&catalog),
            vec![
                "c (8 combinations)",
                "001 Background (2 variants)",
                "002 Eyes-XOR (2 variants) mask, companion Eyes-AND",
                "003 Pupils (2 variants)",
                "004 Eyes-AND (2 variants) drawn with Eyes-XOR",
            ]
        );
    }

    #[test]
    fn groups_singular_variant() {
        let catalog = catalog_with_counts(&[("Hat", 1), ("Mouth-XOR", 1)]);
        let lines = format_groups(&catalog);
        assert_eq!(lines[1], "001 Hat (1 variant)");
        assert_eq!(lines[2], "002 Mouth-XOR (1 variant) mask");
    }

    #[test]
    fn groups_json_shape() {
        let json = groups_json(&eyes_catalog().groups());
        assert_eq!(json["status"], "success");
        assert_eq!(json["groups"][1]["name"], "Eyes-XOR");
        assert_eq!(json["groups"][1]["count"], 2);
        assert_eq!(json["groups"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn plan_lines_use_one_based_variants() {
        let catalog = eyes_catalog();
        let selection = Selection::Explicit(ExplicitSelection::new().with("Pupils", 1));
        let plan = resolve_plan(&catalog, &selection, None);
        assert_eq!(
            format_plan(&catalog, &plan),
            vec![
                "001 Background: 1 (L0_Background_1.png)",
                "002 Eyes-XOR: 1 (L1_Eyes-XOR_1.png)",
                "003 Pupils: 2 (L2_Pupils_2.png)",
            ]
        );
    }

    #[test]
    fn warm_report_lists_failures() {
        let report = WarmReport {
            loaded: vec!["main".into()],
            failed: vec![("broken".into(), "Collection not found: broken".into())],
        };
        assert_eq!(
            format_warm_report(&report),
            vec![
                "Loaded 1 collection",
                "    main",
                "Skipped 1 collection",
                "    broken: Collection not found: broken",
            ]
        );
    }

    #[test]
    fn warm_report_without_failures_has_no_skip_section() {
        let report = WarmReport {
            loaded: vec!["a".into(), "b".into()],
            failed: vec![],
        };
        assert_eq!(format_warm_report(&report), vec!["Loaded 2 collections", "    a", "    b"]);
    }
}
