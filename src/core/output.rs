//! Transcript line rendering for the operator.
//!
//! Every line the importer prints goes through here so the per-record format
//! stays fixed.

use colored::Colorize;

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

pub fn banner_line(limit: usize) -> String {
    format!(
        "Importing up to {} nodes with body + images (auto-detect fields)",
        limit
    )
}

pub fn imported_line(
    source_nid: i64,
    new_nid: i64,
    bundle: &str,
    has_body: bool,
    image_count: usize,
    image_field: Option<&str>,
) -> String {
    let dest = image_field
        .map(|f| format!(" (dest: {})", f))
        .unwrap_or_default();
    format!(
        "{} nid {} → new nid {}  bundle={}  body={}  images={}{}",
        "✔".bright_green(),
        source_nid,
        new_nid,
        bundle,
        if has_body { "yes" } else { "no" },
        image_count,
        dest
    )
}

pub fn failed_line(source_nid: i64, message: &str) -> String {
    format!(
        "{} Failed nid {}: {}",
        "✖".bright_red(),
        source_nid,
        compact_line(message, 240)
    )
}

pub fn skipped_line(source_nid: i64, bundle: &str) -> String {
    format!(
        "Skip nid {}: bundle '{}' not found in destination.",
        source_nid, bundle
    )
}

pub fn summary_line(created: usize) -> String {
    format!("Done. Created {} node(s).", created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_line_bounds_and_collapses() {
        assert_eq!(compact_line("a\n  b\tc", 10), "a b c");
        assert_eq!(compact_line("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn imported_line_reports_destination_field_only_when_attached() {
        let with = imported_line(101, 7, "page", true, 1, Some("field_image"));
        assert!(with.contains("nid 101 → new nid 7  bundle=page  body=yes  images=1 (dest: field_image)"));
        let without = imported_line(102, 8, "page", false, 0, None);
        assert!(without.ends_with("body=no  images=0"));
    }

    #[test]
    fn summary_line_format() {
        assert_eq!(summary_line(2), "Done. Created 2 node(s).");
    }
}
