//! Pure label parsing and normalization for the LM Categorizer (C8).

use std::collections::HashSet;

pub const UNCATEGORIZED: &str = "uncategorized";

/// Splits a language model's free-text response into candidate labels,
/// tolerating comma-separated, newline-separated, bulleted (`-`, `*`,
/// `1.`), and quoted formats.
pub fn parse_labels(text: &str) -> Vec<String> {
    text.split(|c: char| c == ',' || c == '\n')
        .map(strip_label_decoration)
        .filter(|s| !s.is_empty())
        .collect()
}

fn strip_label_decoration(raw: &str) -> String {
    let mut s = raw.trim();
    loop {
        let stripped = s
            .trim_start_matches(['-', '*', '•'])
            .trim_start_matches(|c: char| c.is_ascii_digit())
            .trim_start_matches(['.', ')'])
            .trim();
        if stripped == s {
            break;
        }
        s = stripped;
    }
    s.trim_matches(['"', '\'']).trim().to_string()
}

/// Lower-cases, deduplicates (preserving first-seen order), and truncates
/// to `max_categories`.
pub fn normalize_categories(raw: Vec<String>, max_categories: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for label in raw {
        let normalized = label.to_lowercase();
        if normalized.is_empty() || !seen.insert(normalized.clone()) {
            continue;
        }
        out.push(normalized);
        if out.len() >= max_categories {
            break;
        }
    }
    out
}
