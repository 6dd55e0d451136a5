//! Two-level header detection and flattening.
//!
//! Merged group cells such as `支付方式` spanning `微信支付 | 现金 | ...` only
//! carry text in their left-most cell. The parent level is forward-filled
//! left to right and joined with the child as `parent_child`.

use std::sync::LazyLock;

use regex::Regex;

use pos_model::RawCell;

static LABEL_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z\p{Han}_\-\s]+$").expect("valid header label regex")
});

/// Flattened header labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatHeader {
    pub columns: Vec<String>,
    /// 1 for a single header row, 2 when a sub-header row was merged in.
    pub levels: usize,
}

fn is_placeholder(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed.to_lowercase().contains("unnamed")
}

/// Decides whether the row under the header is a second header level.
///
/// The row counts as a header level when its label-like cells outnumber its
/// numeric cells. Blank rows never do.
pub fn is_sub_header(row: &[RawCell]) -> bool {
    let mut label_like = 0usize;
    let mut numeric = 0usize;
    for cell in row.iter().filter(|cell| !cell.is_blank()) {
        if cell.as_number().is_some() {
            numeric += 1;
        } else if let RawCell::Text(text) = cell
            && LABEL_TEXT.is_match(text.trim())
        {
            label_like += 1;
        }
    }
    label_like > numeric
}

/// Strips whitespace from a single-level header.
pub fn flatten_single(row: &[RawCell]) -> Vec<String> {
    row.iter().map(|cell| cell.to_text().trim().to_string()).collect()
}

/// Flattens a parent/child header pair into one label per column.
pub fn flatten_two_level(parent: &[RawCell], child: &[RawCell]) -> Vec<String> {
    let width = parent.len().max(child.len());
    let mut last_parent = String::new();
    (0..width)
        .map(|idx| {
            let parent_text = parent.get(idx).map(RawCell::to_text).unwrap_or_default();
            if !is_placeholder(&parent_text) {
                last_parent = parent_text.trim().to_string();
            }
            let child_text = child.get(idx).map(RawCell::to_text).unwrap_or_default();
            let child_text = child_text.trim();
            match (last_parent.is_empty(), is_placeholder(child_text)) {
                (_, true) => last_parent.clone(),
                (true, false) => child_text.to_string(),
                (false, false) => format!("{last_parent}_{child_text}"),
            }
        })
        .collect()
}

/// Flattens the header, merging `next` in when it is a sub-header row.
pub fn flatten_header(header: &[RawCell], next: Option<&[RawCell]>) -> FlatHeader {
    match next {
        Some(child) if is_sub_header(child) => FlatHeader {
            columns: flatten_two_level(header, child),
            levels: 2,
        },
        _ => FlatHeader {
            columns: flatten_single(header),
            levels: 1,
        },
    }
}
