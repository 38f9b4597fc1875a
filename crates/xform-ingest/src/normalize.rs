//! Canonical text form for matching question text against CSV headers.

use std::collections::HashMap;

/// Punctuation kept by [`normalize_header`]; everything else is dropped.
const KEPT_PUNCTUATION: &[char] = &['%', '(', ')', '/', '?', '-', '.'];

/// Normalize free text for tolerant question/column matching.
///
/// Lowercases, drops punctuation outside `% ( ) / ? - .` (straight and curly
/// quotes alike), treats underscores as spaces and collapses whitespace runs
/// to single spaces. Pure and total.
pub fn normalize_header(value: &str) -> String {
    let mut kept = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '_' {
            kept.push(' ');
        } else if c.is_alphanumeric() || c.is_whitespace() || KEPT_PUNCTUATION.contains(&c) {
            kept.extend(c.to_lowercase());
        }
    }
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized header name to column position.
///
/// When two headers normalize identically the first (leftmost) one wins and
/// later duplicates are ignored, so every lookup for that text reads the
/// leftmost column. Duplicates are logged at debug level.
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn new(headers: &[String]) -> Self {
        let mut positions = HashMap::with_capacity(headers.len());
        for (position, header) in headers.iter().enumerate() {
            let normalized = normalize_header(header);
            if positions.contains_key(&normalized) {
                tracing::debug!(header = %header, "header shadowed by an earlier column");
                continue;
            }
            positions.insert(normalized, position);
        }
        Self { positions }
    }

    /// Position of the column whose normalized header equals `normalized`.
    pub fn position(&self, normalized: &str) -> Option<usize> {
        self.positions.get(normalized).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
