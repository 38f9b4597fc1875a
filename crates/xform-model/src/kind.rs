//! Form types recognised in a template, keyed by their normalized labels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Typed variant for each template form the builder knows how to populate.
///
/// A prototype is recognised when its normalized `form` label contains every
/// term from [`FormKind::required_terms`]. The match runs once while indexing
/// the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FormKind {
    Extraction,
    Spd,
    Safety,
    Performance,
    Harms,
    FollowUp,
}

impl FormKind {
    pub const ALL: [FormKind; 6] = [
        FormKind::Extraction,
        FormKind::Spd,
        FormKind::Safety,
        FormKind::Performance,
        FormKind::Harms,
        FormKind::FollowUp,
    ];

    /// Lowercase terms that must all appear in a normalized `form` label.
    pub fn required_terms(self) -> &'static [&'static str] {
        match self {
            FormKind::Extraction => &["extraction"],
            FormKind::Spd => &["study", "demographics"],
            FormKind::Safety => &["safety"],
            FormKind::Performance => &["performance", "discrete"],
            FormKind::Harms => &["harms"],
            FormKind::FollowUp => &["follow"],
        }
    }

    /// Whether `normalized_label` names this kind of form.
    pub fn matches(self, normalized_label: &str) -> bool {
        self.required_terms()
            .iter()
            .all(|term| normalized_label.contains(term))
    }

    /// Conventional label used in messages and for synthesized nodes.
    pub fn label(self) -> &'static str {
        match self {
            FormKind::Extraction => "Extraction",
            FormKind::Spd => "Study Parameters and Demographics",
            FormKind::Safety => "Safety",
            FormKind::Performance => "Performance (discrete)",
            FormKind::Harms => "Harms",
            FormKind::FollowUp => "Follow-up Subform",
        }
    }

    /// Extraction and SPD must exist for any build to proceed.
    pub fn is_required(self) -> bool {
        matches!(self, FormKind::Extraction | FormKind::Spd)
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
