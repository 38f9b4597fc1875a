//! Error types for record building.

use thiserror::Error;
use xform_ingest::IngestError;
use xform_model::FormKind;

/// Errors that abort a build. No partial output is produced.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Template is not an object (or array holding one) with `data_sets`.
    #[error("template format error: {reason}")]
    TemplateFormat { reason: String },

    /// A required prototype could not be located by its form label.
    #[error(
        "template structure error: no {form} form found (form label containing '{}')",
        .form.required_terms().join("' and '")
    )]
    TemplateStructure { form: FormKind },

    /// Rows need a form the template does not define.
    #[error("{source_name} has rows for the {form} form, but the template has no such form")]
    MissingPrototype { form: FormKind, source_name: String },

    /// The template already uses the largest representable key.
    #[error("no identifiers left after {last}; template keys leave no room for new nodes")]
    IdsExhausted { last: u64 },

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

pub type Result<T> = std::result::Result<T, BuildError>;
