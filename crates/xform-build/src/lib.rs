//! Builds populated extraction records from a template and CSV rows.
//!
//! The template is indexed once ([`TemplateIndex`]); each form prototype is
//! then cloned per CSV row ([`populate_form`]) and the clones are nested into
//! one [`Record`](xform_model::Record) per `refid` ([`assemble`]). Every
//! cloned node gets a fresh identifier from an [`IdFactory`] seeded above the
//! largest integer-like key in the template.

pub mod assemble;
pub mod error;
pub mod ids;
pub mod index;
pub mod populate;

pub use assemble::{BuildOutput, BuildStats, SourceTables, assemble};
pub use error::{BuildError, Result};
pub use ids::{IdFactory, max_numeric_key};
pub use index::{PrototypeSummary, TemplateIndex};
pub use populate::{NodeIdentity, populate_form};
