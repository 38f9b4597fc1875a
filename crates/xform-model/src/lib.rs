//! Data model for extraction templates and the records built from them.
//!
//! A template is a single [`Record`] whose `data_sets` hold one Extraction
//! [`FormNode`]; every nested form hangs off its parent's `child_forms`.
//! Output records share the same shape, so one set of types describes both.

pub mod child_forms;
pub mod form;
pub mod kind;
mod lenient;
pub mod options;
pub mod record;

pub use child_forms::ChildForms;
pub use form::{FormNode, QuestionEntry, QuestionType, Response};
pub use kind::FormKind;
pub use options::{BuildOptions, FollowUpFallback};
pub use record::{Record, RefId};
