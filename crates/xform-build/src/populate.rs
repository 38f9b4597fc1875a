//! Clone a form prototype and fill its answers from one CSV row.

use xform_ingest::{TableRow, normalize_header};
use xform_model::{ChildForms, FormNode, QuestionEntry};

/// Normalized text of the multi-valued "Associated CERs" question.
pub const ASSOCIATED_CERS: &str = "associated cers";

/// Identity fields written onto a populated clone.
#[derive(Debug, Clone)]
pub struct NodeIdentity<'a> {
    pub key: String,
    pub user: &'a str,
    /// Replacement `form` label; `None` keeps the prototype's.
    pub form: Option<&'a str>,
}

impl<'a> NodeIdentity<'a> {
    pub fn new(key: impl Into<String>, user: &'a str) -> Self {
        Self {
            key: key.into(),
            user,
            form: None,
        }
    }
}

/// Build a new node from `prototype`, answering its questions from `row`.
///
/// Each question is matched by normalized text against the row's normalized
/// headers. `overrides` pairs question text with a value that wins over the
/// row. Unmatched questions come out with both response fields empty. The
/// clone starts with no children and the prototype is left untouched.
pub fn populate_form(
    prototype: &FormNode,
    row: Option<TableRow<'_>>,
    identity: NodeIdentity<'_>,
    overrides: &[(&str, &str)],
) -> FormNode {
    let overrides: Vec<(String, &str)> = overrides
        .iter()
        .map(|(question, value)| (normalize_header(question), *value))
        .collect();

    let mut data = Vec::with_capacity(prototype.data.len());
    for entry in &prototype.data {
        let question = normalize_header(&entry.question);
        let value = overrides
            .iter()
            .find(|(overridden, _)| *overridden == question)
            .map(|(_, value)| *value)
            .or_else(|| row.and_then(|row| row.get_normalized(&question)));

        if question == ASSOCIATED_CERS {
            data.extend(explode_list(entry, value.unwrap_or("")));
            continue;
        }
        let mut filled = entry.blank();
        if let Some(value) = value {
            filled.set_value(value);
        }
        data.push(filled);
    }

    FormNode {
        form: identity
            .form
            .map_or_else(|| prototype.form.clone(), str::to_string),
        key: identity.key,
        level: prototype.level.clone(),
        is_subform: prototype.is_subform.clone(),
        user: identity.user.to_string(),
        data,
        child_forms: ChildForms::new(),
        extra: prototype.extra.clone(),
    }
}

/// One entry per comma/semicolon separated item; a single blank entry when
/// there are none, so the question is still present.
///
/// Items follow the entry's own type like any other value: `answer` for
/// Radio/Checkbox, `text` otherwise. A Text-typed CERs question therefore
/// gets its items in `text` and never carries both fields.
fn explode_list(entry: &QuestionEntry, value: &str) -> Vec<QuestionEntry> {
    let items: Vec<&str> = value
        .split([',', ';'])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect();
    if items.is_empty() {
        return vec![entry.blank()];
    }
    items
        .into_iter()
        .map(|item| {
            let mut filled = entry.blank();
            filled.set_value(item);
            filled
        })
        .collect()
}
