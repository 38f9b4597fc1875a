//! Template indexing: locate each form prototype once, by its `form` label.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use xform_ingest::normalize_header;
use xform_model::{ChildForms, FormKind, FormNode, Record};

use crate::error::{BuildError, Result};
use crate::ids::{IdFactory, max_numeric_key};

/// Prototypes discovered in a template, resolved once per build.
///
/// Stored prototypes have empty `child_forms`: clones never inherit the
/// template's nested instances.
#[derive(Debug, Clone)]
pub struct TemplateIndex {
    envelope: Record,
    extraction: FormNode,
    spd: FormNode,
    optional: BTreeMap<FormKind, FormNode>,
    max_key: Option<u64>,
}

/// One row of the prototype table shown by `inspect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrototypeSummary {
    pub kind: FormKind,
    pub form: Option<String>,
    pub questions: usize,
}

impl TemplateIndex {
    /// Validate the template document and locate its prototypes.
    ///
    /// Accepts a record object or an array whose first element is one.
    pub fn from_value(template: &Value) -> Result<Self> {
        let root = template_root(template)?;
        match root.get("data_sets") {
            Some(Value::Object(sets)) if !sets.is_empty() => {}
            Some(Value::Object(_)) => return Err(format_error("`data_sets` is empty")),
            _ => return Err(format_error("missing `data_sets` mapping")),
        }
        let record: Record = serde_json::from_value(root.clone())
            .map_err(|error| format_error(&format!("unreadable record: {error}")))?;

        let extraction = find_form(&record.data_sets, FormKind::Extraction).ok_or(
            BuildError::TemplateStructure {
                form: FormKind::Extraction,
            },
        )?;
        let spd = find_form(&extraction.child_forms, FormKind::Spd).ok_or(
            BuildError::TemplateStructure {
                form: FormKind::Spd,
            },
        )?;

        // Safety, Performance and Follow-up sit under SPD in current templates
        // and directly under Extraction in older ones.
        let under_spd_or_extraction = |kind: FormKind| {
            find_form(&spd.child_forms, kind).or_else(|| find_form(&extraction.child_forms, kind))
        };
        let mut optional = BTreeMap::new();
        let safety = under_spd_or_extraction(FormKind::Safety);
        for kind in [FormKind::Safety, FormKind::Performance, FormKind::FollowUp] {
            if let Some(node) = under_spd_or_extraction(kind) {
                optional.insert(kind, without_children(node));
            }
        }
        if let Some(harms) = safety.and_then(|s| find_form(&s.child_forms, FormKind::Harms)) {
            optional.insert(FormKind::Harms, without_children(harms));
        }

        let index = Self {
            envelope: record.envelope(),
            extraction: without_children(extraction),
            spd: without_children(spd),
            optional,
            max_key: max_numeric_key(root),
        };
        for summary in index.summary() {
            debug!(
                kind = ?summary.kind,
                form = summary.form.as_deref().unwrap_or("-"),
                questions = summary.questions,
                "template prototype"
            );
        }
        Ok(index)
    }

    /// Top-level fields shared by every output record.
    pub fn envelope(&self) -> &Record {
        &self.envelope
    }

    pub fn extraction(&self) -> &FormNode {
        &self.extraction
    }

    pub fn spd(&self) -> &FormNode {
        &self.spd
    }

    pub fn prototype(&self, kind: FormKind) -> Option<&FormNode> {
        match kind {
            FormKind::Extraction => Some(&self.extraction),
            FormKind::Spd => Some(&self.spd),
            other => self.optional.get(&other),
        }
    }

    /// Largest integer-like key found anywhere in the template.
    pub fn max_key(&self) -> Option<u64> {
        self.max_key
    }

    /// Identifier source that cannot collide with template keys.
    pub fn id_factory(&self) -> IdFactory {
        IdFactory::starting_after(self.max_key.unwrap_or(IdFactory::DEFAULT_SEED))
    }

    pub fn summary(&self) -> Vec<PrototypeSummary> {
        FormKind::ALL
            .into_iter()
            .map(|kind| {
                let node = self.prototype(kind);
                PrototypeSummary {
                    kind,
                    form: node.map(|n| n.form.clone()),
                    questions: node.map_or(0, FormNode::question_count),
                }
            })
            .collect()
    }
}

fn template_root(template: &Value) -> Result<&Value> {
    match template {
        Value::Object(_) => Ok(template),
        Value::Array(items) => {
            let first = items
                .first()
                .ok_or_else(|| format_error("template array is empty"))?;
            if !first.is_object() {
                return Err(format_error("first template element is not an object"));
            }
            if items.len() > 1 {
                warn!(
                    records = items.len(),
                    "template holds several records; only the first is used"
                );
            }
            Ok(first)
        }
        _ => Err(format_error("template must be an object or an array of objects")),
    }
}

fn format_error(reason: &str) -> BuildError {
    BuildError::TemplateFormat {
        reason: reason.to_string(),
    }
}

/// First node in `forms` whose normalized label names `kind`.
fn find_form(forms: &ChildForms, kind: FormKind) -> Option<&FormNode> {
    forms
        .nodes()
        .find(|node| kind.matches(&normalize_header(&node.form)))
}

fn without_children(node: &FormNode) -> FormNode {
    FormNode {
        child_forms: ChildForms::new(),
        ..node.clone()
    }
}
