//! Form nodes and their question/answer entries.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::child_forms::ChildForms;
use crate::lenient;

/// One instance of one form type (Extraction, SPD, Safety, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormNode {
    /// Human-readable form type name; prototypes are found by this label.
    #[serde(default, deserialize_with = "lenient::string")]
    pub form: String,
    /// Instance label. Conventionally unique among siblings, not required.
    #[serde(default, deserialize_with = "lenient::string")]
    pub key: String,
    /// Structural metadata, copied verbatim and never computed.
    /// `Some(Value::Null)` is a member written as `null`; `None` is absent.
    #[serde(
        default,
        deserialize_with = "lenient::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub level: Option<Value>,
    #[serde(
        default,
        deserialize_with = "lenient::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_subform: Option<Value>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub user: String,
    #[serde(default)]
    pub data: Vec<QuestionEntry>,
    #[serde(default)]
    pub child_forms: ChildForms,
    /// Members this model does not interpret; carried through unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FormNode {
    pub fn question_count(&self) -> usize {
        self.data.len()
    }

    /// Walk this node and every descendant, depth first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a FormNode)) {
        visit(self);
        for child in self.child_forms.nodes() {
            child.walk(visit);
        }
    }
}

/// A question and its response slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionEntry {
    #[serde(default, deserialize_with = "lenient::string")]
    pub question: String,
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
    #[serde(default, deserialize_with = "lenient_response")]
    pub response: Response,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QuestionEntry {
    /// Copy of this entry with both response fields emptied.
    pub fn blank(&self) -> Self {
        let mut entry = self.clone();
        entry.response.clear();
        entry
    }

    /// Store `value` in the response field the question type reads from and
    /// empty the other one.
    pub fn set_value(&mut self, value: &str) {
        self.response.clear();
        if self.question_type.uses_answer() {
            self.response.answer = value.to_string();
        } else {
            self.response.text = value.to_string();
        }
    }

    /// The value held by the field this question's type treats as active.
    pub fn value(&self) -> &str {
        if self.question_type.uses_answer() {
            &self.response.answer
        } else {
            &self.response.text
        }
    }
}

/// Response slot. Only one field is meaningful for a given question type;
/// the other stays present and empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, deserialize_with = "lenient::string")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub answer: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Response {
    pub fn clear(&mut self) {
        self.text.clear();
        self.answer.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.answer.is_empty()
    }
}

fn lenient_response<'de, D>(deserializer: D) -> Result<Response, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => {
            serde_json::from_value(value).map_err(serde::de::Error::custom)
        }
        _ => Ok(Response::default()),
    }
}

/// Answer type declared by a template question.
///
/// Labels outside the known set are kept verbatim so they round-trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum QuestionType {
    #[default]
    Text,
    Radio,
    Checkbox,
    Other(String),
}

impl QuestionType {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "text" => Self::Text,
            "radio" => Self::Radio,
            "checkbox" => Self::Checkbox,
            _ => Self::Other(label.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "Text",
            Self::Radio => "Radio",
            Self::Checkbox => "Checkbox",
            Self::Other(label) => label,
        }
    }

    /// Radio and Checkbox questions answer through `response.answer`;
    /// everything else writes `response.text`.
    pub fn uses_answer(&self) -> bool {
        matches!(self, Self::Radio | Self::Checkbox)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for QuestionType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for QuestionType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = lenient::string(deserializer)?;
        if label.is_empty() {
            return Ok(Self::Text);
        }
        Ok(Self::parse(&label))
    }
}
