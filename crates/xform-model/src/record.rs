//! Top-level records (the template envelope and every output record).

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::child_forms::ChildForms;
use crate::form::FormNode;
use crate::lenient;

/// One article's extraction record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refid: Option<RefId>,
    #[serde(default = "empty_array")]
    pub tags: Value,
    #[serde(default = "empty_array")]
    pub attachments: Value,
    #[serde(default = "empty_string")]
    pub biblio_string: Value,
    #[serde(default)]
    pub data_sets: ChildForms,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Copy of the envelope (`tags`, `attachments`, `biblio_string` and any
    /// unrecognised members) with no `refid` and no data sets.
    pub fn envelope(&self) -> Self {
        Self {
            refid: None,
            tags: self.tags.clone(),
            attachments: self.attachments.clone(),
            biblio_string: self.biblio_string.clone(),
            data_sets: ChildForms::new(),
            extra: self.extra.clone(),
        }
    }

    /// Every form node in the record, depth first.
    pub fn forms(&self) -> Vec<&FormNode> {
        let mut forms = Vec::new();
        for node in self.data_sets.nodes() {
            node.walk(&mut |form| forms.push(form));
        }
        forms
    }
}

fn empty_array() -> Value {
    Value::Array(Vec::new())
}

fn empty_string() -> Value {
    Value::String(String::new())
}

/// Article identifier. All-digit ids are written as JSON numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RefId {
    Number(u64),
    Text(String),
}

impl RefId {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(number) = trimmed.parse::<u64>() {
                return Self::Number(number);
            }
        }
        Self::Text(trimmed.to_string())
    }
}

impl fmt::Display for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl Serialize for RefId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Number(number) => serializer.serialize_u64(*number),
            Self::Text(text) => serializer.serialize_str(text),
        }
    }
}

impl<'de> Deserialize<'de> for RefId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Number(number) => match number.as_u64() {
                Some(value) => Ok(Self::Number(value)),
                None => Ok(Self::Text(number.to_string())),
            },
            other => Ok(Self::Text(lenient::value_to_text(other))),
        }
    }
}
