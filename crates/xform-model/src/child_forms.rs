//! Ordered `data_sets` / `child_forms` collections.

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::form::FormNode;

/// Ordered `(id, node)` pairs keyed by synthetic identifiers.
///
/// The identifiers are integer-like strings that only need to be unique
/// within a document. Nothing should look a node up by its identifier to
/// learn what it is; the node's own `form` label says that.
///
/// Serializes as a JSON object whose member order is the insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildForms {
    entries: Vec<(String, FormNode)>,
}

impl ChildForms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a node under `id`.
    pub fn push(&mut self, id: impl Into<String>, node: FormNode) {
        self.entries.push((id.into(), node));
    }

    pub fn first(&self) -> Option<(&str, &FormNode)> {
        self.entries.first().map(|(id, node)| (id.as_str(), node))
    }

    pub fn get(&self, id: &str) -> Option<&FormNode> {
        self.entries
            .iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, node)| node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormNode)> {
        self.entries.iter().map(|(id, node)| (id.as_str(), node))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &FormNode> {
        self.entries.iter().map(|(_, node)| node)
    }
}

impl Serialize for ChildForms {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, node) in &self.entries {
            map.serialize_entry(id, node)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ChildForms {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ChildFormsVisitor)
    }
}

struct ChildFormsVisitor;

impl<'de> Visitor<'de> for ChildFormsVisitor {
    type Value = ChildForms;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping form ids to form nodes")
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(ChildForms::new())
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(ChildForms::new())
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut forms = ChildForms::new();
        while let Some((id, node)) = access.next_entry::<String, FormNode>()? {
            if forms.get(&id).is_some() {
                return Err(de::Error::custom(format!("duplicate form id `{id}`")));
            }
            forms.push(id, node);
        }
        Ok(forms)
    }
}
