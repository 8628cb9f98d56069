//! Content instances.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Identifier of a content instance, unique within its base type.
pub type InstanceId = u64;

/// Stored link for a relation: a single id or a list of ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Link {
    /// Single-valued relation.
    One(InstanceId),
    /// Multi-valued relation.
    Many(Vec<InstanceId>),
}

impl Link {
    /// The linked ids, in stored order.
    pub fn ids(&self) -> Vec<InstanceId> {
        match self {
            Link::One(id) => vec![*id],
            Link::Many(ids) => ids.clone(),
        }
    }
}

/// One record of a content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Concrete type name.
    #[serde(rename = "type")]
    pub type_name: String,

    /// Identifier.
    pub id: InstanceId,

    /// Column values.
    #[serde(default)]
    pub values: BTreeMap<String, Value>,

    /// Relation links, keyed by relation name.
    #[serde(default)]
    pub links: BTreeMap<String, Link>,
}

impl Instance {
    /// Create an instance with no values.
    pub fn new(type_name: impl Into<String>, id: InstanceId) -> Self {
        Self {
            type_name: type_name.into(),
            id,
            values: BTreeMap::new(),
            links: BTreeMap::new(),
        }
    }

    /// Set a column value.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    /// Link a single-valued relation.
    pub fn link_one(mut self, relation: impl Into<String>, id: InstanceId) -> Self {
        self.links.insert(relation.into(), Link::One(id));
        self
    }

    /// Link a multi-valued relation.
    pub fn link_many(mut self, relation: impl Into<String>, ids: Vec<InstanceId>) -> Self {
        self.links.insert(relation.into(), Link::Many(ids));
        self
    }

    /// Column value, if stored.
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Linked ids for a relation (empty when unlinked).
    pub fn linked(&self, relation: &str) -> Vec<InstanceId> {
        self.links.get(relation).map(Link::ids).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_builder() {
        let article = Instance::new("Article", 3)
            .with("Title", "Hello")
            .link_one("Author", 9)
            .link_many("Tags", vec![1, 2]);

        assert_eq!(article.value("Title"), Some(&Value::from("Hello")));
        assert_eq!(article.linked("Author"), vec![9]);
        assert_eq!(article.linked("Tags"), vec![1, 2]);
        assert!(article.linked("Missing").is_empty());
    }

    #[test]
    fn test_instance_json() {
        let instance: Instance = serde_json::from_str(
            r#"{"type": "Article", "id": 1, "values": {"Title": "Hi"}, "links": {"Author": 4, "Tags": [5, 6]}}"#,
        )
        .unwrap();
        assert_eq!(instance.type_name, "Article");
        assert_eq!(instance.links["Author"], Link::One(4));
        assert_eq!(instance.links["Tags"], Link::Many(vec![5, 6]));
    }
}
