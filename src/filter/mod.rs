use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::database::Document;

/// Equality filter over document fields.
///
/// Every clause is `field == value`; a document matches when all clauses hold.
/// Setting a field that already has a clause replaces that clause and leaves the
/// others untouched, which is how tenant scoping overrides a caller's own value
/// for the scoping field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Filter {
    clauses: BTreeMap<String, Value>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Filter::set`]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.clauses.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.clauses.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.clauses.iter()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }

    /// JSON object form, used for JSONB containment queries
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .clauses
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::new().matches(&doc(json!({"name": "A"}))));
        assert!(Filter::new().matches(&Document::new()));
    }

    #[test]
    fn all_clauses_must_hold() {
        let filter = Filter::new().eq("school", "s1").eq("name", "7B");
        assert!(filter.matches(&doc(json!({"school": "s1", "name": "7B", "extra": 1}))));
        assert!(!filter.matches(&doc(json!({"school": "s2", "name": "7B"}))));
        assert!(!filter.matches(&doc(json!({"name": "7B"}))));
    }

    #[test]
    fn set_replaces_only_the_named_clause() {
        let mut filter = Filter::new().eq("school", "s2").eq("classroom", "c1");
        filter.set("school", "s1");
        assert_eq!(filter.len(), 2);
        assert_eq!(filter.get("school"), Some(&json!("s1")));
        assert_eq!(filter.get("classroom"), Some(&json!("c1")));
    }

    #[test]
    fn json_form_is_a_flat_object() {
        let filter = Filter::new().eq("school", "s1");
        assert_eq!(filter.to_json(), json!({"school": "s1"}));
        assert_eq!(serde_json::to_value(&filter).unwrap(), json!({"school": "s1"}));
    }
}
