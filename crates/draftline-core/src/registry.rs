//! Generic keyed record collection.
//!
//! Every material kind and the track list are a [`Registry`]: a flat `Vec`
//! of records with unique identifiers, created by merging caller fields over
//! a per-kind default template.
//!
//! Reads come in two flavours. [`Registry::peek`] and [`Registry::peek_mut`]
//! hand out live references into the storage and exist for owner components
//! that mutate nested state in place (the timeline appends segments this
//! way). Everyone else should use [`Registry::snapshot`], which returns an
//! owned copy that cannot alias the registry.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::{DocumentError, DocumentResult},
    model::{Fields, Identified, same_id},
};

#[derive(Debug, Clone)]
pub struct Registry<T> {
    label: &'static str,
    template: Fields,
    items: Vec<T>,
}

impl<T> Registry<T>
where
    T: Identified + Clone + Serialize + DeserializeOwned,
{
    #[must_use]
    pub fn new(label: &'static str, template: Fields) -> Self {
        Self::with_items(label, template, Vec::new())
    }

    #[must_use]
    pub fn with_items(label: &'static str, template: Fields, items: Vec<T>) -> Self {
        Self {
            label,
            template,
            items,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    #[must_use]
    pub fn template(&self) -> &Fields {
        &self.template
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Creates a record from `data` merged over the registry's template.
    pub fn create(&mut self, data: Value) -> DocumentResult<&T> {
        let template = self.template.clone();
        self.create_with(&template, data)
    }

    /// Creates a record from `data` merged over an explicit template.
    ///
    /// Used when several kinds share one collection but not one set of
    /// defaults (photos live next to videos, titles next to subtitles).
    pub fn create_with(&mut self, template: &Fields, data: Value) -> DocumentResult<&T> {
        let Value::Object(mut data) = data else {
            return Err(DocumentError::invalid_record(format!(
                "{} record must be a JSON object",
                self.label
            )));
        };

        let id = match data.get("id") {
            Some(Value::String(id)) if !id.trim().is_empty() => id.to_uppercase(),
            Some(_) => {
                return Err(DocumentError::invalid_record(format!(
                    "{} record id must be a non-empty string",
                    self.label
                )));
            }
            None => {
                return Err(DocumentError::invalid_record(format!(
                    "{} record is missing an id",
                    self.label
                )));
            }
        };

        if self.has(&id) {
            return Err(DocumentError::DuplicateIdentifier {
                collection: self.label,
                id,
            });
        }

        data.insert("id".to_string(), Value::String(id.clone()));
        let mut merged = template.clone();
        merged.extend(data);
        let item = decode::<T>(self.label, merged)?;

        let index = self.items.len();
        self.items.push(item);
        debug!(collection = self.label, %id, "record created");
        Ok(&self.items[index])
    }

    /// The live collection.
    #[must_use]
    pub fn all(&self) -> &[T] {
        &self.items
    }

    pub(crate) fn all_mut(&mut self) -> &mut Vec<T> {
        &mut self.items
    }

    /// Live reference into the storage. Not copy-isolated.
    #[must_use]
    pub fn peek(&self, id: &str) -> Option<&T> {
        self.position(id).map(|index| &self.items[index])
    }

    /// Live mutable reference into the storage. Not copy-isolated.
    pub fn peek_mut(&mut self, id: &str) -> Option<&mut T> {
        self.position(id).map(|index| &mut self.items[index])
    }

    /// Owned copy of a record, safe to hand to external callers.
    #[must_use]
    pub fn snapshot(&self, id: &str) -> Option<T> {
        self.peek(id).cloned()
    }

    #[must_use]
    pub fn snapshot_all(&self) -> Vec<T> {
        self.items.clone()
    }

    /// Shallow-merges `patch` into the record. The `id` field is never
    /// changed; unknown ids are a logged no-op.
    pub fn update(&mut self, id: &str, patch: Value) -> DocumentResult<Option<T>> {
        let Value::Object(mut patch) = patch else {
            return Err(DocumentError::invalid_record(format!(
                "{} update must be a JSON object",
                self.label
            )));
        };

        let Some(index) = self.position(id) else {
            warn!(collection = self.label, %id, "update ignored, record not found");
            return Ok(None);
        };

        if let Some(requested) = patch.remove("id") {
            if requested.as_str().is_none_or(|requested| !same_id(requested, id)) {
                warn!(collection = self.label, %id, "refusing to change record id");
            }
        }

        let current = serde_json::to_value(&self.items[index])
            .map_err(|error| DocumentError::invalid_record(error.to_string()))?;
        let Value::Object(mut merged) = current else {
            return Err(DocumentError::invalid_record(format!(
                "{} record did not serialize to an object",
                self.label
            )));
        };
        merged.extend(patch);

        let updated = decode::<T>(self.label, merged)?;
        self.items[index] = updated.clone();
        debug!(collection = self.label, %id, "record updated");
        Ok(Some(updated))
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let Some(index) = self.position(id) else {
            warn!(collection = self.label, %id, "remove ignored, record not found");
            return false;
        };
        self.items.remove(index);
        debug!(collection = self.label, %id, "record removed");
        true
    }

    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| same_id(item.id(), id))
    }
}

fn decode<T: DeserializeOwned>(label: &str, fields: Fields) -> DocumentResult<T> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|error| DocumentError::invalid_record(format!("{label}: {error}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::Record;

    fn speeds() -> Registry<Record> {
        let template = json!({ "mode": 0, "speed": 1, "type": "speed" });
        let Value::Object(template) = template else {
            unreachable!()
        };
        Registry::new("speeds", template)
    }

    #[test]
    fn create_merges_template_and_normalizes_id() {
        let mut registry = speeds();
        let record = registry
            .create(json!({ "id": "abc-1", "speed": 2 }))
            .expect("create should succeed");

        assert_eq!(record.id(), "ABC-1");
        assert_eq!(record.get("speed"), Some(&json!(2)));
        assert_eq!(record.get("type"), Some(&json!("speed")));
    }

    #[test]
    fn lookups_ignore_identifier_case() {
        let mut registry = speeds();
        registry
            .create(json!({ "id": "ABC-1" }))
            .expect("create should succeed");
        assert!(registry.has("abc-1"));
        assert!(registry.peek("Abc-1").is_some());
    }

    #[test]
    fn non_object_and_missing_id_are_invalid() {
        let mut registry = speeds();
        assert!(matches!(
            registry.create(json!(null)),
            Err(DocumentError::InvalidRecord { .. })
        ));
        assert!(matches!(
            registry.create(json!({ "speed": 1 })),
            Err(DocumentError::InvalidRecord { .. })
        ));
        assert!(matches!(
            registry.create(json!({ "id": "  " })),
            Err(DocumentError::InvalidRecord { .. })
        ));
        assert!(matches!(
            registry.create(json!({ "id": 12 })),
            Err(DocumentError::InvalidRecord { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn update_never_touches_id() {
        let mut registry = speeds();
        registry
            .create(json!({ "id": "A" }))
            .expect("create should succeed");
        let updated = registry
            .update("A", json!({ "id": "B", "speed": 3 }))
            .expect("update should succeed")
            .expect("record should exist");

        assert_eq!(updated.id(), "A");
        assert_eq!(updated.get("speed"), Some(&json!(3)));
        assert!(!registry.has("B"));
    }

    #[test]
    fn update_of_unknown_id_is_a_noop() {
        let mut registry = speeds();
        let result = registry
            .update("missing", json!({ "speed": 3 }))
            .expect("update should not fail");
        assert!(result.is_none());
    }

    #[test]
    fn snapshot_is_isolated_from_storage() {
        let mut registry = speeds();
        registry
            .create(json!({ "id": "A" }))
            .expect("create should succeed");

        let mut copy = registry.snapshot("A").expect("record should exist");
        copy.0.insert("speed".to_string(), json!(9));
        assert_eq!(registry.peek("A").and_then(|r| r.get("speed")), Some(&json!(1)));

        if let Some(live) = registry.peek_mut("A") {
            live.0.insert("speed".to_string(), json!(5));
        }
        assert_eq!(registry.peek("A").and_then(|r| r.get("speed")), Some(&json!(5)));
    }

    #[test]
    fn remove_reports_whether_record_existed() {
        let mut registry = speeds();
        registry
            .create(json!({ "id": "A" }))
            .expect("create should succeed");
        assert!(registry.remove("a"));
        assert!(!registry.remove("a"));
        assert_eq!(registry.len(), 0);
    }
}
