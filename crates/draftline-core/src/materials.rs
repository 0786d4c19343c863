use serde_json::Value;
use tracing::debug;

use crate::{
    error::{DocumentError, DocumentResult},
    model::{Collection, MaterialKind, Record},
    registry::Registry,
};

/// Every material collection of a draft, one registry per JSON array.
#[derive(Debug, Clone)]
pub struct MaterialStore {
    registries: [Registry<Record>; Collection::COUNT],
}

impl Default for MaterialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registries: Collection::ALL.map(empty_registry),
        }
    }

    /// Builds the store from raw record arrays, keyed by collection.
    ///
    /// Records without a usable id, or repeating an earlier id, are refused.
    pub fn from_collections(
        collections: impl IntoIterator<Item = (Collection, Vec<Record>)>,
    ) -> DocumentResult<Self> {
        let mut store = Self::new();
        for (collection, records) in collections {
            let registry = &mut store.registries[collection.index()];
            for record in records {
                let id = record_id(collection, &record)?;
                if registry.has(&id) {
                    return Err(DocumentError::DuplicateIdentifier {
                        collection: collection.key(),
                        id,
                    });
                }
                registry.all_mut().push(record);
            }
            debug!(
                collection = collection.key(),
                count = registry.len(),
                "materials loaded"
            );
        }
        Ok(store)
    }

    /// Creates a material of `kind` from `data` over that kind's defaults and
    /// returns a copy of the stored record.
    pub fn create(&mut self, kind: MaterialKind, data: Value) -> DocumentResult<Record> {
        let template = kind.template();
        self.registry_mut(kind.collection())
            .create_with(&template, data)
            .cloned()
    }

    #[must_use]
    pub fn registry(&self, collection: Collection) -> &Registry<Record> {
        &self.registries[collection.index()]
    }

    pub fn registry_mut(&mut self, collection: Collection) -> &mut Registry<Record> {
        &mut self.registries[collection.index()]
    }

    #[must_use]
    pub fn peek(&self, collection: Collection, id: &str) -> Option<&Record> {
        self.registry(collection).peek(id)
    }

    #[must_use]
    pub fn snapshot(&self, collection: Collection, id: &str) -> Option<Record> {
        self.registry(collection).snapshot(id)
    }

    #[must_use]
    pub fn has(&self, collection: Collection, id: &str) -> bool {
        self.registry(collection).has(id)
    }

    /// Whether any collection holds a record with `id`. Segment references do
    /// not say which collection they point into.
    #[must_use]
    pub fn contains_anywhere(&self, id: &str) -> bool {
        self.registries.iter().any(|registry| registry.has(id))
    }

    pub fn update(
        &mut self,
        collection: Collection,
        id: &str,
        patch: Value,
    ) -> DocumentResult<Option<Record>> {
        self.registry_mut(collection).update(id, patch)
    }

    pub fn remove(&mut self, collection: Collection, id: &str) -> bool {
        self.registry_mut(collection).remove(id)
    }

    #[must_use]
    pub fn len(&self, collection: Collection) -> usize {
        self.registry(collection).len()
    }

    #[must_use]
    pub fn total_len(&self) -> usize {
        self.registries.iter().map(Registry::len).sum()
    }

    /// Record arrays in collection order, ready to be written back.
    #[must_use]
    pub fn into_collections(self) -> Vec<(Collection, Vec<Record>)> {
        Collection::ALL
            .into_iter()
            .zip(self.registries)
            .map(|(collection, registry)| (collection, registry.into_items()))
            .collect()
    }
}

fn empty_registry(collection: Collection) -> Registry<Record> {
    Registry::new(collection.key(), collection.primary_kind().template())
}

fn record_id(collection: Collection, record: &Record) -> DocumentResult<String> {
    match record.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(id.clone()),
        _ => Err(DocumentError::invalid_record(format!(
            "{} record without a string id",
            collection.key()
        ))),
    }
}
