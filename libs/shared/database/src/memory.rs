use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::store::{
    ensure_id, patch_changes, Collection, DeleteResult, Filter, InsertManyResult, InsertOneResult, RecordStore,
    UpdateResult,
};

/// Process-local record store. Backs the test suites and `RECORD_STORE=memory`
/// local runs; nothing survives a restart.
#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Value>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a collection directly, bypassing id assignment.
    pub async fn seed(&self, collection: Collection, records: Vec<Value>) {
        let mut collections = self.collections.write().await;
        collections.entry(collection).or_default().extend(records);
    }

    pub async fn all(&self, collection: Collection) -> Vec<Value> {
        let collections = self.collections.read().await;
        collections.get(&collection).cloned().unwrap_or_default()
    }

    pub async fn count(&self, collection: Collection) -> usize {
        let collections = self.collections.read().await;
        collections.get(&collection).map(Vec::len).unwrap_or(0)
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|records| records.iter().find(|r| filter.matches(r)))
            .cloned())
    }

    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|records| records.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert_one(&self, collection: Collection, mut record: Value) -> Result<InsertOneResult> {
        let inserted_id = ensure_id(&mut record)?;
        debug!("Inserting record {} into {}", inserted_id, collection);

        let mut collections = self.collections.write().await;
        collections.entry(collection).or_default().push(record);
        Ok(InsertOneResult { inserted_id })
    }

    async fn insert_many(&self, collection: Collection, records: Vec<Value>) -> Result<InsertManyResult> {
        let mut prepared = Vec::with_capacity(records.len());
        let mut inserted_ids = Vec::with_capacity(records.len());
        for mut record in records {
            inserted_ids.push(ensure_id(&mut record)?);
            prepared.push(record);
        }
        debug!("Inserting {} records into {}", prepared.len(), collection);

        let mut collections = self.collections.write().await;
        collections.entry(collection).or_default().extend(prepared);
        Ok(InsertManyResult { inserted_ids })
    }

    async fn update_one(&self, collection: Collection, filter: &Filter, patch: Value) -> Result<UpdateResult> {
        let fields = patch
            .as_object()
            .ok_or_else(|| anyhow!("Update patch must be a JSON object"))?;

        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(&collection)
            .and_then(|records| records.iter_mut().find(|r| filter.matches(r)));

        let Some(record) = target else {
            return Ok(UpdateResult { matched_count: 0, modified_count: 0 });
        };

        let changed = patch_changes(record, fields);
        let object = record
            .as_object_mut()
            .ok_or_else(|| anyhow!("Stored record in {} is not an object", collection))?;

        if changed {
            for (field, value) in fields {
                object.insert(field.clone(), value.clone());
            }
        }

        Ok(UpdateResult {
            matched_count: 1,
            modified_count: u64::from(changed),
        })
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<DeleteResult> {
        let mut collections = self.collections.write().await;
        let Some(records) = collections.get_mut(&collection) else {
            return Ok(DeleteResult { deleted_count: 0 });
        };

        match records.iter().position(|r| filter.matches(r)) {
            Some(index) => {
                records.remove(index);
                Ok(DeleteResult { deleted_count: 1 })
            }
            None => Ok(DeleteResult { deleted_count: 0 }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_assigns_missing_id() {
        let store = InMemoryStore::new();
        let result = store
            .insert_one(Collection::Users, json!({"forename": "Jane"}))
            .await
            .unwrap();

        let found = store
            .find_one(Collection::Users, &Filter::by_id(&result.inserted_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found["forename"], "Jane");
    }

    #[tokio::test]
    async fn test_update_reports_matched_and_modified() {
        let store = InMemoryStore::new();
        store
            .seed(Collection::TherapistAppointments, vec![json!({"id": "a1", "status": "Pending"})])
            .await;

        let filter = Filter::by_id("a1");
        let first = store
            .update_one(Collection::TherapistAppointments, &filter, json!({"status": "Set"}))
            .await
            .unwrap();
        assert_eq!(first, UpdateResult { matched_count: 1, modified_count: 1 });

        let second = store
            .update_one(Collection::TherapistAppointments, &filter, json!({"status": "Set"}))
            .await
            .unwrap();
        assert_eq!(second, UpdateResult { matched_count: 1, modified_count: 0 });

        let missing = store
            .update_one(Collection::TherapistAppointments, &Filter::by_id("zz"), json!({"status": "Set"}))
            .await
            .unwrap();
        assert_eq!(missing.matched_count, 0);
    }

    #[tokio::test]
    async fn test_delete_one_removes_single_match() {
        let store = InMemoryStore::new();
        store
            .seed(
                Collection::RehabilitatorAppointments,
                vec![
                    json!({"id": "1", "professional": "Ann Lee"}),
                    json!({"id": "2", "professional": "Ann Lee"}),
                ],
            )
            .await;

        let result = store
            .delete_one(
                Collection::RehabilitatorAppointments,
                &Filter::new().eq("professional", "Ann Lee"),
            )
            .await
            .unwrap();
        assert_eq!(result.deleted_count, 1);
        assert_eq!(store.count(Collection::RehabilitatorAppointments).await, 1);
    }

    #[tokio::test]
    async fn test_patch_must_be_object() {
        let store = InMemoryStore::new();
        let result = store
            .update_one(Collection::Users, &Filter::new(), json!("nope"))
            .await;
        assert!(result.is_err());
    }
}
