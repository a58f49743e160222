use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The record collections the clinic services read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    TherapistAppointments,
    RehabilitatorAppointments,
    Healthcares,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::TherapistAppointments => "therapist_appointments",
            Collection::RehabilitatorAppointments => "rehabilitator_appointments",
            Collection::Healthcares => "healthcares",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    In(String, Vec<Value>),
    /// Matches when at least one of the nested conditions matches.
    AnyOf(Vec<Condition>),
}

impl Condition {
    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Condition::Eq(field, expected) => record.get(field) == Some(expected),
            Condition::In(field, candidates) => record
                .get(field)
                .map(|actual| candidates.contains(actual))
                .unwrap_or(false),
            Condition::AnyOf(conditions) => conditions.iter().any(|c| c.matches(record)),
        }
    }
}

/// A conjunction of conditions. An empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl fmt::Display) -> Self {
        Self::new().eq("id", id.to_string())
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(field.to_string(), value.into()));
        self
    }

    pub fn is_in<V: Into<Value>>(mut self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.conditions.push(Condition::In(
            field.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn any_of(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions.push(Condition::AnyOf(conditions));
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn matches(&self, record: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertOneResult {
    pub inserted_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertManyResult {
    pub inserted_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub deleted_count: u64,
}

/// Narrow document-store contract consumed by every workflow. Records are
/// JSON objects keyed by an `id` field; callers deserialize into their own
/// models.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Value>>;

    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Value>>;

    async fn insert_one(&self, collection: Collection, record: Value) -> Result<InsertOneResult>;

    async fn insert_many(&self, collection: Collection, records: Vec<Value>) -> Result<InsertManyResult>;

    /// Applies `patch` (an object of fields to set) to the record matching
    /// `filter`. `modified_count` is 0 when every patched field already holds
    /// the given value.
    ///
    /// `filter` must identify at most one record. The in-memory store takes
    /// the first match; `SupabaseClient` rejects filters matching several.
    async fn update_one(&self, collection: Collection, filter: &Filter, patch: Value) -> Result<UpdateResult>;

    /// Removes the record matching `filter`, under the same uniqueness rule
    /// as `update_one`.
    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<DeleteResult>;
}

/// Returns the record's `id`, assigning a fresh v4 UUID when it has none.
pub(crate) fn ensure_id(record: &mut Value) -> Result<String> {
    if let Some(id) = record_id(record) {
        return Ok(id);
    }

    let object = record
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("Records must be JSON objects"))?;
    let id = uuid::Uuid::new_v4().to_string();
    object.insert("id".to_string(), Value::String(id.clone()));
    Ok(id)
}

/// Whether applying `patch` would alter at least one field of `record`.
pub(crate) fn patch_changes(record: &Value, patch: &Map<String, Value>) -> bool {
    patch.iter().any(|(field, value)| record.get(field) != Some(value))
}

pub(crate) fn record_id(record: &Value) -> Option<String> {
    match record.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_conjunction() {
        let record = json!({"professional": "John Smith", "status": "Pending", "complete": false});

        let filter = Filter::new()
            .eq("professional", "John Smith")
            .is_in("status", ["Set", "Pending"]);
        assert!(filter.matches(&record));

        let filter = filter.eq("complete", true);
        assert!(!filter.matches(&record));
    }

    #[test]
    fn test_any_of_condition() {
        let record = json!({"therapist": "John Smith", "rehabilitator": ""});
        let filter = Filter::new().any_of(vec![
            Condition::Eq("therapist".into(), json!("Jane Doe")),
            Condition::Eq("rehabilitator".into(), json!("Jane Doe")),
        ]);
        assert!(!filter.matches(&record));

        let filter = Filter::new().any_of(vec![
            Condition::Eq("therapist".into(), json!("John Smith")),
            Condition::Eq("rehabilitator".into(), json!("John Smith")),
        ]);
        assert!(filter.matches(&record));
    }

    #[test]
    fn test_patch_changes_detects_noop() {
        let record = json!({"id": "1", "therapist_requirement": false, "complete": false});

        let patch = json!({"therapist_requirement": false});
        assert!(!patch_changes(&record, patch.as_object().unwrap()));

        let patch = json!({"therapist_requirement": false, "complete": true});
        assert!(patch_changes(&record, patch.as_object().unwrap()));

        let patch = json!({"rehabilitator": "Mary Berg"});
        assert!(patch_changes(&record, patch.as_object().unwrap()));
    }

    #[test]
    fn test_missing_field_never_matches() {
        let record = json!({"id": "1"});
        assert!(!Filter::new().eq("status", "Set").matches(&record));
        assert!(Filter::new().matches(&record));
    }
}
