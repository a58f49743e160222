use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::store::{
    ensure_id, patch_changes, record_id, Collection, Condition, DeleteResult, Filter, InsertManyResult,
    InsertOneResult, RecordStore, UpdateResult,
};

/// PostgREST-backed record store. Every collection maps to a table of the
/// same name under `/rest/v1`.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, return_representation: bool) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.anon_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.anon_key))?,
        );

        if return_representation {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let return_representation = method != Method::GET;
        let headers = self.get_headers(return_representation)?;

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("Resource not found: {}", error_text),
                _ => anyhow!("API error ({}): {}", status, error_text),
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// The single row `filter` selects, if any. Single-record writes go
    /// through this so they never fan out over several rows.
    async fn single_match(&self, collection: Collection, filter: &Filter) -> Result<Option<Value>> {
        let path = table_path(collection, filter, &["limit=2"]);
        let mut rows: Vec<Value> = self.request(Method::GET, &path, None).await?;

        if rows.len() > 1 {
            return Err(anyhow!("Filter matches more than one record in {}", collection));
        }
        Ok(rows.pop())
    }
}

fn table_path(collection: Collection, filter: &Filter, extra: &[&str]) -> String {
    let mut query_parts: Vec<String> = filter.conditions().iter().map(render_condition).collect();
    query_parts.extend(extra.iter().map(|part| part.to_string()));

    if query_parts.is_empty() {
        format!("/rest/v1/{}", collection)
    } else {
        format!("/rest/v1/{}?{}", collection, query_parts.join("&"))
    }
}

fn render_condition(condition: &Condition) -> String {
    match condition {
        Condition::Eq(field, value) => match value {
            Value::Null => format!("{}=is.null", field),
            _ => format!("{}=eq.{}", field, urlencoding::encode(&plain_value(value))),
        },
        Condition::In(field, values) => format!(
            "{}=in.({})",
            field,
            urlencoding::encode(&quoted_list(values)),
        ),
        Condition::AnyOf(conditions) => format!(
            "or=({})",
            urlencoding::encode(&conditions.iter().map(render_nested).collect::<Vec<_>>().join(",")),
        ),
    }
}

// Conditions inside `or=(...)` use the dotted form and quote their values so
// that names containing spaces or commas survive PostgREST's tokenizer.
fn render_nested(condition: &Condition) -> String {
    match condition {
        Condition::Eq(field, Value::Null) => format!("{}.is.null", field),
        Condition::Eq(field, value) => format!("{}.eq.{}", field, quoted(value)),
        Condition::In(field, values) => format!("{}.in.({})", field, quoted_list(values)),
        Condition::AnyOf(conditions) => format!(
            "or({})",
            conditions.iter().map(render_nested).collect::<Vec<_>>().join(","),
        ),
    }
}

fn plain_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn quoted(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        other => other.to_string(),
    }
}

fn quoted_list(values: &[Value]) -> String {
    values.iter().map(quoted).collect::<Vec<_>>().join(",")
}

#[async_trait]
impl RecordStore for SupabaseClient {
    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Value>> {
        let path = table_path(collection, filter, &["limit=1"]);
        let result: Vec<Value> = self.request(Method::GET, &path, None).await?;
        Ok(result.into_iter().next())
    }

    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Value>> {
        let path = table_path(collection, filter, &[]);
        self.request(Method::GET, &path, None).await
    }

    async fn insert_one(&self, collection: Collection, mut record: Value) -> Result<InsertOneResult> {
        let inserted_id = ensure_id(&mut record)?;
        let path = table_path(collection, &Filter::new(), &[]);

        let result: Vec<Value> = self.request(Method::POST, &path, Some(record)).await?;
        let inserted_id = result.first().and_then(record_id).unwrap_or(inserted_id);

        Ok(InsertOneResult { inserted_id })
    }

    async fn insert_many(&self, collection: Collection, mut records: Vec<Value>) -> Result<InsertManyResult> {
        let mut inserted_ids = Vec::with_capacity(records.len());
        for record in records.iter_mut() {
            inserted_ids.push(ensure_id(record)?);
        }

        let path = table_path(collection, &Filter::new(), &[]);
        let result: Vec<Value> = self.request(Method::POST, &path, Some(Value::Array(records))).await?;
        if result.len() != inserted_ids.len() {
            return Err(anyhow!(
                "Expected {} inserted rows in {}, store returned {}",
                inserted_ids.len(), collection, result.len()
            ));
        }

        Ok(InsertManyResult { inserted_ids })
    }

    async fn update_one(&self, collection: Collection, filter: &Filter, patch: Value) -> Result<UpdateResult> {
        let fields = patch
            .as_object()
            .ok_or_else(|| anyhow!("Update patch must be a JSON object"))?;

        let Some(current) = self.single_match(collection, filter).await? else {
            return Ok(UpdateResult { matched_count: 0, modified_count: 0 });
        };

        // PostgREST echoes every matched row whether or not it changed, so
        // no-op patches are detected here and never sent.
        if !patch_changes(&current, fields) {
            debug!("Patch leaves {} record unchanged, skipping write", collection);
            return Ok(UpdateResult { matched_count: 1, modified_count: 0 });
        }

        let path = table_path(collection, &Filter::by_id(stored_id(&current, collection)?), &[]);
        let result: Vec<Value> = self.request(Method::PATCH, &path, Some(patch)).await?;
        let touched = result.len().min(1) as u64;

        Ok(UpdateResult { matched_count: touched, modified_count: touched })
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<DeleteResult> {
        let Some(current) = self.single_match(collection, filter).await? else {
            return Ok(DeleteResult { deleted_count: 0 });
        };

        let path = table_path(collection, &Filter::by_id(stored_id(&current, collection)?), &[]);
        let result: Vec<Value> = self.request(Method::DELETE, &path, None).await?;

        Ok(DeleteResult { deleted_count: result.len() as u64 })
    }
}

fn stored_id(record: &Value, collection: Collection) -> Result<String> {
    record_id(record).ok_or_else(|| anyhow!("Record in {} has no id", collection))
}
