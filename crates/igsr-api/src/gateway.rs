//! Request pipeline: resolve, validate, rewrite, execute, normalize

use std::sync::Arc;

use igsr_backend::SearchBackend;
use igsr_config::{ResourceRegistry, ResourceSpec};
use igsr_query::{QueryPolicy, QueryValidator};
use serde_json::{json, Value};
use tracing::debug;

use crate::{
    error::{ApiError, ApiResult},
    export::render_tsv,
    models::{DocumentResponse, SearchResponse},
    normalizer::{document_from_hit, hit_list, normalize_document, normalize_search},
};

/// Rendered TSV download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsvExport {
    pub columns: Vec<String>,
    pub rows: usize,
    pub body: String,
}

/// Parse a request body. Empty or `null` means "match everything".
pub fn parse_body(bytes: &[u8]) -> ApiResult<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(match_all());
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Null) => Ok(match_all()),
        Ok(value) => Ok(value),
        Err(e) => Err(ApiError::InvalidQuery(format!(
            "request body is not valid JSON: {e}"
        ))),
    }
}

fn match_all() -> Value {
    json!({"query": {"match_all": {}}})
}

/// Shared, immutable request pipeline
pub struct SearchGateway {
    registry: Arc<ResourceRegistry>,
    validator: QueryValidator,
    backend: Arc<dyn SearchBackend>,
    export_size_cap: usize,
}

impl SearchGateway {
    pub fn new(
        registry: Arc<ResourceRegistry>,
        policy: QueryPolicy,
        backend: Arc<dyn SearchBackend>,
        export_size_cap: usize,
    ) -> Self {
        Self {
            registry,
            validator: QueryValidator::new(policy),
            backend,
            export_size_cap,
        }
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn resource(&self, name: &str) -> ApiResult<&ResourceSpec> {
        self.registry
            .resolve(name)
            .ok_or_else(|| ApiError::ResourceNotFound(name.to_string()))
    }

    /// Validated, rewritten search against the resource's index.
    pub async fn search(&self, resource: &str, body: &Value) -> ApiResult<SearchResponse> {
        let spec = self.resource(resource)?;
        let validated = self.validator.validate(body)?;
        let page_size = validated.page_size();

        let mut search = spec.search_rewrites.apply(validated);
        search.ensure_source(&spec.default_source);

        debug!(resource = %spec.name, index = %spec.index, page_size, "executing search");
        let raw = self
            .backend
            .search(&spec.index, &search.into_engine_body())
            .await?;

        Ok(normalize_search(raw, page_size, spec.decoration)?)
    }

    /// Fetch one document by engine id, falling back to the resource's
    /// exact-match lookup field.
    pub async fn get_document(&self, resource: &str, id: &str) -> ApiResult<DocumentResponse> {
        let spec = self.resource(resource)?;

        if let Some(raw) = self.backend.get_document(&spec.index, id).await? {
            return Ok(normalize_document(
                raw,
                &spec.prune_fields,
                spec.decoration,
            )?);
        }

        if let Some(field) = spec.lookup_field.as_deref() {
            debug!(resource = %spec.name, field, "id lookup missed, trying lookup field");
            let body = json!({
                "size": 1,
                "query": {"term": {field: id}},
                "_source": true
            });
            let raw = self.backend.search(&spec.index, &body).await?;
            let response = normalize_search(raw, 1, None)?;
            if let Some(hit) = response.hits.into_iter().next() {
                return Ok(document_from_hit(hit, &spec.prune_fields, spec.decoration));
            }
        }

        Err(ApiError::ResourceNotFound(format!("{resource}/{id}")))
    }

    /// Run an export search and render it as TSV.
    pub async fn export(&self, resource: &str, body: &Value) -> ApiResult<TsvExport> {
        let spec = self.resource(resource)?;
        let default_columns = spec
            .export_columns
            .as_ref()
            .ok_or_else(|| ApiError::ResourceNotFound(format!("{resource} export")))?;

        let validated = self
            .validator
            .validate_with_page_limit(body, self.export_size_cap)?;
        let columns = validated
            .source_fields()
            .filter(|fields| !fields.is_empty())
            .unwrap_or_else(|| default_columns.clone());

        let mut search = spec.export_rewrites.apply(validated);
        let source_fields: Vec<String> = columns
            .iter()
            .filter(|column| !matches!(column.as_str(), "_id" | "_index"))
            .cloned()
            .collect();
        search.ensure_source(&source_fields);

        debug!(resource = %spec.name, columns = columns.len(), "executing export");
        let raw = self
            .backend
            .search(&spec.index, &search.into_engine_body())
            .await?;
        let hits = hit_list(&raw)?;

        Ok(TsvExport {
            rows: hits.len(),
            body: render_tsv(&columns, hits),
            columns,
        })
    }

    /// `true` when the engine answers a ping
    pub async fn ping(&self) -> bool {
        self.backend.ping().await
    }
}
