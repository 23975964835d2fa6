//! API request and response models

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Search results in engine-neutral form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    /// Number of matching documents
    pub total: u64,
    /// Matching documents, in engine order
    pub hits: Vec<SearchHit>,
    /// Facet summary, when aggregations were requested
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub aggregations: Option<Value>,
}

/// One matching document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchHit {
    /// Engine document id
    pub id: Option<String>,
    /// Stored document fields
    #[schema(value_type = Object)]
    pub source: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub highlight: Option<Value>,
    /// Sort values, usable as `search_after`
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub sort: Option<Vec<Value>>,
}

/// Single document lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    pub id: Option<String>,
    #[schema(value_type = Object)]
    pub source: Map<String, Value>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the search engine does not answer
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Liveness response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RootResponse {
    pub ok: bool,
}

/// Error payload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Stable error taxonomy, e.g. `invalid_query`
    pub kind: String,
    pub message: String,
}

/// TSV export form
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ExportForm {
    /// Stringified search body
    pub json: Option<String>,
}
