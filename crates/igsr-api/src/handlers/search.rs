//! Search endpoint

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    Json,
};

use crate::{
    error::ApiResult,
    extract::ApiPath,
    gateway::parse_body,
    models::SearchResponse,
    state::AppState,
};

/// Validated search against one resource
#[utoipa::path(
    post,
    path = "/{resource}/_search",
    request_body(content = Object, content_type = "application/json", description = "Search body; empty means match_all"),
    params(
        ("resource" = String, Path, description = "Resource name, e.g. sample or data-collection")
    ),
    responses(
        (status = 200, description = "Normalized search results", body = SearchResponse),
        (status = 400, description = "Query rejected", body = crate::models::ErrorBody),
        (status = 404, description = "Unknown resource", body = crate::models::ErrorBody),
        (status = 413, description = "Request body too large", body = crate::models::ErrorBody),
        (status = 502, description = "Search backend error", body = crate::models::ErrorBody),
        (status = 503, description = "Search backend unreachable", body = crate::models::ErrorBody),
        (status = 504, description = "Search backend timed out", body = crate::models::ErrorBody)
    )
)]
pub async fn search(
    State(state): State<AppState>,
    ApiPath(resource): ApiPath<String>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<SearchResponse>> {
    state.gateway.resource(&resource)?;
    let body = parse_body(&body?)?;
    let response = state.gateway.search(&resource, &body).await?;
    Ok(Json(response))
}
