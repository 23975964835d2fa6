//! API route definitions

use axum::{
    http::{HeaderName, HeaderValue, Uri},
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
};
use tracing::warn;
use utoipa::OpenApi;

use crate::{
    error::ApiError,
    handlers::{documents, export, health, search},
    middleware::log_requests,
    state::AppState,
};

const SERVICE_HEADER: &str = "x-igsr-api";
const VERSION_HEADER: &str = "x-igsr-api-version";

/// API routes. Every resource route is also served under `/beta`, the
/// prefix the website uses.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/beta/health", get(health::health_check))
        .route("/openapi.json", get(openapi_json))
        // Search
        .route("/{resource}/_search", post(search::search))
        .route("/beta/{resource}/_search", post(search::search))
        // Downloads
        .route("/{resource}/_search/{filename}", post(export::export_tsv))
        .route(
            "/beta/{resource}/_search/{filename}",
            post(export::export_tsv),
        )
        // Documents
        .route("/{resource}/{id}", get(documents::get_document))
        .route("/beta/{resource}/{id}", get(documents::get_document))
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
}

async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::ResourceNotFound(uri.path().to_string())
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// CORS for the configured origins, with credentials
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring unusable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Complete application: routes, logging, CORS and identification headers
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_allow_origins);

    api_routes()
        .layer(middleware::from_fn(log_requests))
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(SERVICE_HEADER),
            HeaderValue::from_static("igsr-api"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(VERSION_HEADER),
            HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
        ))
        .with_state(state)
}

/// OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::root,
        health::health_check,
        search::search,
        documents::get_document,
        export::export_tsv,
    ),
    components(schemas(
        crate::models::SearchResponse,
        crate::models::SearchHit,
        crate::models::DocumentResponse,
        crate::models::HealthResponse,
        crate::models::RootResponse,
        crate::models::ErrorBody,
    )),
    info(
        title = "IGSR API",
        description = "Query gateway between the IGSR website and its Elasticsearch indices"
    )
)]
pub struct ApiDoc;
