//! Document detail endpoint

use axum::{extract::State, Json};

use crate::{error::ApiResult, extract::ApiPath, models::DocumentResponse, state::AppState};

/// Single document by id, or by the resource's lookup field
#[utoipa::path(
    get,
    path = "/{resource}/{id}",
    params(
        ("resource" = String, Path, description = "Resource name"),
        ("id" = String, Path, description = "Document id, or sample name / population code")
    ),
    responses(
        (status = 200, description = "Document found", body = DocumentResponse),
        (status = 404, description = "No such resource or document", body = crate::models::ErrorBody),
        (status = 502, description = "Search backend error", body = crate::models::ErrorBody)
    )
)]
pub async fn get_document(
    State(state): State<AppState>,
    ApiPath((resource, id)): ApiPath<(String, String)>,
) -> ApiResult<Json<DocumentResponse>> {
    let document = state.gateway.get_document(&resource, &id).await?;
    Ok(Json(document))
}
