//! TSV download endpoint

use axum::{
    extract::{rejection::FormRejection, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Form,
};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    export::sanitize_filename,
    extract::ApiPath,
    gateway::parse_body,
    models::ExportForm,
    state::AppState,
};

const TSV_CONTENT_TYPE: &str = "text/tab-separated-values; charset=utf-8";

/// Search results as a TSV attachment
#[utoipa::path(
    post,
    path = "/{resource}/_search/{filename}",
    request_body(content = ExportForm, content_type = "application/x-www-form-urlencoded", description = "Optional `json` field holding a search body"),
    params(
        ("resource" = String, Path, description = "Resource name"),
        ("filename" = String, Path, description = "Download name ending in .tsv")
    ),
    responses(
        (status = 200, description = "TSV file", content_type = "text/tab-separated-values", body = String),
        (status = 400, description = "Query rejected", body = crate::models::ErrorBody),
        (status = 404, description = "Unknown resource or export not offered", body = crate::models::ErrorBody)
    )
)]
pub async fn export_tsv(
    State(state): State<AppState>,
    ApiPath((resource, filename)): ApiPath<(String, String)>,
    form: Result<Form<ExportForm>, FormRejection>,
) -> ApiResult<Response> {
    state.gateway.resource(&resource)?;
    let stem = filename
        .strip_suffix(".tsv")
        .ok_or_else(|| ApiError::ResourceNotFound(filename.clone()))?;

    // Browsers submitting an empty download form send no form content type.
    let form = match form {
        Ok(Form(form)) => form,
        Err(FormRejection::InvalidFormContentType(_)) => ExportForm::default(),
        Err(rejection) => return Err(rejection.into()),
    };
    let body = parse_body(form.json.as_deref().unwrap_or_default().as_bytes())?;

    let export = state.gateway.export(&resource, &body).await?;
    info!(resource = %resource, rows = export.rows, "tsv export");

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}.tsv\"",
        sanitize_filename(stem)
    ))
    .map_err(|_| ApiError::InvalidQuery("invalid download name".to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(TSV_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.body,
    )
        .into_response())
}
