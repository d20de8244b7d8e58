use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::info;

use crate::error::{ApiError, ErrorResponse};
use crate::models::{AboutDraft, AboutMe};
use crate::rest::{ApiJson, AppState};

#[utoipa::path(
    get,
    path = "/api/about",
    tag = "about",
    responses(
        (status = 200, description = "Biography with education and experience", body = AboutMe),
        (status = 404, description = "Nothing published yet", body = ErrorResponse)
    )
)]
pub async fn get_about(State(state): State<Arc<AppState>>) -> Result<Json<AboutMe>, ApiError> {
    state
        .storage
        .get_about()?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("About me information not found".to_string()))
}

/// Create or fully replace the biography. Education and experience are
/// rebuilt from the body; leaving a list out clears it.
#[utoipa::path(
    put,
    path = "/api/about",
    tag = "about",
    request_body = AboutDraft,
    responses(
        (status = 200, description = "Stored biography", body = AboutMe),
        (status = 400, description = "Missing required field", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_about(
    State(state): State<Arc<AppState>>,
    ApiJson(draft): ApiJson<AboutDraft>,
) -> Result<Json<AboutMe>, ApiError> {
    let about = state.storage.replace_about(&draft)?;
    info!(
        education = about.education.len(),
        experience = about.experience.len(),
        "about me replaced"
    );
    Ok(Json(about))
}
