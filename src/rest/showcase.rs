//! Certificates, gallery items and visitor ratings.
//!
//! Certificates and gallery follow the project rules (public reads, admin
//! writes, partial updates). Ratings are written by visitors and only
//! deleted by the admin.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorResponse};
use crate::models::{keep_or_replace, required, Certificate, GalleryItem, Rating, RatingSummary};
use crate::rest::{ApiJson, AppState, MessageResponse};

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificateInput {
    pub title: Option<String>,
    pub issuing_org: Option<String>,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp
    pub date: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GalleryInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RatingInput {
    pub score: Option<i64>,
    pub comment: Option<String>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| ApiError::BadRequest(format!("Invalid date '{raw}', expected YYYY-MM-DD")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

// --- Certificates ---

#[utoipa::path(
    get,
    path = "/api/certificates",
    tag = "certificates",
    responses((status = 200, description = "All certificates, newest first", body = Vec<Certificate>))
)]
pub async fn list_certificates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Certificate>>, ApiError> {
    Ok(Json(state.storage.list::<Certificate>()?))
}

#[utoipa::path(
    get,
    path = "/api/certificates/{id}",
    tag = "certificates",
    params(("id" = String, Path, description = "Certificate id")),
    responses(
        (status = 200, description = "The certificate", body = Certificate),
        (status = 404, description = "No such certificate", body = ErrorResponse)
    )
)]
pub async fn get_certificate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Certificate>, ApiError> {
    state
        .storage
        .get::<Certificate>(&id)?
        .map(Json)
        .ok_or_else(certificate_not_found)
}

fn certificate_not_found() -> ApiError {
    ApiError::NotFound("Certificate not found".to_string())
}

#[utoipa::path(
    post,
    path = "/api/certificates",
    tag = "certificates",
    request_body = CertificateInput,
    responses(
        (status = 201, description = "Certificate created", body = Certificate),
        (status = 400, description = "Missing or invalid field", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_certificate(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<CertificateInput>,
) -> Result<(StatusCode, Json<Certificate>), ApiError> {
    let title = required(&input.title, "title").map_err(ApiError::BadRequest)?;
    let issuing_org = required(&input.issuing_org, "issuingOrg").map_err(ApiError::BadRequest)?;
    let date = parse_date(&required(&input.date, "date").map_err(ApiError::BadRequest)?)?;
    let image = required(&input.image, "image").map_err(ApiError::BadRequest)?;

    let certificate = Certificate {
        id: Uuid::new_v4().to_string(),
        title,
        issuing_org,
        date,
        image,
        created_at: Utc::now(),
        updated_at: None,
    };
    state.storage.put(&certificate)?;
    info!(certificate_id = %certificate.id, "certificate created");

    Ok((StatusCode::CREATED, Json(certificate)))
}

#[utoipa::path(
    put,
    path = "/api/certificates/{id}",
    tag = "certificates",
    params(("id" = String, Path, description = "Certificate id")),
    request_body = CertificateInput,
    responses(
        (status = 200, description = "Updated certificate", body = Certificate),
        (status = 404, description = "No such certificate", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_certificate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<CertificateInput>,
) -> Result<Json<Certificate>, ApiError> {
    let current = state
        .storage
        .get::<Certificate>(&id)?
        .ok_or_else(certificate_not_found)?;
    let date = match non_blank(input.date) {
        Some(raw) => parse_date(&raw)?,
        None => current.date,
    };

    let certificate = Certificate {
        title: keep_or_replace(&input.title, current.title),
        issuing_org: keep_or_replace(&input.issuing_org, current.issuing_org),
        date,
        image: keep_or_replace(&input.image, current.image),
        updated_at: Some(Utc::now()),
        ..current
    };
    state.storage.put(&certificate)?;
    info!(certificate_id = %certificate.id, "certificate updated");

    Ok(Json(certificate))
}

#[utoipa::path(
    delete,
    path = "/api/certificates/{id}",
    tag = "certificates",
    params(("id" = String, Path, description = "Certificate id")),
    responses(
        (status = 200, description = "Certificate removed", body = MessageResponse),
        (status = 404, description = "No such certificate", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_certificate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .storage
        .remove::<Certificate>(&id)?
        .ok_or_else(certificate_not_found)?;
    info!(certificate_id = %id, "certificate removed");
    Ok(MessageResponse::new("Certificate removed"))
}

// --- Gallery ---

fn gallery_not_found() -> ApiError {
    ApiError::NotFound("Gallery item not found".to_string())
}

#[utoipa::path(
    get,
    path = "/api/gallery",
    tag = "gallery",
    responses((status = 200, description = "All gallery items, newest first", body = Vec<GalleryItem>))
)]
pub async fn list_gallery(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GalleryItem>>, ApiError> {
    Ok(Json(state.storage.list::<GalleryItem>()?))
}

#[utoipa::path(
    get,
    path = "/api/gallery/{id}",
    tag = "gallery",
    params(("id" = String, Path, description = "Gallery item id")),
    responses(
        (status = 200, description = "The gallery item", body = GalleryItem),
        (status = 404, description = "No such item", body = ErrorResponse)
    )
)]
pub async fn get_gallery_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<GalleryItem>, ApiError> {
    state
        .storage
        .get::<GalleryItem>(&id)?
        .map(Json)
        .ok_or_else(gallery_not_found)
}

#[utoipa::path(
    post,
    path = "/api/gallery",
    tag = "gallery",
    request_body = GalleryInput,
    responses(
        (status = 201, description = "Gallery item created", body = GalleryItem),
        (status = 400, description = "Missing title or image", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_gallery_item(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<GalleryInput>,
) -> Result<(StatusCode, Json<GalleryItem>), ApiError> {
    let title = required(&input.title, "title").map_err(ApiError::BadRequest)?;
    let image = required(&input.image, "image").map_err(ApiError::BadRequest)?;

    let item = GalleryItem {
        id: Uuid::new_v4().to_string(),
        title,
        description: non_blank(input.description),
        image,
        category: non_blank(input.category),
        created_at: Utc::now(),
        updated_at: None,
    };
    state.storage.put(&item)?;
    info!(gallery_id = %item.id, "gallery item created");

    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    put,
    path = "/api/gallery/{id}",
    tag = "gallery",
    params(("id" = String, Path, description = "Gallery item id")),
    request_body = GalleryInput,
    responses(
        (status = 200, description = "Updated gallery item", body = GalleryItem),
        (status = 404, description = "No such item", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_gallery_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<GalleryInput>,
) -> Result<Json<GalleryItem>, ApiError> {
    let current = state
        .storage
        .get::<GalleryItem>(&id)?
        .ok_or_else(gallery_not_found)?;

    let item = GalleryItem {
        title: keep_or_replace(&input.title, current.title),
        description: non_blank(input.description).or(current.description),
        image: keep_or_replace(&input.image, current.image),
        category: non_blank(input.category).or(current.category),
        updated_at: Some(Utc::now()),
        ..current
    };
    state.storage.put(&item)?;
    info!(gallery_id = %item.id, "gallery item updated");

    Ok(Json(item))
}

#[utoipa::path(
    delete,
    path = "/api/gallery/{id}",
    tag = "gallery",
    params(("id" = String, Path, description = "Gallery item id")),
    responses(
        (status = 200, description = "Gallery item removed", body = MessageResponse),
        (status = 404, description = "No such item", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_gallery_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .storage
        .remove::<GalleryItem>(&id)?
        .ok_or_else(gallery_not_found)?;
    info!(gallery_id = %id, "gallery item removed");
    Ok(MessageResponse::new("Gallery item removed"))
}

// --- Ratings ---

#[utoipa::path(
    get,
    path = "/api/ratings",
    tag = "ratings",
    responses((status = 200, description = "All ratings, newest first", body = Vec<Rating>))
)]
pub async fn list_ratings(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Rating>>, ApiError> {
    Ok(Json(state.storage.list::<Rating>()?))
}

#[utoipa::path(
    get,
    path = "/api/ratings/summary",
    tag = "ratings",
    responses((status = 200, description = "Rating count and average score", body = RatingSummary))
)]
pub async fn rating_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RatingSummary>, ApiError> {
    let ratings = state.storage.list::<Rating>()?;
    Ok(Json(RatingSummary::from_ratings(&ratings)))
}

/// Visitors rate the site from 1 to 5, optionally with a comment.
#[utoipa::path(
    post,
    path = "/api/ratings",
    tag = "ratings",
    request_body = RatingInput,
    responses(
        (status = 201, description = "Rating stored", body = Rating),
        (status = 400, description = "Score missing or outside 1..=5", body = ErrorResponse)
    )
)]
pub async fn create_rating(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<RatingInput>,
) -> Result<(StatusCode, Json<Rating>), ApiError> {
    let score = input
        .score
        .and_then(|s| u8::try_from(s).ok())
        .filter(|s| (1..=5).contains(s))
        .ok_or_else(|| ApiError::BadRequest("Please provide a score between 1 and 5".to_string()))?;

    let rating = Rating {
        id: Uuid::new_v4().to_string(),
        score,
        comment: non_blank(input.comment),
        created_at: Utc::now(),
        updated_at: None,
    };
    state.storage.put(&rating)?;
    info!(rating_id = %rating.id, score, "rating received");

    Ok((StatusCode::CREATED, Json(rating)))
}

#[utoipa::path(
    delete,
    path = "/api/ratings/{id}",
    tag = "ratings",
    params(("id" = String, Path, description = "Rating id")),
    responses(
        (status = 200, description = "Rating removed", body = MessageResponse),
        (status = 404, description = "No such rating", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_rating(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .storage
        .remove::<Rating>(&id)?
        .ok_or_else(|| ApiError::NotFound("Rating not found".to_string()))?;
    info!(rating_id = %id, "rating removed");
    Ok(MessageResponse::new("Rating removed"))
}
