//! Project handlers: public reads, admin writes.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorResponse};
use crate::models::{keep_or_replace, required, Project};
use crate::rest::{ApiJson, AppState, MessageResponse};

/// Tech stack as sent by clients: a JSON array or `"Rust, Axum, Sled"`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum TechStack {
    List(Vec<String>),
    Csv(String),
}

impl TechStack {
    /// Trimmed, non-empty items. A blank CSV string counts as absent and
    /// yields `None`; an explicit empty list yields `Some(vec![])`.
    pub fn into_vec(self) -> Option<Vec<String>> {
        let items: Vec<String> = match self {
            TechStack::List(items) => items,
            TechStack::Csv(csv) if csv.trim().is_empty() => return None,
            TechStack::Csv(csv) => csv.split(',').map(str::to_owned).collect(),
        };
        Some(
            items
                .into_iter()
                .map(|item| item.trim().to_owned())
                .filter(|item| !item.is_empty())
                .collect(),
        )
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tech_stack: Option<TechStack>,
    pub live_link: Option<String>,
    pub github_link: Option<String>,
    pub image: Option<String>,
    pub featured: Option<bool>,
    pub category: Option<String>,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Project not found".to_string())
}

/// Optional link: a non-blank value replaces, anything else keeps `current`.
fn replace_link(value: Option<String>, current: Option<String>) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v.trim().to_owned()),
        _ => current,
    }
}

#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "projects",
    responses((status = 200, description = "All projects, newest first", body = Vec<Project>))
)]
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Project>>, ApiError> {
    Ok(Json(state.storage.list::<Project>()?))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    tag = "projects",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "The project", body = Project),
        (status = 404, description = "No such project", body = ErrorResponse)
    )
)]
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Project>, ApiError> {
    state
        .storage
        .get::<Project>(&id)?
        .map(Json)
        .ok_or_else(not_found)
}

#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "projects",
    request_body = ProjectInput,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Missing title, description or image", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<ProjectInput>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let missing = || ApiError::BadRequest("Please provide title, description, and image".to_string());
    let title = required(&input.title, "title").map_err(|_| missing())?;
    let description = required(&input.description, "description").map_err(|_| missing())?;
    let image = required(&input.image, "image").map_err(|_| missing())?;

    let project = Project {
        id: Uuid::new_v4().to_string(),
        title,
        description,
        tech_stack: input
            .tech_stack
            .and_then(TechStack::into_vec)
            .unwrap_or_default(),
        live_link: replace_link(input.live_link, None),
        github_link: replace_link(input.github_link, None),
        image,
        featured: input.featured.unwrap_or(false),
        category: replace_link(input.category, None),
        created_at: Utc::now(),
        updated_at: None,
    };
    state.storage.put(&project)?;
    info!(project_id = %project.id, title = %project.title, "project created");

    Ok((StatusCode::CREATED, Json(project)))
}

/// Partial update: fields left out (or blank) keep their stored value.
#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    tag = "projects",
    params(("id" = String, Path, description = "Project id")),
    request_body = ProjectInput,
    responses(
        (status = 200, description = "Updated project", body = Project),
        (status = 404, description = "No such project", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ProjectInput>,
) -> Result<Json<Project>, ApiError> {
    let current = state.storage.get::<Project>(&id)?.ok_or_else(not_found)?;

    let project = Project {
        title: keep_or_replace(&input.title, current.title),
        description: keep_or_replace(&input.description, current.description),
        tech_stack: input
            .tech_stack
            .and_then(TechStack::into_vec)
            .unwrap_or(current.tech_stack),
        live_link: replace_link(input.live_link, current.live_link),
        github_link: replace_link(input.github_link, current.github_link),
        image: keep_or_replace(&input.image, current.image),
        featured: input.featured.unwrap_or(current.featured),
        category: replace_link(input.category, current.category),
        updated_at: Some(Utc::now()),
        ..current
    };
    state.storage.put(&project)?;
    info!(project_id = %project.id, "project updated");

    Ok(Json(project))
}

#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    tag = "projects",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project removed", body = MessageResponse),
        (status = 404, description = "No such project", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.storage.remove::<Project>(&id)?.ok_or_else(not_found)?;
    info!(project_id = %id, "project removed");
    Ok(MessageResponse::new("Project removed"))
}
