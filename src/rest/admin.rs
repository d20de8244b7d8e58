//! Admin account handlers: one-time setup, login, profile, credential update.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::error::{ApiError, ErrorResponse};
use crate::models::{AdminProfile, User};
use crate::rest::{ApiJson, AppState};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    fn username(&self) -> Option<&str> {
        self.username.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|s| !s.is_empty())
    }

    fn both(&self) -> Result<(&str, &str), ApiError> {
        match (self.username(), self.password()) {
            (Some(username), Some(password)) => Ok((username, password)),
            _ => Err(ApiError::BadRequest(
                "Please provide username and password".to_string(),
            )),
        }
    }
}

/// Identity plus a fresh token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: String,
    pub username: String,
    pub is_admin: bool,
    pub token: String,
}

impl AuthResponse {
    fn new(state: &AppState, user: &User) -> Result<Self, ApiError> {
        Ok(Self {
            id: user.id.clone(),
            username: user.username.clone(),
            is_admin: user.is_admin,
            token: state.tokens.issue(&user.id)?,
        })
    }
}

/// Create the admin account. Only succeeds while no admin exists.
#[utoipa::path(
    post,
    path = "/api/admin/setup",
    tag = "admin",
    request_body = Credentials,
    responses(
        (status = 201, description = "Admin created", body = AuthResponse),
        (status = 400, description = "Missing username or password", body = ErrorResponse),
        (status = 409, description = "An admin already exists", body = ErrorResponse)
    )
)]
pub async fn setup(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<Credentials>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let (username, password) = payload.both()?;
    if state.storage.admin_exists()? {
        return Err(ApiError::Conflict("Admin account already exists".to_string()));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        password_hash: hash_password(password, state.bcrypt_cost)?,
        is_admin: true,
        created_at: Utc::now(),
        updated_at: None,
    };
    state.storage.create_user(&user)?;
    info!(username = %user.username, "admin account created");

    Ok((StatusCode::CREATED, Json(AuthResponse::new(&state, &user)?)))
}

#[utoipa::path(
    post,
    path = "/api/admin/login",
    tag = "admin",
    request_body = Credentials,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Missing username or password", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<Credentials>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (username, password) = payload.both()?;
    info!(%username, "login attempt");

    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());
    let Some(user) = state.storage.find_user_by_username(username)? else {
        warn!(%username, "login failed: unknown user");
        return Err(invalid());
    };
    if !verify_password(password, &user.password_hash)? {
        warn!(%username, "login failed: wrong password");
        return Err(invalid());
    }

    info!(%username, user_id = %user.id, "login successful");
    Ok(Json(AuthResponse::new(&state, &user)?))
}

#[utoipa::path(
    get,
    path = "/api/admin/profile",
    tag = "admin",
    responses(
        (status = 200, description = "Resolved admin identity", body = AdminProfile),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn profile(Extension(admin): Extension<AdminProfile>) -> Json<AdminProfile> {
    Json(admin)
}

/// Change the admin's username and/or password. Omitted fields are kept.
#[utoipa::path(
    put,
    path = "/api/admin/update",
    tag = "admin",
    request_body = Credentials,
    responses(
        (status = 200, description = "Credentials updated", body = AuthResponse),
        (status = 400, description = "Nothing to update", body = ErrorResponse),
        (status = 409, description = "Username taken", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_credentials(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminProfile>,
    ApiJson(payload): ApiJson<Credentials>,
) -> Result<Json<AuthResponse>, ApiError> {
    let username = payload.username();
    let password_hash = match payload.password() {
        Some(password) => Some(hash_password(password, state.bcrypt_cost)?),
        None => None,
    };
    if username.is_none() && password_hash.is_none() {
        return Err(ApiError::BadRequest(
            "Please provide username or password".to_string(),
        ));
    }

    let user = state
        .storage
        .update_credentials(&admin.id, username, password_hash.as_deref())?;
    info!(user_id = %user.id, username = %user.username, "admin credentials updated");

    Ok(Json(AuthResponse::new(&state, &user)?))
}
