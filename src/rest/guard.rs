//! Bearer-token guard for admin-only routes.
//!
//! Every request re-reads the user record named by the token, so a deleted
//! account or a dropped admin flag takes effect before the token expires.
//!
//! Outcomes:
//! - no/invalid/expired token, or unknown user: `401`
//! - valid token for a non-admin user: `403`
//! - admin: the [`AdminProfile`] is attached to the request extensions

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::models::AdminProfile;
use crate::rest::AppState;

pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(req.headers()) else {
        debug!(path = %req.uri().path(), "no bearer token provided");
        return Err(ApiError::Unauthorized("Not authorized, no token".to_string()));
    };

    let claims = state.tokens.verify(token).map_err(|e| {
        warn!(error = %e, "bearer token rejected");
        ApiError::from(e)
    })?;

    let user = state
        .storage
        .get_user(&claims.sub)?
        .ok_or_else(|| {
            warn!(user_id = %claims.sub, "token subject no longer exists");
            ApiError::Unauthorized("User not found".to_string())
        })?;

    if !user.is_admin {
        warn!(user_id = %user.id, "non-admin attempted an admin route");
        return Err(ApiError::Forbidden("Not authorized as an admin".to_string()));
    }

    req.extensions_mut().insert(AdminProfile::from(&user));
    Ok(next.run(req).await)
}

/// The token of an `Authorization: Bearer <token>` header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
