//! REST API layer using Axum
//!
//! Public reads for the portfolio content plus admin-only writes, gated by
//! [`guard::require_admin`]. Shared state holds the Sled storage handle and the
//! token issuer; handlers run concurrently on Tokio without extra locking.

pub mod about;
pub mod admin;
pub mod guard;
pub mod projects;
pub mod showcase;

use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{FromRequest, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::auth::TokenIssuer;
use crate::error::{ApiError, ErrorResponse, InternalDetail};
use crate::openapi;
use crate::storage::Storage;

/// Shared app state for REST handlers (Arc-wrapped for concurrency)
pub struct AppState {
    pub storage: Storage,
    pub tokens: TokenIssuer,
    pub bcrypt_cost: u32,
    /// Include internal error detail in 500 bodies. Meant for local development.
    pub expose_errors: bool,
}

/// JSON body extractor whose rejections become `400 {"message": ...}`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Plain acknowledgement body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Where uploaded files and the built frontend live on disk.
#[derive(Debug, Clone)]
pub struct StaticAssets {
    pub uploads_dir: PathBuf,
    pub frontend_dir: PathBuf,
}

/// API router without static file serving.
pub fn create_router(state: AppState) -> Router {
    build_router(state, None)
}

/// Full site: API, `/uploads`, and the frontend bundle with an `index.html`
/// fallback for client-side routes.
pub fn create_router_with_assets(state: AppState, assets: StaticAssets) -> Router {
    build_router(state, Some(assets))
}

fn build_router(state: AppState, assets: Option<StaticAssets>) -> Router {
    let state = Arc::new(state);

    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/api/admin/setup", post(admin::setup))
        .route("/api/admin/login", post(admin::login))
        .route("/api/projects", get(projects::list_projects))
        .route("/api/projects/:id", get(projects::get_project))
        .route("/api/about", get(about::get_about))
        .route("/api/certificates", get(showcase::list_certificates))
        .route("/api/certificates/:id", get(showcase::get_certificate))
        .route("/api/gallery", get(showcase::list_gallery))
        .route("/api/gallery/:id", get(showcase::get_gallery_item))
        .route(
            "/api/ratings",
            get(showcase::list_ratings).post(showcase::create_rating),
        )
        .route("/api/ratings/summary", get(showcase::rating_summary));

    let admin_routes = Router::new()
        .route("/api/admin/profile", get(admin::profile))
        .route("/api/admin/update", put(admin::update_credentials))
        .route("/api/projects", post(projects::create_project))
        .route(
            "/api/projects/:id",
            put(projects::update_project).delete(projects::delete_project),
        )
        .route("/api/about", put(about::update_about))
        .route("/api/certificates", post(showcase::create_certificate))
        .route(
            "/api/certificates/:id",
            put(showcase::update_certificate).delete(showcase::delete_certificate),
        )
        .route("/api/gallery", post(showcase::create_gallery_item))
        .route(
            "/api/gallery/:id",
            put(showcase::update_gallery_item).delete(showcase::delete_gallery_item),
        )
        .route("/api/ratings/:id", delete(showcase::delete_rating))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_admin,
        ));

    let mut router = Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .merge(openapi::swagger_ui());

    if let Some(assets) = assets {
        let index = assets.frontend_dir.join("index.html");
        router = router
            .nest_service("/uploads", ServeDir::new(assets.uploads_dir))
            .fallback_service(ServeDir::new(assets.frontend_dir).fallback(ServeFile::new(index)));
    }

    router
        .layer(middleware::map_response_with_state(
            state.clone(),
            expose_internal_detail,
        ))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Rewrites generic 500 bodies to carry their detail when `expose_errors` is set.
async fn expose_internal_detail(State(state): State<Arc<AppState>>, response: Response) -> Response {
    if !state.expose_errors {
        return response;
    }
    match response.extensions().get::<InternalDetail>().cloned() {
        Some(InternalDetail(detail)) => (
            response.status(),
            Json(ErrorResponse {
                message: "Server error".to_string(),
                details: Some(detail),
            }),
        )
            .into_response(),
        None => response,
    }
}

/// Last-resort handler: a panicking request still gets a JSON 500.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        MessageResponse::new("Something went wrong!"),
    )
        .into_response()
}

/// Health check handler
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Server is up", body = MessageResponse))
)]
pub async fn health_handler() -> Json<MessageResponse> {
    MessageResponse::new("ok")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use chrono::Duration;
    use tower::ServiceExt; // For .oneshot() testing

    fn state() -> AppState {
        AppState {
            storage: Storage::temporary().expect("Storage for REST test"),
            tokens: TokenIssuer::new(b"rest-test-secret", Duration::days(7)),
            bcrypt_cost: 4,
            expose_errors: false,
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn failing_handler() -> Result<(), ApiError> {
        Err(ApiError::Internal("sled: disk full".to_string()))
    }

    async fn panicking_handler() -> &'static str {
        panic!("handler exploded")
    }

    fn failing_app(expose_errors: bool) -> Router {
        let state = Arc::new(AppState {
            expose_errors,
            ..state()
        });
        Router::new()
            .route("/fail", get(failing_handler))
            .route("/panic", get(panicking_handler))
            .layer(middleware::map_response_with_state(
                state.clone(),
                expose_internal_detail,
            ))
            .layer(CatchPanicLayer::custom(handle_panic))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_panicking_handler_gets_generic_500() {
        let response = failing_app(false)
            .oneshot(Request::builder().uri("/panic").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "message": "Something went wrong!" })
        );
    }

    #[tokio::test]
    async fn test_internal_detail_only_when_exposed() {
        let response = failing_app(false)
            .oneshot(Request::builder().uri("/fail").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "message": "Server error" })
        );

        let response = failing_app(true)
            .oneshot(Request::builder().uri("/fail").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "message": "Server error", "details": "sled: disk full" })
        );
    }

    #[tokio::test]
    async fn test_rest_health() {
        let app = create_router(state());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .expect("Health request");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_bad_request() {
        let app = create_router(state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/admin/login")
                    .method("POST")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"username\": "))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_spa_fallback_serves_index() {
        let dir = std::env::temp_dir().join(format!("portfolio_assets_{}", uuid::Uuid::new_v4()));
        let frontend = dir.join("dist");
        let uploads = dir.join("uploads");
        std::fs::create_dir_all(&frontend).unwrap();
        std::fs::create_dir_all(&uploads).unwrap();
        std::fs::write(frontend.join("index.html"), "<html>portfolio</html>").unwrap();
        std::fs::write(uploads.join("avatar.txt"), "avatar").unwrap();

        let app = create_router_with_assets(
            state(),
            StaticAssets {
                uploads_dir: uploads,
                frontend_dir: frontend,
            },
        );

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/projects/some-client-route").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<html>portfolio</html>");

        let response = app
            .oneshot(Request::builder().uri("/uploads/avatar.txt").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let _ = std::fs::remove_dir_all(dir);
    }
}
