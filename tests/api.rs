//! End-to-end checks of the REST surface against a temporary Sled store.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use portfolio_api::auth::{hash_password, TokenIssuer};
use portfolio_api::models::{Education, Experience, User};
use portfolio_api::rest::{create_router, AppState};
use portfolio_api::storage::Storage;

const SECRET: &[u8] = b"integration-test-secret";

struct TestApp {
    router: Router,
    storage: Storage,
}

impl TestApp {
    fn new() -> Self {
        let storage = Storage::temporary().expect("temporary storage");
        let router = create_router(AppState {
            storage: storage.clone(),
            tokens: issuer(),
            bcrypt_cost: 4,
            expose_errors: false,
        });
        Self { router, storage }
    }

    /// App with `admin` / `admin123` already stored.
    fn seeded() -> Self {
        let app = Self::new();
        app.insert_user("admin", "admin123", true);
        app
    }

    fn insert_user(&self, username: &str, password: &str, is_admin: bool) -> User {
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: hash_password(password, 4).unwrap(),
            is_admin,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.storage.create_user(&user).unwrap();
        user
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/admin/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    async fn admin_token(&self) -> String {
        let (status, body) = self.login("admin", "admin123").await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }
}

fn issuer() -> TokenIssuer {
    TokenIssuer::new(SECRET, Duration::days(7))
}

fn sample_project() -> Value {
    json!({
        "title": "Storefront",
        "description": "Online shop",
        "techStack": "React, Node.js, Stripe",
        "image": "/uploads/storefront.png",
        "githubLink": "https://github.com/me/storefront"
    })
}

#[tokio::test]
async fn test_login_returns_identity_and_token() {
    let app = TestApp::seeded();
    let (status, body) = app.login("admin", "admin123").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");
    assert_eq!(body["isAdmin"], true);
    assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));

    let claims = issuer().verify(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.sub, body["id"].as_str().unwrap());
}

#[tokio::test]
async fn test_wrong_password_gives_no_token() {
    let app = TestApp::seeded();
    let (status, body) = app.login("admin", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");
    assert!(body.get("token").is_none());

    let (status, _) = app.login("nobody", "admin123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(Method::POST, "/api/admin/login", None, Some(json!({ "username": "admin" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_guard_outcomes() {
    let app = TestApp::seeded();
    let viewer = app.insert_user("viewer", "viewer123", false);

    let (status, body) = app.send(Method::GET, "/api/admin/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, no token");

    let (status, _) = app
        .send(Method::GET, "/api/admin/profile", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let viewer_token = issuer().issue(&viewer.id).unwrap();
    let (status, body) = app
        .send(Method::GET, "/api/admin/profile", Some(&viewer_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized as an admin");

    let token = app.admin_token().await;
    let (status, body) = app
        .send(Method::GET, "/api/admin/profile", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");
    assert_eq!(body["isAdmin"], true);
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_token_for_unknown_user_is_rejected() {
    let app = TestApp::seeded();
    let token = issuer().issue("no-such-user").unwrap();

    let (status, body) = app
        .send(Method::POST, "/api/projects", Some(&token), Some(sample_project()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "User not found");
    assert_eq!(app.storage.list::<portfolio_api::models::Project>().unwrap().len(), 0);
}

#[tokio::test]
async fn test_expired_and_foreign_tokens_are_rejected() {
    let app = TestApp::seeded();
    let admin = app.storage.find_user_by_username("admin").unwrap().unwrap();

    let expired = issuer()
        .issue_at(&admin.id, Utc::now() - Duration::days(8))
        .unwrap();
    let (status, _) = app
        .send(Method::GET, "/api/admin/profile", Some(&expired), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign = TokenIssuer::new(b"some-other-secret", Duration::days(7))
        .issue(&admin.id)
        .unwrap();
    let (status, _) = app
        .send(Method::GET, "/api/admin/profile", Some(&foreign), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_project_lifecycle() {
    let app = TestApp::seeded();
    let token = app.admin_token().await;

    let (status, created) = app
        .send(Method::POST, "/api/projects", Some(&token), Some(sample_project()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["techStack"], json!(["React", "Node.js", "Stripe"]));
    assert_eq!(created["featured"], false);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, list) = app.send(Method::GET, "/api/projects", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, updated) = app
        .send(
            Method::PUT,
            &format!("/api/projects/{id}"),
            Some(&token),
            Some(json!({ "title": "Storefront v2", "featured": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Storefront v2");
    assert_eq!(updated["featured"], true);
    assert_eq!(updated["description"], "Online shop");
    assert_eq!(updated["image"], "/uploads/storefront.png");
    assert_eq!(updated["githubLink"], "https://github.com/me/storefront");
    assert_eq!(updated["createdAt"], created["createdAt"]);

    let (status, body) = app
        .send(Method::DELETE, &format!("/api/projects/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Project removed");

    let (status, _) = app
        .send(Method::GET, &format!("/api/projects/{id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/projects/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_project_without_title_is_not_persisted() {
    let app = TestApp::seeded();
    let token = app.admin_token().await;

    let mut body = sample_project();
    body.as_object_mut().unwrap().remove("title");
    let (status, response) = app
        .send(Method::POST, "/api/projects", Some(&token), Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["message"], "Please provide title, description, and image");

    let (_, list) = app.send(Method::GET, "/api/projects", None, None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_about_replaces_children_and_defaults_to_empty() {
    let app = TestApp::seeded();
    let token = app.admin_token().await;

    let (status, _) = app.send(Method::GET, "/api/about", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/about",
            Some(&token),
            Some(json!({ "headline": "Full-stack developer", "bio": "Hi there" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please provide profileImage");

    let (status, about) = app
        .send(
            Method::PUT,
            "/api/about",
            Some(&token),
            Some(json!({
                "headline": "Full-stack developer",
                "bio": "Hi there",
                "profileImage": "/uploads/me.png",
                "skills": ["Rust", "React"],
                "education": [
                    { "degree": "BSc", "institution": "State University", "year": "2019" }
                ],
                "experience": [
                    { "position": "Engineer", "company": "Acme", "startDate": "2020-01", "current": true }
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(about["education"].as_array().unwrap().len(), 1);
    assert_eq!(about["experience"][0]["company"], "Acme");
    assert_eq!(about["education"][0]["aboutMeId"], about["id"]);

    let (status, about) = app
        .send(
            Method::PUT,
            "/api/about",
            Some(&token),
            Some(json!({ "headline": "Rust developer" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(about["headline"], "Rust developer");
    assert_eq!(about["bio"], "Hi there");
    assert_eq!(about["skills"], json!(["Rust", "React"]));
    assert_eq!(about["education"], json!([]));
    assert_eq!(about["experience"], json!([]));
    assert!(app.storage.list::<Education>().unwrap().is_empty());
    assert!(app.storage.list::<Experience>().unwrap().is_empty());

    let (status, fetched) = app.send(Method::GET, "/api/about", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["headline"], "Rust developer");
}

#[tokio::test]
async fn test_second_setup_conflicts() {
    let app = TestApp::new();
    let credentials = json!({ "username": "owner", "password": "first-pass" });

    let (status, body) = app
        .send(Method::POST, "/api/admin/setup", None, Some(credentials))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["isAdmin"], true);
    assert!(body["token"].is_string());

    let (status, _) = app
        .send(
            Method::POST,
            "/api/admin/setup",
            None,
            Some(json!({ "username": "intruder", "password": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.login("intruder", "x").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_credential_update_invalidates_old_password() {
    let app = TestApp::seeded();
    let token = app.admin_token().await;

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/admin/update",
            Some(&token),
            Some(json!({ "username": "owner", "password": "n3w-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "owner");
    assert!(body["token"].is_string());

    let (status, _) = app.login("admin", "admin123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.login("owner", "admin123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.login("owner", "n3w-pass").await;
    assert_eq!(status, StatusCode::OK);

    // the old token still names the same user
    let (status, body) = app
        .send(Method::GET, "/api/admin/profile", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "owner");
}

#[tokio::test]
async fn test_ratings_validate_score() {
    let app = TestApp::seeded();

    for score in [0, 6, -1] {
        let (status, _) = app
            .send(Method::POST, "/api/ratings", None, Some(json!({ "score": score })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "score {score}");
    }

    for score in [5, 4] {
        let (status, _) = app
            .send(
                Method::POST,
                "/api/ratings",
                None,
                Some(json!({ "score": score, "comment": "Nice work" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, summary) = app.send(Method::GET, "/api/ratings/summary", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["count"], 2);
    assert_eq!(summary["average"], 4.5);

    let (_, ratings) = app.send(Method::GET, "/api/ratings", None, None).await;
    let id = ratings[0]["id"].as_str().unwrap().to_string();
    let (status, _) = app
        .send(Method::DELETE, &format!("/api/ratings/{id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.admin_token().await;
    let (status, _) = app
        .send(Method::DELETE, &format!("/api/ratings/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_certificates_and_gallery() {
    let app = TestApp::seeded();
    let token = app.admin_token().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/certificates",
            Some(&token),
            Some(json!({ "title": "AWS SA", "issuingOrg": "Amazon", "date": "someday", "image": "/uploads/aws.png" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Invalid date"));

    let (status, cert) = app
        .send(
            Method::POST,
            "/api/certificates",
            Some(&token),
            Some(json!({ "title": "AWS SA", "issuingOrg": "Amazon", "date": "2023-08-15", "image": "/uploads/aws.png" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(cert["date"], "2023-08-15");

    let (status, cert) = app
        .send(
            Method::PUT,
            &format!("/api/certificates/{}", cert["id"].as_str().unwrap()),
            Some(&token),
            Some(json!({ "title": "AWS Solutions Architect" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cert["issuingOrg"], "Amazon");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/gallery",
            Some(&token),
            Some(json!({ "title": "Hackathon", "image": "/uploads/hack.jpg", "category": "events" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .send(Method::POST, "/api/gallery", None, Some(json!({ "title": "x", "image": "y" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, gallery) = app.send(Method::GET, "/api/gallery", None, None).await;
    assert_eq!(gallery.as_array().unwrap().len(), 1);
    assert_eq!(gallery[0]["category"], "events");

    let (status, _) = app
        .send(Method::DELETE, "/api/gallery/missing", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blank_tech_stack_keeps_stored_value() {
    let app = TestApp::seeded();
    let token = app.admin_token().await;

    let mut body = sample_project();
    body["techStack"] = json!("Rust, Axum");
    let (_, created) = app
        .send(Method::POST, "/api/projects", Some(&token), Some(body))
        .await;
    let uri = format!("/api/projects/{}", created["id"].as_str().unwrap());

    let (status, updated) = app
        .send(Method::PUT, &uri, Some(&token), Some(json!({ "title": "t2", "techStack": "" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "t2");
    assert_eq!(updated["techStack"], json!(["Rust", "Axum"]));

    // an explicit empty list clears it
    let (status, updated) = app
        .send(Method::PUT, &uri, Some(&token), Some(json!({ "techStack": [] })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["techStack"], json!([]));
}

#[tokio::test]
async fn test_credential_update_to_taken_username_conflicts() {
    let app = TestApp::seeded();
    app.insert_user("viewer", "viewer123", false);
    let token = app.admin_token().await;

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/admin/update",
            Some(&token),
            Some(json!({ "username": "viewer" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.login("admin", "admin123").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");
}
