//! OpenAPI document and Swagger UI for the portfolio API.

// utoipa derive expands into code clippy flags
#![allow(clippy::needless_for_each)]

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ErrorResponse;
use crate::models::{
    AboutDraft, AboutMe, AdminProfile, Certificate, Education, EducationDraft, Experience,
    ExperienceDraft, GalleryItem, Project, Rating, RatingSummary,
};
use crate::rest::{
    self,
    about, admin,
    admin::{AuthResponse, Credentials},
    projects,
    projects::{ProjectInput, TechStack},
    showcase,
    showcase::{CertificateInput, GalleryInput, RatingInput},
    MessageResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Portfolio API",
        description = "Content API behind a personal portfolio site: projects, biography, certificates, gallery and visitor ratings"
    ),
    tags(
        (name = "health", description = "Liveness"),
        (name = "admin", description = "Admin account and authentication"),
        (name = "projects", description = "Portfolio projects"),
        (name = "about", description = "Biography, education and experience"),
        (name = "certificates", description = "Certificates"),
        (name = "gallery", description = "Image gallery"),
        (name = "ratings", description = "Visitor ratings")
    ),
    paths(
        rest::health_handler,
        admin::setup,
        admin::login,
        admin::profile,
        admin::update_credentials,
        projects::list_projects,
        projects::get_project,
        projects::create_project,
        projects::update_project,
        projects::delete_project,
        about::get_about,
        about::update_about,
        showcase::list_certificates,
        showcase::get_certificate,
        showcase::create_certificate,
        showcase::update_certificate,
        showcase::delete_certificate,
        showcase::list_gallery,
        showcase::get_gallery_item,
        showcase::create_gallery_item,
        showcase::update_gallery_item,
        showcase::delete_gallery_item,
        showcase::list_ratings,
        showcase::rating_summary,
        showcase::create_rating,
        showcase::delete_rating,
    ),
    components(schemas(
        Credentials,
        AuthResponse,
        AdminProfile,
        Project,
        ProjectInput,
        TechStack,
        AboutMe,
        AboutDraft,
        Education,
        EducationDraft,
        Experience,
        ExperienceDraft,
        Certificate,
        CertificateInput,
        GalleryItem,
        GalleryInput,
        Rating,
        RatingInput,
        RatingSummary,
        MessageResponse,
        ErrorResponse,
    )),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by admin routes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Swagger UI at `/swagger-ui`, document at `/api-docs/openapi.json`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
