//! Portfolio API: backend for a personal portfolio site
//!
//! Sled-backed storage for projects, the about-me biography, certificates,
//! gallery items and visitor ratings, served over an Axum REST API. Writes are
//! restricted to a single admin account authenticated with bcrypt passwords and
//! HS256 bearer tokens.

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
// OpenAPI document + Swagger UI (utoipa)
pub mod openapi;
// REST API module: Axum handlers, admin guard, static frontend serving
pub mod rest;
pub mod storage;
