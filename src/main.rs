//! Portfolio server
//!
//! Serves the REST API, uploaded files and the built frontend from one port.
//!
//! Usage:
//!   ADMIN_USERNAME=admin ADMIN_PASSWORD=... cargo run --bin portfolio-server
//!   # then browse http://localhost:5000 or /swagger-ui

use std::sync::Arc;

use chrono::Utc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use uuid::Uuid;

use portfolio_api::auth::{hash_password, TokenIssuer};
use portfolio_api::config::{AdminSeed, Config};
use portfolio_api::logging;
use portfolio_api::models::User;
use portfolio_api::rest::{create_router_with_assets, AppState, StaticAssets};
use portfolio_api::storage::{Storage, StorageError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let _log_guard = logging::init(config.log_format, config.log_dir.as_deref())?;
    if config.jwt_secret_generated {
        warn!("JWT_SECRET not set, using a random secret; tokens will not survive a restart");
    }

    info!(data_dir = %config.data_dir.display(), "opening storage");
    let storage = Storage::open(&config.data_dir)?;

    if let Some(seed) = &config.admin_seed {
        bootstrap_admin(&storage, seed, config.bcrypt_cost)?;
    }

    let state = AppState {
        storage: storage.clone(),
        tokens: TokenIssuer::new(config.jwt_secret.as_bytes(), config.token_ttl),
        bcrypt_cost: config.bcrypt_cost,
        expose_errors: config.expose_errors,
    };
    let app = create_router_with_assets(
        state,
        StaticAssets {
            uploads_dir: config.uploads_dir.clone(),
            frontend_dir: config.frontend_dir.clone(),
        },
    );

    let listener = TcpListener::bind(config.bind).await?;
    info!(addr = %config.bind, "portfolio server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("flushing storage");
    storage.flush().await?;
    info!("server stopped");
    Ok(())
}

/// Create the configured admin unless one already exists.
fn bootstrap_admin(storage: &Storage, seed: &AdminSeed, cost: u32) -> Result<(), Box<dyn std::error::Error>> {
    if storage.admin_exists()? {
        info!("admin account present, skipping bootstrap");
        return Ok(());
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        username: seed.username.clone(),
        password_hash: hash_password(&seed.password, cost)?,
        is_admin: true,
        created_at: Utc::now(),
        updated_at: None,
    };
    match storage.create_user(&user) {
        Ok(()) => {
            info!(username = %user.username, "bootstrap admin created");
            Ok(())
        }
        Err(StorageError::AdminExists) => {
            info!("admin account created concurrently, skipping bootstrap");
            Ok(())
        }
        Err(StorageError::UsernameTaken(name)) => {
            warn!(username = %name, "bootstrap admin username belongs to another account");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
