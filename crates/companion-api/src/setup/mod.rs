//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use companion_core::{Config, DatabaseBackend};
use companion_db::{create_repositories, seed_standard_templates};
use companion_services::{create_notifier, InvitationNotifier, Services, SessionTokens};
use sqlx::PgPool;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry();

    config.validate().context("Configuration validation failed")?;
    tracing::info!(
        environment = %config.environment,
        backend = %config.database_backend,
        "Configuration loaded and validated successfully"
    );

    let pool = match config.database_backend {
        DatabaseBackend::Postgres => Some(database::setup_database(&config).await?),
        DatabaseBackend::Memory => None,
    };

    let notifier = create_notifier(&config);
    let state = build_state(&config, pool, notifier).await?;
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

/// Wire repositories and services for the configured backend.
pub async fn build_state(
    config: &Config,
    pool: Option<PgPool>,
    notifier: Arc<dyn InvitationNotifier>,
) -> Result<Arc<AppState>> {
    let repositories = create_repositories(config.database_backend, pool.clone())?;

    if config.seed_standard_templates {
        let seeded = seed_standard_templates(repositories.templates.as_ref()).await?;
        tracing::info!(seeded, "Standard templates ready");
    }

    let tokens = SessionTokens::new(&config.jwt_secret, config.jwt_expiry_hours);
    let services = Services::new(&repositories, tokens, notifier);

    Ok(Arc::new(AppState::new(services, repositories, pool)))
}
