//! Repositories and the backend factory

pub mod memory;
pub mod postgres;
pub mod traits;

use companion_core::{AppError, DatabaseBackend};
use sqlx::PgPool;
use std::sync::Arc;

pub use memory::MemoryDatabase;
pub use postgres::{
    PostgresInvitationRepository, PostgresOrganizationRepository, PostgresReviewRepository,
    PostgresTemplateRepository, PostgresUserRepository,
};
pub use traits::{
    InvitationRepository, ManagedReview, NewAccount, OrganizationRepository, ReviewRepository,
    TemplateRepository, UserRepository,
};

/// One handle per aggregate, all backed by the same store.
#[derive(Clone)]
pub struct Repositories {
    pub organizations: Arc<dyn OrganizationRepository>,
    pub users: Arc<dyn UserRepository>,
    pub templates: Arc<dyn TemplateRepository>,
    pub invitations: Arc<dyn InvitationRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            organizations: Arc::new(PostgresOrganizationRepository::new(pool.clone())),
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            templates: Arc::new(PostgresTemplateRepository::new(pool.clone())),
            invitations: Arc::new(PostgresInvitationRepository::new(pool.clone())),
            reviews: Arc::new(PostgresReviewRepository::new(pool)),
        }
    }

    pub fn memory() -> Self {
        let db = MemoryDatabase::new();
        Self {
            organizations: Arc::new(db.clone()),
            users: Arc::new(db.clone()),
            templates: Arc::new(db.clone()),
            invitations: Arc::new(db.clone()),
            reviews: Arc::new(db),
        }
    }
}

/// Build the repository set for the configured backend.
///
/// A pool is required for `DatabaseBackend::Postgres` and ignored otherwise.
pub fn create_repositories(
    backend: DatabaseBackend,
    pool: Option<PgPool>,
) -> Result<Repositories, AppError> {
    match backend {
        DatabaseBackend::Postgres => {
            let pool = pool.ok_or_else(|| {
                AppError::Internal("PostgreSQL backend selected without a pool".to_string())
            })?;
            tracing::info!(backend = %backend, "Using PostgreSQL repositories");
            Ok(Repositories::postgres(pool))
        }
        DatabaseBackend::Memory => {
            tracing::warn!(backend = %backend, "Using in-memory repositories; data is not persisted");
            Ok(Repositories::memory())
        }
    }
}
