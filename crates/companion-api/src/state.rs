//! Shared application state.

use companion_db::Repositories;
use companion_services::Services;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub repositories: Repositories,
    /// Present only with the PostgreSQL backend; used by the readiness check.
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(services: Services, repositories: Repositories, pool: Option<PgPool>) -> Self {
        Self {
            services,
            repositories,
            pool,
        }
    }
}
