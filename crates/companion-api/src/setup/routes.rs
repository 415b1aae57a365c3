//! Route configuration and setup

use crate::auth::auth_middleware;
use crate::constants::{DEFAULT_CONCURRENCY_LIMIT, MAX_REQUEST_BODY_BYTES};
use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{delete, get, post, put},
    Json, Router,
};
use companion_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let protected_routes = protected_routes().route_layer(
        axum::middleware::from_fn_with_state(state.clone(), auth_middleware),
    );
    let app_state_routes = public_routes().merge(protected_routes);

    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_CONCURRENCY_LIMIT)
        .max(1);
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let app = app_state_routes
        .nest(
            "/docs",
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json")
                .path("/docs")
                .into(),
        )
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        if config.is_production() {
            tracing::warn!("CORS configured to allow all origins - not recommended for production");
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

/// Public routes (no authentication required)
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::liveness_check))
        .route("/health/ready", get(handlers::health::readiness_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
        .route("/api/auth/signup-org", post(handlers::auth::signup_org))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/auth/invite/accept",
            post(handlers::auth::accept_invitation),
        )
        .route(
            "/api/templates/standard",
            get(handlers::templates::list_standard),
        )
}

/// Protected routes (require a session token).
fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .merge(invitation_routes())
        .merge(user_routes())
        .merge(template_routes())
        .merge(review_routes())
}

fn invitation_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/auth/invite",
            post(handlers::invitations::issue_invitations),
        )
        .route(
            "/api/auth/invitations",
            get(handlers::invitations::list_invitations),
        )
        .route(
            "/api/auth/invitations/{id}",
            delete(handlers::invitations::revoke_invitation),
        )
}

fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/users", get(handlers::users::list_users))
        .route("/api/auth/users/{id}", delete(handlers::users::delete_user))
        .route(
            "/api/auth/users/{id}/manager",
            put(handlers::users::assign_manager),
        )
}

fn template_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/templates/{id}/custom",
            get(handlers::templates::list_custom).post(handlers::templates::create_custom),
        )
        .route(
            "/api/templates/{id}/publish",
            post(handlers::templates::publish),
        )
        .route(
            "/api/org/{id}/principles",
            get(handlers::templates::active_principles),
        )
}

fn review_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/reviews/requests",
            get(handlers::reviews::list_reviewer_requests).post(handlers::reviews::request_review),
        )
        .route(
            "/api/reviews/requests/{id}/submission",
            get(handlers::reviews::get_submission).post(handlers::reviews::submit_review),
        )
        .route(
            "/api/reviews/requests/{id}/decline",
            post(handlers::reviews::decline_review),
        )
        .route(
            "/api/reviews/dashboard/manager/{id}",
            get(handlers::reviews::manager_dashboard),
        )
}
