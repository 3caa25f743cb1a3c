//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: infrastructure wiring (product store, user directory, assets)
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: multipart decoding and JSON envelopes
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, extract::DefaultBodyLimit, routing::get};
use tower::ServiceBuilder;

use bazaar_infra::AppConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> Result<Router, services::ServicesError> {
    let services = Arc::new(services::build_services(config).await?);
    Ok(router(services, config))
}

/// Router over already-wired services.
pub fn router(services: Arc<services::AppServices>, config: &AppConfig) -> Router {
    let jwt = Arc::new(bazaar_auth::Hs256JwtValidator::new(
        config.jwt_secret.clone().into_bytes(),
    ));
    let auth_state = middleware::AuthState { jwt };

    let protected = routes::protected_router()
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    let public = routes::public_router().layer(Extension(services));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(public)
        .merge(protected)
        .layer(
            ServiceBuilder::new().layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
}
