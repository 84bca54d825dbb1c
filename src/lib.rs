//! Income Insight API Library
//!
//! REST backend over client records: CRUD and search with derived segment
//! and affinity score, portfolio analytics, and a placeholder income
//! prediction endpoint.
//!
//! # Modules
//!
//! - `classifier`: Segment and affinity score computation.
//! - `config`: Configuration management.
//! - `db`: Database connection and schema bootstrap.
//! - `db_storage`: `ClientStore` trait and its PostgreSQL implementation.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `memory_storage`: In-process `ClientStore`.
//! - `models`: Core data models.
//! - `openapi`: OpenAPI document and docs page.
//! - `services`: Client, analytics and prediction services.

pub mod classifier;
pub mod config;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod handlers;
pub mod memory_storage;
pub mod models;
pub mod openapi;
pub mod services;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::handlers::AppState;

/// Routes under `/api` subject to request limiting.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/clients",
            get(handlers::list_clients).post(handlers::create_client),
        )
        .route("/api/clients/search", get(handlers::search_clients))
        .route("/api/clients/:id", get(handlers::get_client))
        .route("/api/predict/income", post(handlers::predict_income))
        .route("/api/analytics", get(handlers::analytics))
}

/// Builds the complete application router.
///
/// # Arguments
///
/// * `state` - Shared state; its config supplies the body limit and CORS origins.
/// * `protect` - Wraps the `/api` routes (the server adds rate limiting there).
///   Health and docs stay outside it.
///
/// # Returns
///
/// * `Router` - The router with tracing and CORS applied.
pub fn build_router<F>(state: Arc<AppState>, protect: F) -> Router
where
    F: FnOnce(Router<Arc<AppState>>) -> Router<Arc<AppState>>,
{
    let protected_routes = protect(
        api_routes().layer(RequestBodyLimitLayer::new(state.config.max_body_bytes)),
    );

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/docs", get(openapi::serve_swagger_ui))
        .route("/api-docs/openapi.json", get(openapi::serve_openapi_spec))
        .merge(protected_routes)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// CORS policy from configuration.
///
/// `*` allows any origin; otherwise only the listed origins, with
/// credentials.
pub fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_is_permissive() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([header::CONTENT_LENGTH])
        .allow_credentials(true)
}
