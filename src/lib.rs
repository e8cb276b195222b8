pub mod adapters;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod services;
pub mod validation;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::auth::AdminAuth;
use crate::middleware::rate_limit::PublicRateLimiter;
use crate::services::{CatalogService, LeadService, Mailer, TransactionService};

#[derive(Clone)]
pub struct AppState {
    pub leads: LeadService,
    pub transactions: TransactionService,
    pub catalog: CatalogService,
    pub mailer: Arc<Mailer>,
    pub auth: Arc<AdminAuth>,
    pub rate_limiter: Arc<PublicRateLimiter>,
    pub start_time: Instant,
}

pub fn create_app(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/leads", post(handlers::leads::create_lead))
        .route("/api/leads/:id", get(handlers::leads::get_lead))
        .route(
            "/api/leads/:id/transactions",
            post(handlers::transactions::declare),
        )
        .route("/api/config", get(handlers::catalog::public_config))
        .route_layer(axum::middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            middleware::rate_limit::public_rate_limit,
        ));

    let admin = Router::new()
        .route("/api/admin/leads", get(handlers::admin::list_leads))
        .route(
            "/api/admin/transactions",
            get(handlers::admin::list_transactions),
        )
        .route(
            "/api/admin/transactions/export",
            get(handlers::admin::export_transactions),
        )
        .route(
            "/api/admin/transactions/:id",
            get(handlers::admin::transaction_detail),
        )
        .route(
            "/api/admin/transactions/:id/verify",
            post(handlers::admin::verify_transaction),
        )
        .route(
            "/api/admin/services",
            get(handlers::catalog::list_services).post(handlers::catalog::create_service),
        )
        .route(
            "/api/admin/services/:id",
            put(handlers::catalog::update_service).delete(handlers::catalog::delete_service),
        )
        .route("/api/admin/settings", get(handlers::catalog::list_settings))
        .route(
            "/api/admin/settings/:key",
            put(handlers::catalog::upsert_setting).delete(handlers::catalog::delete_setting),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/admin/login", post(handlers::admin::login))
        .merge(public)
        .merge(admin)
        .layer(axum::middleware::from_fn(
            middleware::request_logger::request_logger,
        ))
        .with_state(state)
}

/// CORS layer from the configured origin list; `*` means permissive.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let parsed: Vec<_> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(Any)
        .allow_headers(Any)
}
