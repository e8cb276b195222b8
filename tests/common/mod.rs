use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Duration;
use sha2::{Digest, Sha256};
use tower::ServiceExt;

use leadgate_core::adapters::{
    MemoryCatalogRepository, MemoryLeadRepository, MemoryTransactionRepository,
};
use leadgate_core::auth::AdminAuth;
use leadgate_core::middleware::rate_limit::build_limiter;
use leadgate_core::services::{
    CatalogService, LeadService, MailTransport, Mailer, TransactionService,
};
use leadgate_core::{create_app, AppState};

pub const JWT_SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery-staple";

pub struct TestApp {
    pub app: Router,
    pub mailer: Arc<Mailer>,
    pub auth: Arc<AdminAuth>,
}

pub fn build_app(rate_limit_per_minute: u32) -> TestApp {
    let lead_repo = Arc::new(MemoryLeadRepository::new());
    let tx_repo = Arc::new(MemoryTransactionRepository::new());
    let mailer = Arc::new(Mailer::new(
        MailTransport::Memory,
        "noreply@example.com".into(),
        "ops@example.com".into(),
        "http://localhost:4000".into(),
    ));
    let auth = Arc::new(AdminAuth::new(
        JWT_SECRET,
        Duration::hours(12),
        ADMIN_EMAIL.into(),
        hex::encode(Sha256::digest(ADMIN_PASSWORD.as_bytes())),
    ));

    let state = AppState {
        leads: LeadService::new(lead_repo.clone()),
        transactions: TransactionService::new(lead_repo, tx_repo),
        catalog: CatalogService::new(Arc::new(MemoryCatalogRepository::new())),
        mailer: mailer.clone(),
        auth: auth.clone(),
        rate_limiter: build_limiter(rate_limit_per_minute),
        start_time: Instant::now(),
    };

    TestApp {
        app: create_app(state),
        mailer,
        auth,
    }
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

pub fn lead_payload() -> serde_json::Value {
    serde_json::json!({
        "name": "Eve",
        "email": "e@example.com",
        "service": "VISA_TOURIST"
    })
}
