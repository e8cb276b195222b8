//! Service catalog and settings endpoints: admin CRUD plus the public
//! configuration read the wizard bootstraps from.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::services::ServiceInput;
use crate::validation::{
    sanitize_string, validate_max_len, validate_non_negative_amount, validate_required,
    NAME_MAX_LEN, SERVICE_CODE_MAX_LEN, SERVICE_DESCRIPTION_MAX_LEN, SETTING_KEY_MAX_LEN,
    SETTING_VALUE_MAX_LEN,
};
use crate::AppState;

use super::envelope;
use super::leads::parse_id;

/// `GET /api/config` — unauthenticated; feeds the lead wizard.
pub async fn public_config(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let config = state.catalog.public_config().await?;
    Ok(envelope(config))
}

#[derive(Debug, Deserialize)]
pub struct ServiceRequest {
    pub code: String,
    pub name: String,
    pub category: String,
    pub price: BigDecimal,
    pub description: Option<String>,
    pub active: Option<bool>,
}

impl ServiceRequest {
    fn validate(self) -> Result<ServiceInput, AppError> {
        let code = sanitize_string(&self.code);
        validate_required("code", &code)?;
        validate_max_len("code", &code, SERVICE_CODE_MAX_LEN)?;

        let name = sanitize_string(&self.name);
        validate_required("name", &name)?;
        validate_max_len("name", &name, NAME_MAX_LEN)?;

        let category = sanitize_string(&self.category)
            .to_lowercase()
            .parse()
            .map_err(AppError::Validation)?;

        validate_non_negative_amount("price", &self.price)?;

        let description = self
            .description
            .map(|d| {
                let d = sanitize_string(&d);
                validate_max_len("description", &d, SERVICE_DESCRIPTION_MAX_LEN).map(|_| d)
            })
            .transpose()?
            .filter(|d| !d.is_empty());

        Ok(ServiceInput {
            code,
            name,
            category,
            price: self.price,
            description,
            active: self.active.unwrap_or(true),
        })
    }
}

/// `GET /api/admin/services` — every offering, inactive included.
pub async fn list_services(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let services = state.catalog.list_services().await?;
    Ok(envelope(services))
}

/// `POST /api/admin/services`
pub async fn create_service(
    State(state): State<AppState>,
    Json(payload): Json<ServiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let input = payload.validate()?;
    let service = state.catalog.create_service(input).await?;
    Ok((StatusCode::CREATED, envelope(service)))
}

/// `PUT /api/admin/services/:id`
pub async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ServiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("serviceId", &id)?;
    let input = payload.validate()?;
    let service = state.catalog.update_service(id, input).await?;
    Ok(envelope(service))
}

/// `DELETE /api/admin/services/:id`
pub async fn delete_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("serviceId", &id)?;
    state.catalog.delete_service(id).await?;
    Ok(envelope(json!({ "deleted": id })))
}

/// `GET /api/admin/settings`
pub async fn list_settings(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let settings = state.catalog.list_settings().await?;
    Ok(envelope(settings))
}

#[derive(Debug, Deserialize)]
pub struct SettingRequest {
    pub value: String,
    pub description: Option<String>,
}

/// `PUT /api/admin/settings/:key` — create-or-replace.
pub async fn upsert_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(payload): Json<SettingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let key = sanitize_string(&key);
    validate_required("key", &key)?;
    validate_max_len("key", &key, SETTING_KEY_MAX_LEN)?;

    let value = sanitize_string(&payload.value);
    validate_max_len("value", &value, SETTING_VALUE_MAX_LEN)?;

    let description = payload
        .description
        .map(|d| sanitize_string(&d))
        .filter(|d| !d.is_empty());

    let setting = state.catalog.upsert_setting(key, value, description).await?;
    Ok(envelope(setting))
}

/// `DELETE /api/admin/settings/:key`
pub async fn delete_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.catalog.delete_setting(&key).await?;
    Ok(envelope(json!({ "deleted": key })))
}
