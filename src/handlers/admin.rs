//! Admin endpoints: login, listings, transaction detail, verification,
//! CSV export. Everything except login sits behind the authorization
//! gate in `crate::auth`.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{Lead, Transaction};
use crate::error::AppError;
use crate::ports::{clamp_paging, LeadFilter, Page, TransactionFilter};
use crate::services::mailer::VerificationVars;
use crate::services::{AdminActor, VerifyAction};
use crate::validation::{sanitize_string, validate_enum, validate_max_len, VERIFY_NOTE_MAX_LEN};
use crate::AppState;

use super::envelope;
use super::leads::{parse_id, LeadSummary};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// `POST /api/admin/login` — the one admin route outside the gate.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth.verify_login(&payload.email, &payload.password)?;
    let token = state.auth.issue_token(&payload.email)?;
    Ok(envelope(LoginResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: state.auth.token_ttl().num_seconds(),
    }))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

fn page_meta<T>(page: &Page<T>) -> serde_json::Value {
    json!({
        "total": page.total,
        "page": page.page,
        "perPage": page.per_page,
    })
}

/// `GET /api/admin/leads`
pub async fn list_leads(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            s.parse()
                .map_err(|_| AppError::Validation(format!("status: unknown value '{}'", s)))
        })
        .transpose()?;
    let (page, per_page) = clamp_paging(query.page, query.per_page);
    let filter = LeadFilter {
        status,
        search: query.search.map(|s| sanitize_string(&s)).filter(|s| !s.is_empty()),
        page,
        per_page,
    };

    let result = state.leads.list_leads(&filter).await?;
    Ok(envelope(json!({
        "items": result.items,
        "pagination": page_meta(&result),
    })))
}

/// `GET /api/admin/transactions`
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = transaction_filter(query)?;
    let result = state.transactions.list(&filter).await?;
    Ok(envelope(json!({
        "items": result.items,
        "pagination": page_meta(&result),
    })))
}

fn transaction_filter(query: ListQuery) -> Result<TransactionFilter, AppError> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            s.parse()
                .map_err(|_| AppError::Validation(format!("status: unknown value '{}'", s)))
        })
        .transpose()?;
    let (page, per_page) = clamp_paging(query.page, query.per_page);
    Ok(TransactionFilter {
        status,
        lead_id: None,
        search: query.search.map(|s| sanitize_string(&s)).filter(|s| !s.is_empty()),
        page,
        per_page,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetail {
    #[serde(flatten)]
    pub transaction: Transaction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead: Option<LeadSummary>,
}

/// `GET /api/admin/transactions/:id` — includes the resolved lead
/// summary when the parent still exists.
pub async fn transaction_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("transactionId", &id)?;
    let (transaction, lead) = state.transactions.get_with_lead(id).await?;
    Ok(envelope(TransactionDetail {
        transaction,
        lead: lead.as_ref().map(LeadSummary::from),
    }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub action: String,
    pub note: Option<String>,
}

/// `POST /api/admin/transactions/:id/verify`
pub async fn verify_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(admin): Extension<AdminActor>,
    Json(payload): Json<VerifyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("transactionId", &id)?;

    let action = sanitize_string(&payload.action).to_uppercase();
    validate_enum("action", &action, &["VERIFY", "REJECT"])?;
    let action = if action == "VERIFY" {
        VerifyAction::Verify
    } else {
        VerifyAction::Reject
    };

    let note = payload
        .note
        .map(|n| {
            let n = sanitize_string(&n);
            validate_max_len("note", &n, VERIFY_NOTE_MAX_LEN).map(|_| n)
        })
        .transpose()?
        .filter(|n| !n.is_empty());

    let outcome = state.transactions.verify(id, &admin, action, note).await?;

    // Outcome mail to the customer is best-effort.
    if let Some(lead) = &outcome.lead {
        if let Err(err) = state
            .mailer
            .send_user_verification(
                &lead.email,
                VerificationVars {
                    name: &lead.name,
                    lead_id: &lead.id.to_string(),
                    status: outcome.transaction.status.as_str(),
                    note: outcome.transaction.verification_note.as_deref(),
                },
            )
            .await
        {
            tracing::warn!(
                transaction_id = %outcome.transaction.id,
                error = %err,
                "failed to send verification outcome mail"
            );
        }
    }

    Ok(envelope(json!({
        "transaction": outcome.transaction,
        "lead": outcome.lead,
    })))
}

#[derive(Debug, Serialize)]
struct TransactionCsvRow {
    id: String,
    lead_id: String,
    transaction_ref: String,
    amount: String,
    method: String,
    status: String,
    verified_by: String,
    verified_at: String,
    created_at: String,
}

impl From<&Transaction> for TransactionCsvRow {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id.to_string(),
            lead_id: tx.lead_id.to_string(),
            transaction_ref: tx.transaction_ref.clone(),
            amount: tx
                .amount
                .as_ref()
                .map(|a| a.to_string())
                .unwrap_or_default(),
            method: tx.method.map(|m| m.as_str().to_string()).unwrap_or_default(),
            status: tx.status.as_str().to_string(),
            verified_by: tx.verified_by.clone().unwrap_or_default(),
            verified_at: tx
                .verified_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// `GET /api/admin/transactions/export` — CSV download of transactions
/// matching the same filters as the listing.
pub async fn export_transactions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut filter = transaction_filter(query)?;
    filter.page = 1;
    filter.per_page = 100;

    let mut writer = csv::Writer::from_writer(Vec::new());
    loop {
        let page = state.transactions.list(&filter).await?;
        let fetched = page.items.len() as i64;
        for tx in &page.items {
            writer
                .serialize(TransactionCsvRow::from(tx))
                .map_err(|e| AppError::Internal(format!("csv serialization failed: {}", e)))?;
        }
        if filter.page * filter.per_page >= page.total || fetched == 0 {
            break;
        }
        filter.page += 1;
    }

    let body = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("csv flush failed: {}", e)))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"transactions.csv\"",
            ),
        ],
        body,
    ))
}
