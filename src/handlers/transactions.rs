//! Public payment-declaration endpoint.

use axum::{
    extract::{Path, Request, State},
    response::IntoResponse,
    Json, RequestExt,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::middleware::rate_limit::client_ip;
use crate::services::mailer::AdminNotificationVars;
use crate::services::DeclareTransaction;
use crate::validation::{
    sanitize_string, validate_enum, validate_max_len, validate_positive_amount, validate_required,
    REMARK_MAX_LEN, TRANSACTION_REF_MAX_LEN,
};
use crate::AppState;

use super::envelope;
use super::leads::parse_id;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclareTransactionRequest {
    pub transaction_id: String,
    pub amount: Option<BigDecimal>,
    pub method: Option<String>,
    pub remark: Option<String>,
}

impl DeclareTransactionRequest {
    fn validate(self) -> Result<DeclareTransaction, AppError> {
        let transaction_ref = sanitize_string(&self.transaction_id);
        validate_required("transactionId", &transaction_ref)?;
        validate_max_len("transactionId", &transaction_ref, TRANSACTION_REF_MAX_LEN)?;

        if let Some(amount) = &self.amount {
            validate_positive_amount("amount", amount)?;
        }

        let method = self
            .method
            .map(|m| {
                let m = sanitize_string(&m).to_uppercase();
                validate_enum("method", &m, &["UPI", "BANK", "OTHER"])?;
                m.parse().map_err(AppError::Validation)
            })
            .transpose()?;

        let remark = self
            .remark
            .map(|r| {
                let r = sanitize_string(&r);
                validate_max_len("remark", &r, REMARK_MAX_LEN).map(|_| r)
            })
            .transpose()?
            .filter(|r| !r.is_empty());

        Ok(DeclareTransaction {
            transaction_ref,
            amount: self.amount,
            method,
            remark,
        })
    }
}

/// `POST /api/leads/:id/transactions` — idempotent on
/// (lead, transactionId); repeats return the original declaration.
pub async fn declare(
    State(state): State<AppState>,
    Path(lead_id): Path<String>,
    req: Request,
) -> Result<impl IntoResponse, AppError> {
    let lead_id = parse_id("leadId", &lead_id)?;
    let source_ip = client_ip(&req);
    let Json(payload): Json<DeclareTransactionRequest> = req
        .extract()
        .await
        .map_err(|err| AppError::Validation(format!("malformed body: {}", err)))?;
    let payload = payload.validate()?;

    let outcome = state.transactions.declare(lead_id, payload, source_ip).await?;

    // Admin hears about first-time declarations only; idempotent repeats
    // stay quiet.
    if !outcome.deduplicated {
        if let Err(err) = state
            .mailer
            .send_admin_notification(AdminNotificationVars {
                transaction_ref: &outcome.transaction.transaction_ref,
                lead_id: &outcome.lead.id.to_string(),
                lead_name: &outcome.lead.name,
                lead_email: &outcome.lead.email,
            })
            .await
        {
            tracing::warn!(
                transaction_id = %outcome.transaction.id,
                error = %err,
                "failed to send admin notification"
            );
        }
    }

    Ok(envelope(json!({
        "transactionId": outcome.transaction.id,
        "status": outcome.transaction.status,
    })))
}
