//! Public lead endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::{Lead, LeadStatus};
use crate::error::AppError;
use crate::services::mailer::LeadConfirmationVars;
use crate::services::CreateLead;
use crate::validation::{
    sanitize_string, validate_email, validate_max_len, validate_min_len, validate_required,
    NAME_MAX_LEN, NAME_MIN_LEN, NOTES_MAX_LEN, PHONE_MAX_LEN, SERVICE_MAX_LEN,
};
use crate::AppState;

use super::envelope;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadRequest {
    pub name: String,
    pub email: String,
    pub service: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

impl CreateLeadRequest {
    fn validate(self) -> Result<CreateLead, AppError> {
        let name = sanitize_string(&self.name);
        validate_min_len("name", &name, NAME_MIN_LEN)?;
        validate_max_len("name", &name, NAME_MAX_LEN)?;

        let email = sanitize_string(&self.email);
        validate_email("email", &email)?;

        let service = sanitize_string(&self.service);
        validate_required("service", &service)?;
        validate_max_len("service", &service, SERVICE_MAX_LEN)?;

        let phone = self
            .phone
            .map(|p| {
                let p = sanitize_string(&p);
                validate_max_len("phone", &p, PHONE_MAX_LEN).map(|_| p)
            })
            .transpose()?
            .filter(|p| !p.is_empty());

        let notes = self
            .notes
            .map(|n| {
                let n = sanitize_string(&n);
                validate_max_len("notes", &n, NOTES_MAX_LEN).map(|_| n)
            })
            .transpose()?
            .filter(|n| !n.is_empty());

        Ok(CreateLead {
            name,
            email,
            service,
            phone,
            notes,
        })
    }
}

/// `POST /api/leads` — 201 on a new lead, 200 when the submission was
/// folded into an existing lead as a duplicate attempt.
pub async fn create_lead(
    State(state): State<AppState>,
    Json(payload): Json<CreateLeadRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.validate()?;
    let lead = state.leads.create_lead(payload).await?;

    // Confirmation mail is best-effort; the lead is already persisted.
    if let Err(err) = state
        .mailer
        .send_lead_confirmation(
            &lead.email,
            LeadConfirmationVars {
                name: &lead.name,
                lead_id: &lead.id.to_string(),
                service: &lead.service,
            },
        )
        .await
    {
        tracing::warn!(lead_id = %lead.id, error = %err, "failed to send lead confirmation");
    }

    let status = if lead.last_event_is_duplicate() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, envelope(json!({ "leadId": lead.id }))))
}

/// Limited projection exposed to the public tracking page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub service: String,
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&Lead> for LeadSummary {
    fn from(lead: &Lead) -> Self {
        Self {
            id: lead.id,
            name: lead.name.clone(),
            email: lead.email.clone(),
            service: lead.service.clone(),
            status: lead.status,
            created_at: lead.created_at,
        }
    }
}

pub(crate) fn parse_id(field: &str, raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("{}: not a valid id", field)))
}

/// `GET /api/leads/:id`
pub async fn get_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("leadId", &id)?;
    let lead = state
        .leads
        .get_lead(id)
        .await?
        .ok_or(AppError::LeadNotFound(id))?;
    Ok(envelope(LeadSummary::from(&lead)))
}
