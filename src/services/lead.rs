//! Lead lifecycle: creation with near-duplicate suppression, lookups,
//! admin listing. No mail side effects happen here; notification is the
//! caller's concern after a successful return.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::{history, Lead};
use crate::error::AppError;
use crate::ports::{LeadFilter, LeadRepository, Page};

/// Lookback window for collapsing near-duplicate submissions.
const DEDUPE_WINDOW_HOURS: i64 = 24;

const DUPLICATE_NOTE: &str = "Duplicate lead within 24h";

#[derive(Debug, Clone)]
pub struct CreateLead {
    pub name: String,
    pub email: String,
    pub service: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct LeadService {
    leads: Arc<dyn LeadRepository>,
}

impl LeadService {
    pub fn new(leads: Arc<dyn LeadRepository>) -> Self {
        Self { leads }
    }

    /// Creates a lead, or folds the submission into an existing lead when
    /// an identical (name, email, service) triple was created within the
    /// dedupe window. The duplicate case is observable through the
    /// returned lead's most recent history entry.
    pub async fn create_lead(&self, payload: CreateLead) -> Result<Lead, AppError> {
        let since = Utc::now() - Duration::hours(DEDUPE_WINDOW_HOURS);
        let existing = self
            .leads
            .find_recent_match(&payload.name, &payload.email, &payload.service, since)
            .await?;

        if let Some(mut lead) = existing {
            lead.record(
                history::LEAD_DUPLICATE_ATTEMPT,
                Some(history::ACTOR_PUBLIC),
                Some(DUPLICATE_NOTE.to_string()),
            );
            return Ok(self.leads.update(&lead).await?);
        }

        let lead = Lead::new(
            payload.name,
            payload.email,
            payload.service,
            payload.phone,
            payload.notes,
        );
        Ok(self.leads.insert(&lead).await?)
    }

    /// Read-only snapshot; not-found is a normal outcome.
    pub async fn get_lead(&self, id: Uuid) -> Result<Option<Lead>, AppError> {
        Ok(self.leads.get_by_id(id).await?)
    }

    pub async fn list_leads(&self, filter: &LeadFilter) -> Result<Page<Lead>, AppError> {
        Ok(self.leads.list(filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryLeadRepository;
    use crate::domain::LeadStatus;

    fn service() -> (LeadService, Arc<MemoryLeadRepository>) {
        let repo = Arc::new(MemoryLeadRepository::new());
        (LeadService::new(repo.clone()), repo)
    }

    fn payload() -> CreateLead {
        CreateLead {
            name: "Eve".into(),
            email: "e@example.com".into(),
            service: "VISA_TOURIST".into(),
            phone: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn resubmission_within_window_returns_same_lead() {
        let (service, _) = service();

        let first = service.create_lead(payload()).await.unwrap();
        let second = service.create_lead(payload()).await.unwrap();

        assert_eq!(first.id, second.id);
        assert!(second.last_event_is_duplicate());

        let created: Vec<_> = second
            .history
            .iter()
            .filter(|h| h.action == history::LEAD_CREATED)
            .collect();
        let duplicates: Vec<_> = second
            .history
            .iter()
            .filter(|h| h.action == history::LEAD_DUPLICATE_ATTEMPT)
            .collect();
        assert_eq!(created.len(), 1);
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].by.as_deref(), Some("public"));
    }

    #[tokio::test]
    async fn resubmission_outside_window_creates_new_lead() {
        let (service, repo) = service();

        let mut stale = Lead::new(
            "Eve".into(),
            "e@example.com".into(),
            "VISA_TOURIST".into(),
            None,
            None,
        );
        stale.created_at = Utc::now() - Duration::hours(25);
        repo.insert(&stale).await.unwrap();

        let fresh = service.create_lead(payload()).await.unwrap();
        assert_ne!(fresh.id, stale.id);
        assert_eq!(fresh.status, LeadStatus::New);
        assert!(!fresh.last_event_is_duplicate());
    }

    #[tokio::test]
    async fn different_service_is_not_a_duplicate() {
        let (service, _) = service();

        let first = service.create_lead(payload()).await.unwrap();
        let mut other = payload();
        other.service = "VISA_BUSINESS".into();
        let second = service.create_lead(other).await.unwrap();

        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn missing_lead_is_none_not_error() {
        let (service, _) = service();
        let found = service.get_lead(Uuid::new_v4()).await.unwrap();
        assert!(found.is_none());
    }
}
