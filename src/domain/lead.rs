//! Lead domain entity.
//! A customer's service request, the root entity of the workflow.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::history::{self, HistoryEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    New,
    PaymentDeclared,
    Verified,
    Rejected,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "NEW",
            LeadStatus::PaymentDeclared => "PAYMENT_DECLARED",
            LeadStatus::Verified => "VERIFIED",
            LeadStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(LeadStatus::New),
            "PAYMENT_DECLARED" => Ok(LeadStatus::PaymentDeclared),
            "VERIFIED" => Ok(LeadStatus::Verified),
            "REJECTED" => Ok(LeadStatus::Rejected),
            other => Err(format!("unknown lead status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: LeadStatus,
    pub history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Creates a NEW lead with its initial `CREATED` history entry,
    /// attributed to the public site.
    pub fn new(
        name: String,
        email: String,
        service: String,
        phone: Option<String>,
        notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            phone,
            service,
            notes,
            status: LeadStatus::New,
            history: vec![HistoryEntry::new(
                history::LEAD_CREATED,
                Some(history::ACTOR_PUBLIC),
                None,
            )],
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a history entry and bumps `updated_at`. History is
    /// append-only; nothing ever removes or reorders entries.
    pub fn record(&mut self, action: &str, by: Option<&str>, note: Option<String>) {
        self.history.push(HistoryEntry::new(action, by, note));
        self.updated_at = Utc::now();
    }

    /// Whether the most recent history entry marks a suppressed
    /// duplicate submission.
    pub fn last_event_is_duplicate(&self) -> bool {
        self.history
            .last()
            .map(|entry| entry.action == history::LEAD_DUPLICATE_ATTEMPT)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_lead_starts_with_created_entry() {
        let lead = Lead::new(
            "Eve".into(),
            "e@example.com".into(),
            "VISA_TOURIST".into(),
            None,
            None,
        );
        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.history.len(), 1);
        assert_eq!(lead.history[0].action, history::LEAD_CREATED);
        assert!(!lead.last_event_is_duplicate());
    }

    #[test]
    fn record_appends_in_order() {
        let mut lead = Lead::new("A".into(), "a@b.c".into(), "S".into(), None, None);
        lead.record(history::LEAD_DUPLICATE_ATTEMPT, Some("public"), None);
        lead.record(history::LEAD_PAYMENT_DECLARED, Some("public"), None);
        let actions: Vec<&str> = lead.history.iter().map(|h| h.action.as_str()).collect();
        assert_eq!(
            actions,
            vec!["CREATED", "DUPLICATE_ATTEMPT", "PAYMENT_DECLARED"]
        );
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            LeadStatus::New,
            LeadStatus::PaymentDeclared,
            LeadStatus::Verified,
            LeadStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<LeadStatus>().unwrap(), status);
        }
        assert!("PENDING".parse::<LeadStatus>().is_err());
    }
}
