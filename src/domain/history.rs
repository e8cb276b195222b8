//! Append-only audit trail embedded in leads and transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Actor recorded for unauthenticated submissions.
pub const ACTOR_PUBLIC: &str = "public";

// Lead history actions.
pub const LEAD_CREATED: &str = "CREATED";
pub const LEAD_DUPLICATE_ATTEMPT: &str = "DUPLICATE_ATTEMPT";
pub const LEAD_PAYMENT_DECLARED: &str = "PAYMENT_DECLARED";
pub const LEAD_PAYMENT_VERIFIED: &str = "PAYMENT_VERIFIED";
pub const LEAD_PAYMENT_REJECTED: &str = "PAYMENT_REJECTED";

// Transaction history actions.
pub const TX_DECLARED: &str = "DECLARED";
pub const TX_VERIFIED: &str = "VERIFIED";
pub const TX_REJECTED: &str = "REJECTED";

/// A single audit event. Entries are only ever appended; insertion order
/// is chronological order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
    pub at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(action: &str, by: Option<&str>, note: Option<String>) -> Self {
        Self {
            action: action.to_string(),
            note,
            by: by.map(str::to_string),
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_carries_action_and_actor() {
        let entry = HistoryEntry::new(LEAD_CREATED, Some(ACTOR_PUBLIC), None);
        assert_eq!(entry.action, "CREATED");
        assert_eq!(entry.by.as_deref(), Some("public"));
        assert!(entry.note.is_none());
    }
}
