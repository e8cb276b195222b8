//! Transaction domain entity.
//! A customer-declared manual payment tied to exactly one lead.

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::history::{self, HistoryEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Declared,
    Verified,
    Rejected,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Declared => "DECLARED",
            TransactionStatus::Verified => "VERIFIED",
            TransactionStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DECLARED" => Ok(TransactionStatus::Declared),
            "VERIFIED" => Ok(TransactionStatus::Verified),
            "REJECTED" => Ok(TransactionStatus::Rejected),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    Upi,
    Bank,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Upi => "UPI",
            PaymentMethod::Bank => "BANK",
            PaymentMethod::Other => "OTHER",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UPI" => Ok(PaymentMethod::Upi),
            "BANK" => Ok(PaymentMethod::Bank),
            "OTHER" => Ok(PaymentMethod::Other),
            other => Err(format!("unknown payment method: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub lead_id: Uuid,
    /// Externally supplied bank/UPI reference. Unique per lead.
    pub transaction_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<BigDecimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<PaymentMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    pub status: TransactionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_by_ip: Option<String>,
    pub history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Creates a freshly declared transaction with its initial `DECLARED`
    /// history entry carrying the customer's remark.
    pub fn declare(
        lead_id: Uuid,
        transaction_ref: String,
        amount: Option<BigDecimal>,
        method: Option<PaymentMethod>,
        remark: Option<String>,
        submitted_by_ip: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            lead_id,
            transaction_ref,
            amount,
            method,
            remark: remark.clone(),
            status: TransactionStatus::Declared,
            verified_by: None,
            verified_at: None,
            verification_note: None,
            submitted_by_ip,
            history: vec![HistoryEntry::new(
                history::TX_DECLARED,
                Some(history::ACTOR_PUBLIC),
                remark,
            )],
            created_at: now,
            updated_at: now,
        }
    }

    pub fn record(&mut self, action: &str, by: Option<&str>, note: Option<String>) {
        self.history.push(HistoryEntry::new(action, by, note));
        self.updated_at = Utc::now();
    }

    /// Terminal once verified or rejected; no further transition exists.
    pub fn is_resolved(&self) -> bool {
        self.status != TransactionStatus::Declared
    }
}
