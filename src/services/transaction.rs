//! Transaction lifecycle: idempotent declaration, admin verification,
//! and status propagation to the parent lead.
//!
//! The declare and verify flows each perform two writes (transaction,
//! then lead) without a cross-entity transaction. A crash between the
//! writes leaves the lead status stale until an operator reconciles it.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::{history, Lead, LeadStatus, PaymentMethod, Transaction, TransactionStatus};
use crate::error::AppError;
use crate::ports::{
    LeadRepository, Page, RepositoryError, TransactionFilter, TransactionRepository,
};

#[derive(Debug, Clone)]
pub struct DeclareTransaction {
    pub transaction_ref: String,
    pub amount: Option<BigDecimal>,
    pub method: Option<PaymentMethod>,
    pub remark: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DeclareOutcome {
    pub transaction: Transaction,
    pub lead: Lead,
    /// True when an existing declaration was returned instead of a new
    /// row being created.
    pub deduplicated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyAction {
    Verify,
    Reject,
}

#[derive(Debug, Clone)]
pub struct VerifyOutcome {
    pub transaction: Transaction,
    /// None when the parent lead no longer resolves; the transaction
    /// update stands regardless.
    pub lead: Option<Lead>,
}

#[derive(Clone)]
pub struct TransactionService {
    leads: Arc<dyn LeadRepository>,
    transactions: Arc<dyn TransactionRepository>,
}

impl TransactionService {
    pub fn new(
        leads: Arc<dyn LeadRepository>,
        transactions: Arc<dyn TransactionRepository>,
    ) -> Self {
        Self {
            leads,
            transactions,
        }
    }

    /// Declares a payment against a lead. Idempotent on
    /// (lead_id, transaction_ref): a repeat returns the existing record
    /// with no new row, history entry, or lead mutation.
    pub async fn declare(
        &self,
        lead_id: Uuid,
        payload: DeclareTransaction,
        source_ip: Option<String>,
    ) -> Result<DeclareOutcome, AppError> {
        let mut lead = self
            .leads
            .get_by_id(lead_id)
            .await?
            .ok_or(AppError::LeadNotFound(lead_id))?;

        if let Some(existing) = self
            .transactions
            .find_by_lead_and_ref(lead_id, &payload.transaction_ref)
            .await?
        {
            return Ok(DeclareOutcome {
                transaction: existing,
                lead,
                deduplicated: true,
            });
        }

        let tx = Transaction::declare(
            lead_id,
            payload.transaction_ref.clone(),
            payload.amount,
            payload.method,
            payload.remark,
            source_ip,
        );

        let tx = match self.transactions.insert(&tx).await {
            Ok(tx) => tx,
            // Lost the declare race; the store's uniqueness constraint
            // held, so return the winner.
            Err(RepositoryError::Conflict(_)) => {
                let winner = self
                    .transactions
                    .find_by_lead_and_ref(lead_id, &payload.transaction_ref)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal(format!(
                            "declare conflict for lead {} but no existing row",
                            lead_id
                        ))
                    })?;
                return Ok(DeclareOutcome {
                    transaction: winner,
                    lead,
                    deduplicated: true,
                });
            }
            Err(err) => return Err(err.into()),
        };

        lead.record(
            history::LEAD_PAYMENT_DECLARED,
            Some(history::ACTOR_PUBLIC),
            Some(format!("Transaction {} declared", tx.id)),
        );
        lead.status = LeadStatus::PaymentDeclared;
        let lead = self.leads.update(&lead).await?;

        Ok(DeclareOutcome {
            transaction: tx,
            lead,
            deduplicated: false,
        })
    }

    /// Detail view with the parent lead resolved when it still exists.
    pub async fn get_with_lead(&self, id: Uuid) -> Result<(Transaction, Option<Lead>), AppError> {
        let tx = self
            .transactions
            .get_by_id(id)
            .await?
            .ok_or(AppError::TransactionNotFound(id))?;
        let lead = self.leads.get_by_id(tx.lead_id).await?;
        Ok((tx, lead))
    }

    pub async fn list(&self, filter: &TransactionFilter) -> Result<Page<Transaction>, AppError> {
        Ok(self.transactions.list(filter).await?)
    }

    /// Resolves a declared payment. Guarded transition: only
    /// DECLARED -> {VERIFIED, REJECTED}; resolving an already-terminal
    /// transaction fails with a conflict rather than overwriting it.
    pub async fn verify(
        &self,
        id: Uuid,
        admin: &AdminActor,
        action: VerifyAction,
        note: Option<String>,
    ) -> Result<VerifyOutcome, AppError> {
        let mut tx = self
            .transactions
            .get_by_id(id)
            .await?
            .ok_or(AppError::TransactionNotFound(id))?;

        if tx.is_resolved() {
            return Err(AppError::AlreadyResolved(id));
        }

        let actor = admin.actor();
        let now = Utc::now();

        let (tx_status, tx_action, lead_status, lead_action) = match action {
            VerifyAction::Verify => (
                TransactionStatus::Verified,
                history::TX_VERIFIED,
                LeadStatus::Verified,
                history::LEAD_PAYMENT_VERIFIED,
            ),
            VerifyAction::Reject => (
                TransactionStatus::Rejected,
                history::TX_REJECTED,
                LeadStatus::Rejected,
                history::LEAD_PAYMENT_REJECTED,
            ),
        };

        tx.status = tx_status;
        tx.verified_by = Some(actor.clone());
        tx.verified_at = Some(now);
        tx.verification_note = note.clone();
        tx.record(tx_action, Some(&actor), note.clone());
        let tx = self.transactions.update(&tx).await?;

        // A deleted parent lead is not an error; the transaction outcome
        // stands and the lead update is skipped.
        let lead = match self.leads.get_by_id(tx.lead_id).await? {
            Some(mut lead) => {
                lead.status = lead_status;
                lead.record(lead_action, Some(&actor), note);
                Some(self.leads.update(&lead).await?)
            }
            None => None,
        };

        Ok(VerifyOutcome {
            transaction: tx,
            lead,
        })
    }
}

/// Admin identity used as the history actor for verification events.
#[derive(Debug, Clone)]
pub struct AdminActor {
    pub id: String,
    pub email: Option<String>,
}

impl AdminActor {
    pub fn actor(&self) -> String {
        self.email.clone().unwrap_or_else(|| self.id.clone())
    }
}
