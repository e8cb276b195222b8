//! Storage ports. Services depend on these traits; adapters implement
//! them for Postgres and for an in-process store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Lead, LeadStatus, ServiceOffering, Setting, Transaction, TransactionStatus};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("uniqueness violation: {0}")]
    Conflict(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// One page of a listing, with the total count before pagination.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    /// Substring match on name or email.
    pub search: Option<String>,
    pub page: i64,
    pub per_page: i64,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub status: Option<TransactionStatus>,
    pub lead_id: Option<Uuid>,
    /// Substring match on the external transaction reference.
    pub search: Option<String>,
    pub page: i64,
    pub per_page: i64,
}

pub fn clamp_paging(page: Option<i64>, per_page: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(20).clamp(1, 100);
    (page, per_page)
}

#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn insert(&self, lead: &Lead) -> RepositoryResult<Lead>;

    async fn update(&self, lead: &Lead) -> RepositoryResult<Lead>;

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Lead>>;

    /// Most recent lead matching (name, email, service) created at or
    /// after `since`. Backs the 24h dedupe window.
    async fn find_recent_match(
        &self,
        name: &str,
        email: &str,
        service: &str,
        since: DateTime<Utc>,
    ) -> RepositoryResult<Option<Lead>>;

    async fn list(&self, filter: &LeadFilter) -> RepositoryResult<Page<Lead>>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Inserts a new transaction. The implementation must enforce
    /// uniqueness of (lead_id, transaction_ref) and return
    /// `RepositoryError::Conflict` when a concurrent insert wins.
    async fn insert(&self, tx: &Transaction) -> RepositoryResult<Transaction>;

    async fn update(&self, tx: &Transaction) -> RepositoryResult<Transaction>;

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Transaction>>;

    async fn find_by_lead_and_ref(
        &self,
        lead_id: Uuid,
        transaction_ref: &str,
    ) -> RepositoryResult<Option<Transaction>>;

    async fn list(&self, filter: &TransactionFilter) -> RepositoryResult<Page<Transaction>>;
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Inserts a new offering. The implementation must enforce
    /// uniqueness of `code` and return `RepositoryError::Conflict` on a
    /// clash.
    async fn insert_service(&self, service: &ServiceOffering) -> RepositoryResult<ServiceOffering>;

    async fn update_service(&self, service: &ServiceOffering) -> RepositoryResult<ServiceOffering>;

    async fn delete_service(&self, id: Uuid) -> RepositoryResult<()>;

    async fn get_service(&self, id: Uuid) -> RepositoryResult<Option<ServiceOffering>>;

    /// All offerings, or only the active ones, ordered by category then
    /// name.
    async fn list_services(&self, active_only: bool) -> RepositoryResult<Vec<ServiceOffering>>;

    async fn upsert_setting(&self, setting: &Setting) -> RepositoryResult<Setting>;

    async fn get_setting(&self, key: &str) -> RepositoryResult<Option<Setting>>;

    async fn delete_setting(&self, key: &str) -> RepositoryResult<()>;

    /// All settings ordered by key.
    async fn list_settings(&self) -> RepositoryResult<Vec<Setting>>;
}
