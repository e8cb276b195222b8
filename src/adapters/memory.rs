//! In-process implementations of the storage ports. Used by the test
//! suites and as the fallback store when no database is configured.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{Lead, ServiceOffering, Setting, Transaction};
use crate::ports::{
    CatalogRepository, LeadFilter, LeadRepository, Page, RepositoryError, RepositoryResult,
    TransactionFilter, TransactionRepository,
};

#[derive(Default)]
pub struct MemoryLeadRepository {
    leads: RwLock<HashMap<Uuid, Lead>>,
}

impl MemoryLeadRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeadRepository for MemoryLeadRepository {
    async fn insert(&self, lead: &Lead) -> RepositoryResult<Lead> {
        let mut leads = self.leads.write().await;
        leads.insert(lead.id, lead.clone());
        Ok(lead.clone())
    }

    async fn update(&self, lead: &Lead) -> RepositoryResult<Lead> {
        let mut leads = self.leads.write().await;
        if !leads.contains_key(&lead.id) {
            return Err(RepositoryError::NotFound(lead.id.to_string()));
        }
        leads.insert(lead.id, lead.clone());
        Ok(lead.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Lead>> {
        Ok(self.leads.read().await.get(&id).cloned())
    }

    async fn find_recent_match(
        &self,
        name: &str,
        email: &str,
        service: &str,
        since: DateTime<Utc>,
    ) -> RepositoryResult<Option<Lead>> {
        let leads = self.leads.read().await;
        let found = leads
            .values()
            .filter(|lead| {
                lead.name == name
                    && lead.email == email
                    && lead.service == service
                    && lead.created_at >= since
            })
            .max_by_key(|lead| lead.created_at)
            .cloned();
        Ok(found)
    }

    async fn list(&self, filter: &LeadFilter) -> RepositoryResult<Page<Lead>> {
        let leads = self.leads.read().await;
        let needle = filter.search.as_ref().map(|s| s.to_lowercase());
        let mut matched: Vec<Lead> = leads
            .values()
            .filter(|lead| {
                filter.status.map_or(true, |status| lead.status == status)
                    && needle.as_ref().map_or(true, |n| {
                        lead.name.to_lowercase().contains(n)
                            || lead.email.to_lowercase().contains(n)
                    })
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(matched, filter.page, filter.per_page))
    }
}

#[derive(Default)]
pub struct MemoryTransactionRepository {
    transactions: RwLock<HashMap<Uuid, Transaction>>,
}

impl MemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionRepository for MemoryTransactionRepository {
    async fn insert(&self, tx: &Transaction) -> RepositoryResult<Transaction> {
        let mut transactions = self.transactions.write().await;
        // Uniqueness of (lead_id, transaction_ref) is checked under the
        // write lock, mirroring the Postgres unique index.
        let clash = transactions.values().any(|existing| {
            existing.lead_id == tx.lead_id && existing.transaction_ref == tx.transaction_ref
        });
        if clash {
            return Err(RepositoryError::Conflict(format!(
                "transaction {} already declared for lead {}",
                tx.transaction_ref, tx.lead_id
            )));
        }
        transactions.insert(tx.id, tx.clone());
        Ok(tx.clone())
    }

    async fn update(&self, tx: &Transaction) -> RepositoryResult<Transaction> {
        let mut transactions = self.transactions.write().await;
        if !transactions.contains_key(&tx.id) {
            return Err(RepositoryError::NotFound(tx.id.to_string()));
        }
        transactions.insert(tx.id, tx.clone());
        Ok(tx.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Transaction>> {
        Ok(self.transactions.read().await.get(&id).cloned())
    }

    async fn find_by_lead_and_ref(
        &self,
        lead_id: Uuid,
        transaction_ref: &str,
    ) -> RepositoryResult<Option<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .values()
            .find(|tx| tx.lead_id == lead_id && tx.transaction_ref == transaction_ref)
            .cloned())
    }

    async fn list(&self, filter: &TransactionFilter) -> RepositoryResult<Page<Transaction>> {
        let transactions = self.transactions.read().await;
        let needle = filter.search.as_ref().map(|s| s.to_lowercase());
        let mut matched: Vec<Transaction> = transactions
            .values()
            .filter(|tx| {
                filter.status.map_or(true, |status| tx.status == status)
                    && filter.lead_id.map_or(true, |id| tx.lead_id == id)
                    && needle
                        .as_ref()
                        .map_or(true, |n| tx.transaction_ref.to_lowercase().contains(n))
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(matched, filter.page, filter.per_page))
    }
}

#[derive(Default)]
pub struct MemoryCatalogRepository {
    services: RwLock<HashMap<Uuid, ServiceOffering>>,
    settings: RwLock<BTreeMap<String, Setting>>,
}

impl MemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogRepository for MemoryCatalogRepository {
    async fn insert_service(&self, service: &ServiceOffering) -> RepositoryResult<ServiceOffering> {
        let mut services = self.services.write().await;
        // Code uniqueness checked under the write lock, mirroring the
        // Postgres unique index.
        if services.values().any(|existing| existing.code == service.code) {
            return Err(RepositoryError::Conflict(format!(
                "service code {} already exists",
                service.code
            )));
        }
        services.insert(service.id, service.clone());
        Ok(service.clone())
    }

    async fn update_service(&self, service: &ServiceOffering) -> RepositoryResult<ServiceOffering> {
        let mut services = self.services.write().await;
        if !services.contains_key(&service.id) {
            return Err(RepositoryError::NotFound(service.id.to_string()));
        }
        if services
            .values()
            .any(|existing| existing.id != service.id && existing.code == service.code)
        {
            return Err(RepositoryError::Conflict(format!(
                "service code {} already exists",
                service.code
            )));
        }
        services.insert(service.id, service.clone());
        Ok(service.clone())
    }

    async fn delete_service(&self, id: Uuid) -> RepositoryResult<()> {
        let mut services = self.services.write().await;
        services
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn get_service(&self, id: Uuid) -> RepositoryResult<Option<ServiceOffering>> {
        Ok(self.services.read().await.get(&id).cloned())
    }

    async fn list_services(&self, active_only: bool) -> RepositoryResult<Vec<ServiceOffering>> {
        let services = self.services.read().await;
        let mut matched: Vec<ServiceOffering> = services
            .values()
            .filter(|service| !active_only || service.active)
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.category.cmp(&b.category).then(a.name.cmp(&b.name)));
        Ok(matched)
    }

    async fn upsert_setting(&self, setting: &Setting) -> RepositoryResult<Setting> {
        let mut settings = self.settings.write().await;
        settings.insert(setting.key.clone(), setting.clone());
        Ok(setting.clone())
    }

    async fn get_setting(&self, key: &str) -> RepositoryResult<Option<Setting>> {
        Ok(self.settings.read().await.get(key).cloned())
    }

    async fn delete_setting(&self, key: &str) -> RepositoryResult<()> {
        let mut settings = self.settings.write().await;
        settings
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(key.to_string()))
    }

    async fn list_settings(&self) -> RepositoryResult<Vec<Setting>> {
        Ok(self.settings.read().await.values().cloned().collect())
    }
}

fn paginate<T>(items: Vec<T>, page: i64, per_page: i64) -> Page<T> {
    let total = items.len() as i64;
    let page = page.max(1);
    let per_page = per_page.max(1);
    let offset = ((page - 1) * per_page) as usize;
    let items = items
        .into_iter()
        .skip(offset)
        .take(per_page as usize)
        .collect();
    Page {
        items,
        total,
        page,
        per_page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LeadStatus;
    use chrono::Duration;

    fn lead(name: &str, email: &str) -> Lead {
        Lead::new(name.into(), email.into(), "VISA_TOURIST".into(), None, None)
    }

    #[tokio::test]
    async fn recent_match_respects_window() {
        let repo = MemoryLeadRepository::new();
        let mut old = lead("Eve", "e@example.com");
        old.created_at = Utc::now() - Duration::hours(25);
        repo.insert(&old).await.unwrap();

        let since = Utc::now() - Duration::hours(24);
        let found = repo
            .find_recent_match("Eve", "e@example.com", "VISA_TOURIST", since)
            .await
            .unwrap();
        assert!(found.is_none());

        let fresh = lead("Eve", "e@example.com");
        repo.insert(&fresh).await.unwrap();
        let found = repo
            .find_recent_match("Eve", "e@example.com", "VISA_TOURIST", since)
            .await
            .unwrap();
        assert_eq!(found.unwrap().id, fresh.id);
    }

    #[tokio::test]
    async fn duplicate_reference_insert_conflicts() {
        let repo = MemoryTransactionRepository::new();
        let lead_id = Uuid::new_v4();
        let first = Transaction::declare(lead_id, "TX-1".into(), None, None, None, None);
        repo.insert(&first).await.unwrap();

        let second = Transaction::declare(lead_id, "TX-1".into(), None, None, None, None);
        let err = repo.insert(&second).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        // Same reference on another lead is fine.
        let other = Transaction::declare(Uuid::new_v4(), "TX-1".into(), None, None, None, None);
        repo.insert(&other).await.unwrap();
    }

    #[tokio::test]
    async fn list_filters_and_paginates() {
        let repo = MemoryLeadRepository::new();
        for i in 0..5 {
            let mut l = lead(&format!("User{}", i), &format!("u{}@example.com", i));
            l.created_at = Utc::now() - Duration::minutes(i);
            if i == 0 {
                l.status = LeadStatus::Verified;
            }
            repo.insert(&l).await.unwrap();
        }

        let page = repo
            .list(&LeadFilter {
                status: Some(LeadStatus::Verified),
                search: None,
                page: 1,
                per_page: 10,
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);

        let page = repo
            .list(&LeadFilter {
                status: None,
                search: Some("u3@".into()),
                page: 1,
                per_page: 10,
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].email, "u3@example.com");

        let page = repo
            .list(&LeadFilter {
                status: None,
                search: None,
                page: 2,
                per_page: 2,
            })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
    }

    use crate::domain::catalog::ServiceCategory;
    use bigdecimal::BigDecimal;

    fn offering(code: &str, active: bool) -> ServiceOffering {
        ServiceOffering::new(
            code.into(),
            code.to_lowercase(),
            ServiceCategory::Visa,
            BigDecimal::from(100),
            None,
            active,
        )
    }

    #[tokio::test]
    async fn duplicate_service_code_conflicts() {
        let repo = MemoryCatalogRepository::new();
        repo.insert_service(&offering("VISA_TOURIST", true))
            .await
            .unwrap();
        let err = repo
            .insert_service(&offering("VISA_TOURIST", true))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        // Renaming one service onto another's code also conflicts.
        let second = repo.insert_service(&offering("VISA_WORK", true)).await.unwrap();
        let mut renamed = second.clone();
        renamed.code = "VISA_TOURIST".into();
        let err = repo.update_service(&renamed).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn service_listing_can_exclude_inactive() {
        let repo = MemoryCatalogRepository::new();
        repo.insert_service(&offering("VISA_TOURIST", true))
            .await
            .unwrap();
        repo.insert_service(&offering("VISA_WORK", false))
            .await
            .unwrap();

        assert_eq!(repo.list_services(false).await.unwrap().len(), 2);
        let active = repo.list_services(true).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].code, "VISA_TOURIST");
    }

    #[tokio::test]
    async fn settings_upsert_and_delete() {
        let repo = MemoryCatalogRepository::new();
        repo.upsert_setting(&Setting::new("payment.upiId".into(), "a@upi".into(), None))
            .await
            .unwrap();
        repo.upsert_setting(&Setting::new("payment.upiId".into(), "b@upi".into(), None))
            .await
            .unwrap();

        let settings = repo.list_settings().await.unwrap();
        assert_eq!(settings.len(), 1);
        assert_eq!(settings[0].value, "b@upi");

        repo.delete_setting("payment.upiId").await.unwrap();
        let err = repo.delete_setting("payment.upiId").await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }
}
