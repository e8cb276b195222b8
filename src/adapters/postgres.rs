//! Postgres implementations of the storage ports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::{HistoryEntry, Lead, ServiceOffering, Setting, Transaction};
use crate::ports::{
    CatalogRepository, LeadFilter, LeadRepository, Page, RepositoryError, RepositoryResult,
    TransactionFilter, TransactionRepository,
};

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound(err.to_string()),
            sqlx::Error::Database(db)
                if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
            {
                RepositoryError::Conflict(err.to_string())
            }
            _ => RepositoryError::Backend(err.to_string()),
        }
    }
}

fn encode_history(history: &[HistoryEntry]) -> RepositoryResult<serde_json::Value> {
    serde_json::to_value(history).map_err(|e| RepositoryError::Backend(e.to_string()))
}

fn decode_history(value: serde_json::Value) -> RepositoryResult<Vec<HistoryEntry>> {
    serde_json::from_value(value).map_err(|e| RepositoryError::Backend(e.to_string()))
}

#[derive(Clone)]
pub struct PostgresLeadRepository {
    pool: PgPool,
}

impl PostgresLeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadRepository for PostgresLeadRepository {
    async fn insert(&self, lead: &Lead) -> RepositoryResult<Lead> {
        let row = sqlx::query_as::<_, LeadRow>(
            r#"
            INSERT INTO leads (
                id, name, email, phone, service, notes, status, history,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, name, email, phone, service, notes, status, history,
                created_at, updated_at
            "#,
        )
        .bind(lead.id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.service)
        .bind(&lead.notes)
        .bind(lead.status.as_str())
        .bind(encode_history(&lead.history)?)
        .bind(lead.created_at)
        .bind(lead.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_domain()
    }

    async fn update(&self, lead: &Lead) -> RepositoryResult<Lead> {
        let row = sqlx::query_as::<_, LeadRow>(
            r#"
            UPDATE leads
            SET name = $2, email = $3, phone = $4, service = $5, notes = $6,
                status = $7, history = $8, updated_at = $9
            WHERE id = $1
            RETURNING id, name, email, phone, service, notes, status, history,
                created_at, updated_at
            "#,
        )
        .bind(lead.id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.service)
        .bind(&lead.notes)
        .bind(lead.status.as_str())
        .bind(encode_history(&lead.history)?)
        .bind(lead.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| RepositoryError::NotFound(lead.id.to_string()))?
            .into_domain()
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Lead>> {
        let row = sqlx::query_as::<_, LeadRow>("SELECT * FROM leads WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(LeadRow::into_domain).transpose()
    }

    async fn find_recent_match(
        &self,
        name: &str,
        email: &str,
        service: &str,
        since: DateTime<Utc>,
    ) -> RepositoryResult<Option<Lead>> {
        let row = sqlx::query_as::<_, LeadRow>(
            r#"
            SELECT * FROM leads
            WHERE name = $1 AND email = $2 AND service = $3 AND created_at >= $4
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(service)
        .bind(since)
        .fetch_optional(&self.pool)
        .await?;

        row.map(LeadRow::into_domain).transpose()
    }

    async fn list(&self, filter: &LeadFilter) -> RepositoryResult<Page<Lead>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM leads WHERE 1=1");
        push_lead_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM leads WHERE 1=1");
        push_lead_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.per_page)
            .push(" OFFSET ")
            .push_bind((filter.page - 1) * filter.per_page);
        let rows: Vec<LeadRow> = query.build_query_as().fetch_all(&self.pool).await?;

        let items = rows
            .into_iter()
            .map(LeadRow::into_domain)
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok(Page {
            items,
            total,
            page: filter.page,
            per_page: filter.per_page,
        })
    }
}

fn push_lead_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &LeadFilter) {
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LeadRow {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    service: String,
    notes: Option<String>,
    status: String,
    history: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LeadRow {
    fn into_domain(self) -> RepositoryResult<Lead> {
        Ok(Lead {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            service: self.service,
            notes: self.notes,
            status: self.status.parse().map_err(RepositoryError::Backend)?,
            history: decode_history(self.history)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn insert(&self, tx: &Transaction) -> RepositoryResult<Transaction> {
        // The unique index on (lead_id, transaction_ref) turns a lost
        // declare race into RepositoryError::Conflict.
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (
                id, lead_id, transaction_ref, amount, method, remark, status,
                verified_by, verified_at, verification_note, submitted_by_ip,
                history, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id, lead_id, transaction_ref, amount, method, remark, status,
                verified_by, verified_at, verification_note, submitted_by_ip,
                history, created_at, updated_at
            "#,
        )
        .bind(tx.id)
        .bind(tx.lead_id)
        .bind(&tx.transaction_ref)
        .bind(&tx.amount)
        .bind(tx.method.map(|m| m.as_str()))
        .bind(&tx.remark)
        .bind(tx.status.as_str())
        .bind(&tx.verified_by)
        .bind(tx.verified_at)
        .bind(&tx.verification_note)
        .bind(&tx.submitted_by_ip)
        .bind(encode_history(&tx.history)?)
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_domain()
    }

    async fn update(&self, tx: &Transaction) -> RepositoryResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            UPDATE transactions
            SET status = $2, verified_by = $3, verified_at = $4,
                verification_note = $5, history = $6, updated_at = $7
            WHERE id = $1
            RETURNING id, lead_id, transaction_ref, amount, method, remark, status,
                verified_by, verified_at, verification_note, submitted_by_ip,
                history, created_at, updated_at
            "#,
        )
        .bind(tx.id)
        .bind(tx.status.as_str())
        .bind(&tx.verified_by)
        .bind(tx.verified_at)
        .bind(&tx.verification_note)
        .bind(encode_history(&tx.history)?)
        .bind(tx.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| RepositoryError::NotFound(tx.id.to_string()))?
            .into_domain()
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>("SELECT * FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TransactionRow::into_domain).transpose()
    }

    async fn find_by_lead_and_ref(
        &self,
        lead_id: Uuid,
        transaction_ref: &str,
    ) -> RepositoryResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions WHERE lead_id = $1 AND transaction_ref = $2",
        )
        .bind(lead_id)
        .bind(transaction_ref)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TransactionRow::into_domain).transpose()
    }

    async fn list(&self, filter: &TransactionFilter) -> RepositoryResult<Page<Transaction>> {
        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM transactions WHERE 1=1");
        push_transaction_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM transactions WHERE 1=1");
        push_transaction_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.per_page)
            .push(" OFFSET ")
            .push_bind((filter.page - 1) * filter.per_page);
        let rows: Vec<TransactionRow> = query.build_query_as().fetch_all(&self.pool).await?;

        let items = rows
            .into_iter()
            .map(TransactionRow::into_domain)
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok(Page {
            items,
            total,
            page: filter.page,
            per_page: filter.per_page,
        })
    }
}

fn push_transaction_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &TransactionFilter) {
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(lead_id) = filter.lead_id {
        builder.push(" AND lead_id = ").push_bind(lead_id);
    }
    if let Some(search) = &filter.search {
        builder
            .push(" AND transaction_ref ILIKE ")
            .push_bind(format!("%{}%", search));
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    lead_id: Uuid,
    transaction_ref: String,
    amount: Option<bigdecimal::BigDecimal>,
    method: Option<String>,
    remark: Option<String>,
    status: String,
    verified_by: Option<String>,
    verified_at: Option<DateTime<Utc>>,
    verification_note: Option<String>,
    submitted_by_ip: Option<String>,
    history: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PostgresCatalogRepository {
    pool: PgPool,
}

impl PostgresCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for PostgresCatalogRepository {
    async fn insert_service(&self, service: &ServiceOffering) -> RepositoryResult<ServiceOffering> {
        // The unique index on code turns a duplicate into
        // RepositoryError::Conflict.
        let row = sqlx::query_as::<_, ServiceRow>(
            r#"
            INSERT INTO services (
                id, code, name, category, price, description, active,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, code, name, category, price, description, active,
                created_at, updated_at
            "#,
        )
        .bind(service.id)
        .bind(&service.code)
        .bind(&service.name)
        .bind(service.category.as_str())
        .bind(&service.price)
        .bind(&service.description)
        .bind(service.active)
        .bind(service.created_at)
        .bind(service.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_domain()
    }

    async fn update_service(&self, service: &ServiceOffering) -> RepositoryResult<ServiceOffering> {
        let row = sqlx::query_as::<_, ServiceRow>(
            r#"
            UPDATE services
            SET code = $2, name = $3, category = $4, price = $5,
                description = $6, active = $7, updated_at = $8
            WHERE id = $1
            RETURNING id, code, name, category, price, description, active,
                created_at, updated_at
            "#,
        )
        .bind(service.id)
        .bind(&service.code)
        .bind(&service.name)
        .bind(service.category.as_str())
        .bind(&service.price)
        .bind(&service.description)
        .bind(service.active)
        .bind(service.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| RepositoryError::NotFound(service.id.to_string()))?
            .into_domain()
    }

    async fn delete_service(&self, id: Uuid) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn get_service(&self, id: Uuid) -> RepositoryResult<Option<ServiceOffering>> {
        let row = sqlx::query_as::<_, ServiceRow>("SELECT * FROM services WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ServiceRow::into_domain).transpose()
    }

    async fn list_services(&self, active_only: bool) -> RepositoryResult<Vec<ServiceOffering>> {
        let sql = if active_only {
            "SELECT * FROM services WHERE active ORDER BY category, name"
        } else {
            "SELECT * FROM services ORDER BY category, name"
        };
        let rows: Vec<ServiceRow> = sqlx::query_as(sql).fetch_all(&self.pool).await?;

        rows.into_iter().map(ServiceRow::into_domain).collect()
    }

    async fn upsert_setting(&self, setting: &Setting) -> RepositoryResult<Setting> {
        let row = sqlx::query_as::<_, SettingRow>(
            r#"
            INSERT INTO settings (key, value, description, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, description = EXCLUDED.description,
                updated_at = EXCLUDED.updated_at
            RETURNING key, value, description, updated_at
            "#,
        )
        .bind(&setting.key)
        .bind(&setting.value)
        .bind(&setting.description)
        .bind(setting.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_domain())
    }

    async fn get_setting(&self, key: &str) -> RepositoryResult<Option<Setting>> {
        let row = sqlx::query_as::<_, SettingRow>("SELECT * FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(SettingRow::into_domain))
    }

    async fn delete_setting(&self, key: &str) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM settings WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(key.to_string()));
        }
        Ok(())
    }

    async fn list_settings(&self) -> RepositoryResult<Vec<Setting>> {
        let rows: Vec<SettingRow> = sqlx::query_as("SELECT * FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(SettingRow::into_domain).collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: Uuid,
    code: String,
    name: String,
    category: String,
    price: bigdecimal::BigDecimal,
    description: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ServiceRow {
    fn into_domain(self) -> RepositoryResult<ServiceOffering> {
        Ok(ServiceOffering {
            id: self.id,
            code: self.code,
            name: self.name,
            category: self.category.parse().map_err(RepositoryError::Backend)?,
            price: self.price,
            description: self.description,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SettingRow {
    key: String,
    value: String,
    description: Option<String>,
    updated_at: DateTime<Utc>,
}

impl SettingRow {
    fn into_domain(self) -> Setting {
        Setting {
            key: self.key,
            value: self.value,
            description: self.description,
            updated_at: self.updated_at,
        }
    }
}

impl TransactionRow {
    fn into_domain(self) -> RepositoryResult<Transaction> {
        let method = self
            .method
            .map(|m| m.parse().map_err(RepositoryError::Backend))
            .transpose()?;
        Ok(Transaction {
            id: self.id,
            lead_id: self.lead_id,
            transaction_ref: self.transaction_ref,
            amount: self.amount,
            method,
            remark: self.remark,
            status: self.status.parse().map_err(RepositoryError::Backend)?,
            verified_by: self.verified_by,
            verified_at: self.verified_at,
            verification_note: self.verification_note,
            submitted_by_ip: self.submitted_by_ip,
            history: decode_history(self.history)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
