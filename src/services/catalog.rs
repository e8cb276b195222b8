//! Service catalog and app settings management, plus the aggregated
//! public configuration the lead wizard loads on startup.

use std::collections::BTreeMap;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{ServiceCategory, ServiceOffering, Setting};
use crate::error::AppError;
use crate::ports::{CatalogRepository, RepositoryError};

/// Setting keys surfaced through the public configuration.
pub const SETTING_UPI_ID: &str = "payment.upiId";
pub const SETTING_UPI_QR_IMAGE: &str = "payment.upiQrImage";
pub const SETTING_SUPPORT_EMAIL: &str = "contact.supportEmail";

#[derive(Debug, Clone)]
pub struct ServiceInput {
    pub code: String,
    pub name: String,
    pub category: ServiceCategory,
    pub price: BigDecimal,
    pub description: Option<String>,
    pub active: bool,
}

/// Public projection of the catalog plus the payment and contact
/// settings. Inactive services never appear here.
#[derive(Debug, Clone, Serialize)]
pub struct PublicConfig {
    pub categories: Vec<CategoryConfig>,
    pub payment: PaymentConfig,
    pub contact: ContactConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryConfig {
    pub key: ServiceCategory,
    pub services: Vec<PublicService>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicService {
    pub code: String,
    pub name: String,
    pub price: BigDecimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upi_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upi_qr_image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_email: Option<String>,
}

#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    pub async fn list_services(&self) -> Result<Vec<ServiceOffering>, AppError> {
        Ok(self.catalog.list_services(false).await?)
    }

    pub async fn create_service(&self, input: ServiceInput) -> Result<ServiceOffering, AppError> {
        let service = ServiceOffering::new(
            input.code,
            input.name,
            input.category,
            input.price,
            input.description,
            input.active,
        );
        match self.catalog.insert_service(&service).await {
            Ok(service) => Ok(service),
            Err(RepositoryError::Conflict(_)) => Err(AppError::ServiceCodeTaken(service.code)),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn update_service(
        &self,
        id: Uuid,
        input: ServiceInput,
    ) -> Result<ServiceOffering, AppError> {
        let mut service = self
            .catalog
            .get_service(id)
            .await?
            .ok_or(AppError::ServiceNotFound(id))?;

        service.code = input.code;
        service.name = input.name;
        service.category = input.category;
        service.price = input.price;
        service.description = input.description;
        service.active = input.active;
        service.updated_at = chrono::Utc::now();

        match self.catalog.update_service(&service).await {
            Ok(service) => Ok(service),
            Err(RepositoryError::Conflict(_)) => Err(AppError::ServiceCodeTaken(service.code)),
            Err(RepositoryError::NotFound(_)) => Err(AppError::ServiceNotFound(id)),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn delete_service(&self, id: Uuid) -> Result<(), AppError> {
        match self.catalog.delete_service(id).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound(_)) => Err(AppError::ServiceNotFound(id)),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn list_settings(&self) -> Result<Vec<Setting>, AppError> {
        Ok(self.catalog.list_settings().await?)
    }

    pub async fn upsert_setting(
        &self,
        key: String,
        value: String,
        description: Option<String>,
    ) -> Result<Setting, AppError> {
        let setting = Setting::new(key, value, description);
        Ok(self.catalog.upsert_setting(&setting).await?)
    }

    pub async fn delete_setting(&self, key: &str) -> Result<(), AppError> {
        match self.catalog.delete_setting(key).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound(_)) => Err(AppError::SettingNotFound(key.to_string())),
            Err(err) => Err(err.into()),
        }
    }

    /// Active services grouped by category, plus the payment/contact
    /// settings under their well-known keys.
    pub async fn public_config(&self) -> Result<PublicConfig, AppError> {
        let services = self.catalog.list_services(true).await?;
        let settings = self.catalog.list_settings().await?;
        let mut values: BTreeMap<String, String> = settings
            .into_iter()
            .map(|setting| (setting.key, setting.value))
            .collect();

        let mut grouped: BTreeMap<ServiceCategory, Vec<PublicService>> = BTreeMap::new();
        for service in services {
            grouped
                .entry(service.category)
                .or_default()
                .push(PublicService {
                    code: service.code,
                    name: service.name,
                    price: service.price,
                    description: service.description,
                });
        }

        Ok(PublicConfig {
            categories: grouped
                .into_iter()
                .map(|(key, services)| CategoryConfig { key, services })
                .collect(),
            payment: PaymentConfig {
                upi_id: values.remove(SETTING_UPI_ID),
                upi_qr_image: values.remove(SETTING_UPI_QR_IMAGE),
            },
            contact: ContactConfig {
                support_email: values.remove(SETTING_SUPPORT_EMAIL),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryCatalogRepository;

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(MemoryCatalogRepository::new()))
    }

    fn input(code: &str, category: ServiceCategory, active: bool) -> ServiceInput {
        ServiceInput {
            code: code.into(),
            name: format!("{} service", code),
            category,
            price: BigDecimal::from(999),
            description: None,
            active,
        }
    }

    #[tokio::test]
    async fn duplicate_code_is_a_domain_conflict() {
        let catalog = service();
        catalog
            .create_service(input("VISA_TOURIST", ServiceCategory::Visa, true))
            .await
            .unwrap();
        let err = catalog
            .create_service(input("VISA_TOURIST", ServiceCategory::Visa, true))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ServiceCodeTaken(_)));
    }

    #[tokio::test]
    async fn update_unknown_service_fails() {
        let catalog = service();
        let err = catalog
            .update_service(
                Uuid::new_v4(),
                input("VISA_TOURIST", ServiceCategory::Visa, true),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ServiceNotFound(_)));
    }

    #[tokio::test]
    async fn delete_unknown_setting_fails() {
        let catalog = service();
        let err = catalog.delete_setting("payment.upiId").await.unwrap_err();
        assert!(matches!(err, AppError::SettingNotFound(_)));
    }

    #[tokio::test]
    async fn public_config_groups_active_services_and_reads_settings() {
        let catalog = service();
        catalog
            .create_service(input("VISA_TOURIST", ServiceCategory::Visa, true))
            .await
            .unwrap();
        catalog
            .create_service(input("VISA_WORK", ServiceCategory::Visa, false))
            .await
            .unwrap();
        catalog
            .create_service(input("SOP_REVIEW", ServiceCategory::Documents, true))
            .await
            .unwrap();
        catalog
            .upsert_setting(SETTING_UPI_ID.into(), "ops@upi".into(), None)
            .await
            .unwrap();
        catalog
            .upsert_setting(SETTING_SUPPORT_EMAIL.into(), "help@example.com".into(), None)
            .await
            .unwrap();

        let config = catalog.public_config().await.unwrap();

        assert_eq!(config.categories.len(), 2);
        let visa = config
            .categories
            .iter()
            .find(|c| c.key == ServiceCategory::Visa)
            .unwrap();
        assert_eq!(visa.services.len(), 1);
        assert_eq!(visa.services[0].code, "VISA_TOURIST");

        assert_eq!(config.payment.upi_id.as_deref(), Some("ops@upi"));
        assert!(config.payment.upi_qr_image.is_none());
        assert_eq!(
            config.contact.support_email.as_deref(),
            Some("help@example.com")
        );
    }
}
