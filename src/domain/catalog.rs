//! Sellable service catalog and key/value app settings. Together they
//! feed the public wizard configuration.

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Documents,
    Profile,
    Visa,
}

impl ServiceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Documents => "documents",
            ServiceCategory::Profile => "profile",
            ServiceCategory::Visa => "visa",
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "documents" => Ok(ServiceCategory::Documents),
            "profile" => Ok(ServiceCategory::Profile),
            "visa" => Ok(ServiceCategory::Visa),
            other => Err(format!("unknown service category: {}", other)),
        }
    }
}

/// One sellable service. `code` is the stable identifier leads carry in
/// their free-form `service` field; unique across the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOffering {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub category: ServiceCategory,
    pub price: BigDecimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceOffering {
    pub fn new(
        code: String,
        name: String,
        category: ServiceCategory,
        price: BigDecimal,
        description: Option<String>,
        active: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            code,
            name,
            category,
            price,
            description,
            active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// App-level key/value setting, keyed by a dotted name such as
/// `payment.upiId`. Upserted whole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    pub key: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Setting {
    pub fn new(key: String, value: String, description: Option<String>) -> Self {
        Self {
            key,
            value,
            description,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_str() {
        for category in [
            ServiceCategory::Documents,
            ServiceCategory::Profile,
            ServiceCategory::Visa,
        ] {
            assert_eq!(category.as_str().parse::<ServiceCategory>(), Ok(category));
        }
        assert!("invoices".parse::<ServiceCategory>().is_err());
    }

    #[test]
    fn new_offering_starts_with_matching_timestamps() {
        let offering = ServiceOffering::new(
            "VISA_TOURIST".into(),
            "Tourist Visa SOP".into(),
            ServiceCategory::Visa,
            BigDecimal::from(999),
            None,
            true,
        );
        assert_eq!(offering.created_at, offering.updated_at);
        assert!(offering.active);
    }
}
