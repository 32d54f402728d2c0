//! Store applications submitted by merchants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{ApplicationId, ApplicationStatus, BrandColors, StoreId, UserId};

use crate::db::{Document, collections};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreApplication {
    pub id: ApplicationId,
    pub merchant_id: UserId,
    pub merchant_data: MerchantData,
    pub store_config: StoreConfig,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    /// Store created on approval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<StoreId>,
}

impl Document for StoreApplication {
    const COLLECTION: &'static str = collections::APPLICATIONS;

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

impl StoreApplication {
    /// Name the store will get: the chosen store name, else the business
    /// name.
    #[must_use]
    pub fn store_name(&self) -> &str {
        let chosen = self.store_config.customization.store_name.trim();
        if chosen.is_empty() {
            self.merchant_data.business_name.trim()
        } else {
            chosen
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantData {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub city: String,
    pub business_name: String,
    #[serde(default)]
    pub business_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    #[serde(default)]
    pub template: String,
    pub customization: AppliedCustomization,
}

/// The appearance choices made on the application form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCustomization {
    #[serde(default)]
    pub store_name: String,
    #[serde(default)]
    pub store_description: String,
    pub colors: BrandColors,
}

/// Body of an application submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationForm {
    pub merchant_data: MerchantData,
    pub store_config: StoreConfig,
}

/// Application counts by status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ApplicationStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}
