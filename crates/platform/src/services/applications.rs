//! Store application review.
//!
//! A merchant submits one application at a time. An admin approves it
//! (which opens the store) or rejects it with a reason; either decision is
//! final. A rejected merchant may apply again.

use chrono::Utc;
use tracing::{info, warn};

use bazaar_core::{
    ApplicationId, ApplicationStatus, Email, StoreCustomization, StoreSettings, Subdomain, UserId,
    is_hex_color,
};

use super::{ServiceError, ServiceResult, StoreService, SyncEvent, SyncHub, require};
use crate::db::{DocumentStore, Repository};
use crate::models::store::{DEFAULT_STORE_DESCRIPTION, DEFAULT_TEMPLATE};
use crate::models::{ApplicationForm, ApplicationStats, Store, StoreApplication, StoreDraft};

/// Application service.
pub struct ApplicationService<'a> {
    applications: Repository<'a, StoreApplication>,
    stores: StoreService<'a>,
    sync: &'a SyncHub,
}

impl<'a> ApplicationService<'a> {
    #[must_use]
    pub fn new(docs: &'a dyn DocumentStore, sync: &'a SyncHub) -> Self {
        Self {
            applications: Repository::new(docs),
            stores: StoreService::new(docs, sync),
            sync,
        }
    }

    /// Submit a new application for review.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Invalid` for missing or malformed fields and
    /// `ServiceError::Conflict` if the merchant already has a pending or
    /// approved application.
    pub async fn submit(
        &self,
        merchant_id: &UserId,
        form: ApplicationForm,
    ) -> ServiceResult<StoreApplication> {
        validate_form(&form)?;

        let open = self
            .applications
            .find_by("merchantId", merchant_id)
            .await?
            .into_iter()
            .any(|a| a.status != ApplicationStatus::Rejected);
        if open {
            return Err(ServiceError::Conflict(
                "merchant already has a pending or approved application".to_owned(),
            ));
        }

        let application = StoreApplication {
            id: ApplicationId::generate(),
            merchant_id: merchant_id.clone(),
            merchant_data: form.merchant_data,
            store_config: form.store_config,
            status: ApplicationStatus::Pending,
            submitted_at: Utc::now(),
            reviewed_at: None,
            reviewed_by: None,
            rejection_reason: None,
            store_id: None,
        };
        self.applications.insert(&application).await?;

        info!(application_id = %application.id, merchant_id = %merchant_id, "Application submitted");
        self.sync.publish(SyncEvent::ApplicationSubmitted {
            application_id: application.id.clone(),
        });
        Ok(application)
    }

    /// Applications, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the applications cannot be loaded.
    pub async fn list(
        &self,
        status: Option<ApplicationStatus>,
    ) -> ServiceResult<Vec<StoreApplication>> {
        let mut applications = match status {
            Some(status) => self.applications.find_by("status", status).await?,
            None => self.applications.list().await?,
        };
        applications.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(applications)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the lookup fails.
    pub async fn get(&self, id: &ApplicationId) -> ServiceResult<Option<StoreApplication>> {
        Ok(self.applications.get(id.as_str()).await?)
    }

    /// The merchant's most recent application.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the lookup fails.
    pub async fn get_by_merchant(
        &self,
        merchant_id: &UserId,
    ) -> ServiceResult<Option<StoreApplication>> {
        Ok(self
            .applications
            .find_by("merchantId", merchant_id)
            .await?
            .into_iter()
            .max_by_key(|a| a.submitted_at))
    }

    /// Approve a pending application and open its store.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for an unknown id and
    /// `ServiceError::Conflict` if it was already reviewed. The status flips
    /// before the store is created, so racing approvals open one store.
    pub async fn approve(
        &self,
        id: &ApplicationId,
        reviewer_id: &UserId,
    ) -> ServiceResult<(StoreApplication, Store)> {
        let pending = self.pending(id).await?;

        let mut application = pending.clone();
        application.status = ApplicationStatus::Approved;
        application.reviewed_at = Some(Utc::now());
        application.reviewed_by = Some(reviewer_id.clone());
        self.claim(&application).await?;

        let store = match self.stores.create_store(store_draft(&application)).await {
            Ok(store) => store,
            Err(err) => {
                // Hand the application back so the review can be retried.
                if let Err(e) = self
                    .applications
                    .update_if(&pending, "status", ApplicationStatus::Approved)
                    .await
                {
                    warn!(application_id = %id, error = %e, "Failed to reopen application");
                }
                return Err(err);
            }
        };

        application.store_id = Some(store.id.clone());
        self.applications.update(&application).await?;

        info!(
            application_id = %application.id,
            store_id = %store.id,
            reviewer_id = %reviewer_id,
            "Application approved"
        );
        self.sync.publish(SyncEvent::ApplicationApproved {
            application_id: application.id.clone(),
            store_id: store.id.clone(),
        });
        Ok((application, store))
    }

    /// Reject a pending application.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Invalid` for a blank reason,
    /// `ServiceError::NotFound` for an unknown id and
    /// `ServiceError::Conflict` if it was already reviewed.
    pub async fn reject(
        &self,
        id: &ApplicationId,
        reviewer_id: &UserId,
        reason: &str,
    ) -> ServiceResult<StoreApplication> {
        require("rejection reason", reason)?;
        let mut application = self.pending(id).await?;

        application.status = ApplicationStatus::Rejected;
        application.reviewed_at = Some(Utc::now());
        application.reviewed_by = Some(reviewer_id.clone());
        application.rejection_reason = Some(reason.trim().to_owned());
        self.claim(&application).await?;

        info!(application_id = %application.id, reviewer_id = %reviewer_id, "Application rejected");
        self.sync.publish(SyncEvent::ApplicationRejected {
            application_id: application.id.clone(),
        });
        Ok(application)
    }

    /// Counts by status.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the applications cannot be loaded.
    pub async fn stats(&self) -> ServiceResult<ApplicationStats> {
        let applications = self.applications.list().await?;
        let mut stats = ApplicationStats {
            total: applications.len(),
            ..ApplicationStats::default()
        };
        for application in &applications {
            match application.status {
                ApplicationStatus::Pending => stats.pending += 1,
                ApplicationStatus::Approved => stats.approved += 1,
                ApplicationStatus::Rejected => stats.rejected += 1,
            }
        }
        Ok(stats)
    }

    /// Write a reviewed application, provided nobody reviewed it since it
    /// was read.
    async fn claim(&self, reviewed: &StoreApplication) -> ServiceResult<()> {
        if self
            .applications
            .update_if(reviewed, "status", ApplicationStatus::Pending)
            .await?
        {
            Ok(())
        } else {
            Err(ServiceError::Conflict(
                "application was reviewed concurrently".to_owned(),
            ))
        }
    }

    async fn pending(&self, id: &ApplicationId) -> ServiceResult<StoreApplication> {
        let application = self
            .applications
            .get(id.as_str())
            .await?
            .ok_or(ServiceError::NotFound("application"))?;
        if !application.status.is_reviewable() {
            return Err(ServiceError::Conflict(format!(
                "application is already {}",
                application.status
            )));
        }
        Ok(application)
    }
}

fn validate_form(form: &ApplicationForm) -> ServiceResult<()> {
    let merchant = &form.merchant_data;
    require("first name", &merchant.first_name)?;
    require("last name", &merchant.last_name)?;
    require("business name", &merchant.business_name)?;
    Email::parse(&merchant.email).map_err(|e| ServiceError::Invalid(e.to_string()))?;

    let colors = &form.store_config.customization.colors;
    for (field, value) in [
        ("primary", &colors.primary),
        ("secondary", &colors.secondary),
        ("background", &colors.background),
    ] {
        if !is_hex_color(value) {
            return Err(ServiceError::Invalid(format!(
                "color {field} must be a hex value, got {value:?}"
            )));
        }
    }
    Ok(())
}

/// The store an approved application opens.
fn store_draft(application: &StoreApplication) -> StoreDraft {
    let applied = &application.store_config.customization;
    let name = application.store_name().to_owned();
    let fallback = format!("store-{}", Utc::now().timestamp_millis());
    let description = if applied.store_description.trim().is_empty() {
        DEFAULT_STORE_DESCRIPTION.to_owned()
    } else {
        applied.store_description.trim().to_owned()
    };
    let template = if application.store_config.template.trim().is_empty() {
        DEFAULT_TEMPLATE.to_owned()
    } else {
        application.store_config.template.clone()
    };

    StoreDraft {
        subdomain: Subdomain::generate(&name, Some(&fallback)),
        customization: StoreCustomization::for_new_store(&name, &applied.colors),
        settings: StoreSettings::default(),
        owner_id: application.merchant_id.clone(),
        name,
        description,
        template,
    }
}
