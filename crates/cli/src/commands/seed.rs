//! Seed the database with demo data.
//!
//! `seed demo` creates the development accounts, a pending application and,
//! on an empty database, a sample store with a catalog. `seed store` loads a
//! catalog (categories, products, customers) from a YAML file into one
//! store, defaulting to the bundled sample catalog.

use std::collections::BTreeSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info, warn};

use bazaar_core::{BrandColors, Email, StoreId, Subdomain, UserId, UserRole};
use bazaar_platform::db::PgDocumentStore;
use bazaar_platform::models::{
    AppliedCustomization, ApplicationForm, MerchantData, NewCategory, NewCustomer, NewProduct,
    StoreConfig, StoreDraft,
};
use bazaar_platform::services::{
    ApplicationService, AuthError, AuthService, CatalogService, ServiceError, StoreService,
    SyncHub,
};

use super::{CliError, connect};

/// Catalog bundled with the binary.
const SAMPLE_CATALOG: &str = include_str!("../../data/sample-catalog.yaml");

/// A development account created by `seed demo`.
struct DemoAccount {
    email: &'static str,
    password: &'static str,
    name: &'static str,
    role: UserRole,
}

const DEMO_ACCOUNTS: &[DemoAccount] = &[
    DemoAccount {
        email: "admin@ecommerce-platform.com",
        password: "AdminPlatform2024!",
        name: "Platform Admin",
        role: UserRole::Admin,
    },
    DemoAccount {
        email: "merchant@test.com",
        password: "merchant123",
        name: "Test Merchant",
        role: UserRole::Merchant,
    },
    DemoAccount {
        email: "customer@test.com",
        password: "customer123",
        name: "Test Customer",
        role: UserRole::Customer,
    },
    DemoAccount {
        email: "owner@test.com",
        password: "owner12345",
        name: "Sample Store Owner",
        role: UserRole::Merchant,
    },
];

/// Catalog file contents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogSeed {
    pub categories: Vec<NewCategory>,
    pub products: Vec<NewProduct>,
    pub customers: Vec<NewCustomer>,
}

/// Counts reported after seeding a catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedResult {
    pub categories: usize,
    pub products: usize,
    pub customers: usize,
    /// Entries that already existed in the store.
    pub skipped: usize,
}

/// Parse a catalog from YAML.
///
/// # Errors
///
/// Returns `CliError::Yaml` if the document is not a catalog.
pub fn parse_catalog(yaml: &str) -> Result<CatalogSeed, CliError> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Check a parsed catalog, returning one message per problem.
#[must_use]
pub fn validate_catalog(catalog: &CatalogSeed) -> Vec<String> {
    let mut errors = Vec::new();

    let mut category_names = BTreeSet::new();
    for (i, category) in catalog.categories.iter().enumerate() {
        let name = category.name.trim();
        if name.is_empty() {
            errors.push(format!("category #{}: name is required", i + 1));
        } else if !category_names.insert(name.to_lowercase()) {
            errors.push(format!("category '{name}': duplicate name"));
        }
    }

    for (i, product) in catalog.products.iter().enumerate() {
        let label = if product.name.trim().is_empty() {
            errors.push(format!("product #{}: name is required", i + 1));
            format!("product #{}", i + 1)
        } else {
            format!("product '{}'", product.name.trim())
        };

        if product.price < Decimal::ZERO {
            errors.push(format!("{label}: price must not be negative"));
        }
        if product
            .original_price
            .is_some_and(|original| original < product.price)
        {
            errors.push(format!("{label}: originalPrice is below price"));
        }
        let category = product.category.trim();
        if !category.is_empty() && !category_names.contains(&category.to_lowercase()) {
            errors.push(format!("{label}: unknown category '{category}'"));
        }
    }

    for (i, customer) in catalog.customers.iter().enumerate() {
        if customer.name.trim().is_empty() {
            errors.push(format!("customer #{}: name is required", i + 1));
        }
        if !customer.email.contains('@') {
            errors.push(format!("customer #{}: invalid email '{}'", i + 1, customer.email));
        }
    }

    errors
}

/// Seed the development accounts, a sample application and, if there are no
/// stores yet, a sample store with the bundled catalog.
///
/// Safe to run repeatedly: existing accounts and applications are kept.
///
/// # Errors
///
/// Returns an error if the database cannot be reached or a write fails.
pub async fn demo() -> Result<(), CliError> {
    let docs = PgDocumentStore::new(connect().await?);
    let sync = SyncHub::new();

    let auth = AuthService::new(&docs);
    let mut merchant_id = None;
    let mut owner_id = None;
    for account in DEMO_ACCOUNTS {
        let user = match auth
            .register(account.email, account.password, account.name, account.role)
            .await
        {
            Ok(user) => {
                info!("  Created {} account: {}", account.role, account.email);
                user
            }
            Err(AuthError::UserAlreadyExists) => {
                info!("  Account already exists: {}", account.email);
                let email = Email::parse(account.email).map_err(AuthError::from)?;
                match auth.find_by_email(&email).await? {
                    Some(user) => user,
                    None => continue,
                }
            }
            Err(e) => return Err(e.into()),
        };
        match account.email {
            "merchant@test.com" => merchant_id = Some(user.id),
            "owner@test.com" => owner_id = Some(user.id),
            _ => {}
        }
    }

    if let Some(merchant_id) = &merchant_id {
        seed_application(&docs, &sync, merchant_id).await?;
    }

    let stores = StoreService::new(&docs, &sync);
    if !stores.list_stores().await?.is_empty() {
        info!("Stores already exist, skipping sample store");
        return Ok(());
    }
    let Some(owner_id) = owner_id else {
        warn!("Sample store owner missing, skipping sample store");
        return Ok(());
    };

    let subdomain = stores
        .unique_subdomain(&Subdomain::generate("Sample Store", None))
        .await?;
    let store = stores
        .create_store(StoreDraft::new("Sample Store", subdomain, owner_id))
        .await?;
    info!("  Created sample store: {} ({})", store.name, store.subdomain);

    let result = seed_catalog(&docs, &sync, &store.id, &parse_catalog(SAMPLE_CATALOG)?).await?;
    log_result(&result);

    info!("Demo data ready!");
    Ok(())
}

/// Seed a catalog into an existing store.
///
/// # Arguments
///
/// * `store_id` - Store to fill
/// * `file_path` - YAML catalog; the bundled sample catalog when `None`
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation, the
/// store does not exist, or a database operation fails.
pub async fn store(store_id: &str, file_path: Option<&str>) -> Result<(), CliError> {
    // Read and validate before connecting to the database
    let catalog = match file_path {
        Some(file_path) => {
            info!(path = %file_path, "Loading catalog from file");
            parse_catalog(&tokio::fs::read_to_string(Path::new(file_path)).await?)?
        }
        None => parse_catalog(SAMPLE_CATALOG)?,
    };

    let errors = validate_catalog(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(CliError::InvalidCatalog(errors.len()));
    }
    info!(
        categories = catalog.categories.len(),
        products = catalog.products.len(),
        customers = catalog.customers.len(),
        "Catalog validated successfully"
    );

    let docs = PgDocumentStore::new(connect().await?);
    let sync = SyncHub::new();

    let store_id = StoreId::new(store_id);
    let store = StoreService::new(&docs, &sync)
        .get_store(&store_id)
        .await?
        .ok_or_else(|| CliError::StoreNotFound(store_id.to_string()))?;

    info!("Seeding store: {} ({})", store.name, store.subdomain);
    let result = seed_catalog(&docs, &sync, &store.id, &catalog).await?;
    log_result(&result);
    Ok(())
}

async fn seed_application(
    docs: &PgDocumentStore,
    sync: &SyncHub,
    merchant_id: &UserId,
) -> Result<(), CliError> {
    let form = ApplicationForm {
        merchant_data: MerchantData {
            first_name: "Ahmed".to_owned(),
            last_name: "Mohammed".to_owned(),
            email: "merchant@test.com".to_owned(),
            phone: "+966501234567".to_owned(),
            city: "Riyadh".to_owned(),
            business_name: "Ahmed Trading".to_owned(),
            business_type: "E-commerce".to_owned(),
        },
        store_config: StoreConfig {
            template: "modern".to_owned(),
            customization: AppliedCustomization {
                store_name: "Ahmed's Store".to_owned(),
                store_description: "Quality products, shipped fast".to_owned(),
                colors: BrandColors {
                    primary: "#16a34a".to_owned(),
                    secondary: "#6b7280".to_owned(),
                    background: "#ffffff".to_owned(),
                },
            },
        },
    };

    match ApplicationService::new(docs, sync)
        .submit(merchant_id, form)
        .await
    {
        Ok(application) => {
            info!("  Submitted sample application: {}", application.id);
            Ok(())
        }
        Err(ServiceError::Conflict(_)) => {
            info!("  Sample merchant already has an application");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Insert a catalog, skipping categories and products whose names (and
/// customers whose emails) the store already has.
async fn seed_catalog(
    docs: &PgDocumentStore,
    sync: &SyncHub,
    store_id: &StoreId,
    catalog: &CatalogSeed,
) -> Result<SeedResult, CliError> {
    let catalog_service = CatalogService::new(docs, sync);
    let mut result = SeedResult::default();

    let existing: BTreeSet<String> = catalog_service
        .list_categories(Some(store_id))
        .await?
        .into_iter()
        .map(|c| c.name.to_lowercase())
        .collect();
    for category in &catalog.categories {
        if existing.contains(&category.name.trim().to_lowercase()) {
            result.skipped += 1;
            continue;
        }
        catalog_service
            .create_category(store_id, category.clone())
            .await?;
        result.categories += 1;
    }

    let existing: BTreeSet<String> = catalog_service
        .list_products(Some(store_id))
        .await?
        .into_iter()
        .map(|p| p.name.to_lowercase())
        .collect();
    for product in &catalog.products {
        if existing.contains(&product.name.trim().to_lowercase()) {
            result.skipped += 1;
            continue;
        }
        catalog_service
            .create_product(store_id, product.clone())
            .await?;
        result.products += 1;
    }

    for customer in &catalog.customers {
        match catalog_service
            .create_customer(store_id, customer.clone())
            .await
        {
            Ok(_) => result.customers += 1,
            Err(ServiceError::Conflict(_)) => result.skipped += 1,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(result)
}

fn log_result(result: &SeedResult) {
    info!("Seeding complete!");
    info!("  Categories inserted: {}", result.categories);
    info!("  Products inserted: {}", result.products);
    info!("  Customers inserted: {}", result.customers);
    info!("  Skipped (already exist): {}", result.skipped);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_catalog_is_valid() {
        let catalog = parse_catalog(SAMPLE_CATALOG).unwrap();
        assert_eq!(catalog.categories.len(), 3);
        assert_eq!(catalog.products.len(), 5);
        assert_eq!(catalog.customers.len(), 2);
        assert!(validate_catalog(&catalog).is_empty());

        let headphones = &catalog.products[0];
        assert_eq!(headphones.price, Decimal::new(19999, 2));
        assert!(headphones.featured);
    }

    #[test]
    fn test_validate_reports_each_problem() {
        let catalog = parse_catalog(
            r#"
categories:
  - name: Books
  - name: books
products:
  - name: Atlas
    price: "-1"
    category: Maps
  - name: ""
    price: "10"
    originalPrice: "5"
customers:
  - name: Nobody
    email: not-an-email
"#,
        )
        .unwrap();

        let errors = validate_catalog(&catalog);
        assert_eq!(errors.len(), 6, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("duplicate name")));
        assert!(errors.iter().any(|e| e.contains("unknown category 'Maps'")));
        assert!(errors.iter().any(|e| e.contains("below price")));
        assert!(errors.iter().any(|e| e.contains("invalid email")));
    }

    #[test]
    fn test_empty_catalog_parses() {
        let catalog = parse_catalog("products: []").unwrap();
        assert!(catalog.categories.is_empty());
        assert!(validate_catalog(&catalog).is_empty());
    }

    #[test]
    fn test_demo_accounts_meet_password_rules() {
        assert!(DEMO_ACCOUNTS.iter().all(|a| a.password.len() >= 8));
        assert_eq!(
            DEMO_ACCOUNTS
                .iter()
                .filter(|a| a.role == UserRole::Admin)
                .count(),
            1
        );
    }
}
