//! Products, categories and customers of a store.
//!
//! Updates and deletes are scoped by store: an id belonging to another
//! store behaves as if it did not exist.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use bazaar_core::{CategoryId, CustomerId, Email, MAX_SETTING_AMOUNT, ProductId, StoreId};

use super::{ServiceError, ServiceResult, SyncEvent, SyncHub, require};
use crate::db::{DocumentStore, Repository};
use crate::models::{
    Category, Customer, CustomerPatch, NewCategory, NewCustomer, NewProduct, Product,
    ProductPatch,
};

/// Catalog service.
pub struct CatalogService<'a> {
    products: Repository<'a, Product>,
    categories: Repository<'a, Category>,
    customers: Repository<'a, Customer>,
    sync: &'a SyncHub,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub fn new(docs: &'a dyn DocumentStore, sync: &'a SyncHub) -> Self {
        Self {
            products: Repository::new(docs),
            categories: Repository::new(docs),
            customers: Repository::new(docs),
            sync,
        }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// # Errors
    ///
    /// Returns `ServiceError::Invalid` for a blank name or negative price.
    pub async fn create_product(
        &self,
        store_id: &StoreId,
        new: NewProduct,
    ) -> ServiceResult<Product> {
        require("product name", &new.name)?;
        validate_prices(Some(new.price), new.original_price)?;
        let now = Utc::now();

        let product = Product {
            id: ProductId::generate(),
            store_id: store_id.clone(),
            name: new.name.trim().to_owned(),
            description: new.description,
            price: new.price,
            original_price: new.original_price,
            images: new.images,
            category: new.category,
            sub_category: new.sub_category,
            brand: new.brand,
            sku: new.sku,
            stock: new.stock,
            specifications: new.specifications,
            variants: new.variants,
            tags: new.tags,
            rating: new.rating,
            review_count: new.review_count,
            status: new.status,
            featured: new.featured,
            created_at: now,
            updated_at: now,
        };
        self.products.insert(&product).await?;

        info!(store_id = %store_id, product_id = %product.id, "Product created");
        self.sync.publish(SyncEvent::ProductCreated {
            store_id: store_id.clone(),
            product_id: product.id.clone(),
        });
        Ok(product)
    }

    /// Products of one store, or of every store.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the products cannot be loaded.
    pub async fn list_products(&self, store_id: Option<&StoreId>) -> ServiceResult<Vec<Product>> {
        Ok(match store_id {
            Some(store_id) => self.products.find_by("storeId", store_id).await?,
            None => self.products.list().await?,
        })
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the lookup fails.
    pub async fn get_product(&self, id: &ProductId) -> ServiceResult<Option<Product>> {
        Ok(self.products.get(id.as_str()).await?)
    }

    /// Apply a partial update. Returns `None` if the store has no such
    /// product.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Invalid` for a blank name or negative price.
    pub async fn update_product(
        &self,
        store_id: &StoreId,
        id: &ProductId,
        patch: ProductPatch,
    ) -> ServiceResult<Option<Product>> {
        let Some(mut product) = self.owned_product(store_id, id).await? else {
            return Ok(None);
        };
        if let Some(name) = &patch.name {
            require("product name", name)?;
        }
        validate_prices(patch.price, patch.original_price)?;

        patch.apply(&mut product);
        product.updated_at = Utc::now();
        if !self.products.update(&product).await? {
            return Ok(None);
        }

        self.sync.publish(SyncEvent::ProductUpdated {
            store_id: store_id.clone(),
            product_id: product.id.clone(),
        });
        Ok(Some(product))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the delete fails.
    pub async fn delete_product(&self, store_id: &StoreId, id: &ProductId) -> ServiceResult<bool> {
        if self.owned_product(store_id, id).await?.is_none() {
            return Ok(false);
        }
        let deleted = self.products.delete(id.as_str()).await?;
        if deleted {
            info!(store_id = %store_id, product_id = %id, "Product deleted");
            self.sync.publish(SyncEvent::ProductDeleted {
                store_id: store_id.clone(),
                product_id: id.clone(),
            });
        }
        Ok(deleted)
    }

    /// Save a product whose stock was taken by an order.
    pub(crate) async fn save_product(&self, product: &Product) -> ServiceResult<()> {
        self.products.update(product).await?;
        self.sync.publish(SyncEvent::ProductUpdated {
            store_id: product.store_id.clone(),
            product_id: product.id.clone(),
        });
        Ok(())
    }

    async fn owned_product(
        &self,
        store_id: &StoreId,
        id: &ProductId,
    ) -> ServiceResult<Option<Product>> {
        Ok(self
            .products
            .get(id.as_str())
            .await?
            .filter(|p| &p.store_id == store_id))
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// # Errors
    ///
    /// Returns `ServiceError::Invalid` for a blank name.
    pub async fn create_category(
        &self,
        store_id: &StoreId,
        new: NewCategory,
    ) -> ServiceResult<Category> {
        require("category name", &new.name)?;
        let category = Category {
            id: CategoryId::generate(),
            store_id: store_id.clone(),
            name: new.name.trim().to_owned(),
            description: new.description,
            image: new.image,
            parent_id: new.parent_id,
            sort: new.sort,
            is_active: new.is_active,
        };
        self.categories.insert(&category).await?;

        self.sync.publish(SyncEvent::CategoriesUpdated {
            store_id: store_id.clone(),
        });
        Ok(category)
    }

    /// Categories ordered by their `sort` key.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the categories cannot be loaded.
    pub async fn list_categories(
        &self,
        store_id: Option<&StoreId>,
    ) -> ServiceResult<Vec<Category>> {
        let mut categories = match store_id {
            Some(store_id) => self.categories.find_by("storeId", store_id).await?,
            None => self.categories.list().await?,
        };
        // Stable, so equal keys keep creation order.
        categories.sort_by_key(|c| c.sort);
        Ok(categories)
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// # Errors
    ///
    /// Returns `ServiceError::Invalid` for a blank name or bad email and
    /// `ServiceError::Conflict` if the store already has the email.
    pub async fn create_customer(
        &self,
        store_id: &StoreId,
        new: NewCustomer,
    ) -> ServiceResult<Customer> {
        require("customer name", &new.name)?;
        let email = normalize_email(&new.email)?;
        if self.customer_by_email(store_id, &email).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "customer {email} already exists"
            )));
        }

        let now = Utc::now();
        let customer = Customer {
            id: CustomerId::generate(),
            store_id: store_id.clone(),
            name: new.name.trim().to_owned(),
            email,
            phone: new.phone,
            is_active: new.is_active,
            total_orders: 0,
            total_spent: Decimal::ZERO,
            last_order_date: None,
            created_at: now,
            updated_at: now,
        };
        self.customers.insert(&customer).await?;

        self.sync.publish(SyncEvent::CustomersUpdated {
            store_id: store_id.clone(),
        });
        Ok(customer)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the customers cannot be loaded.
    pub async fn list_customers(
        &self,
        store_id: Option<&StoreId>,
    ) -> ServiceResult<Vec<Customer>> {
        Ok(match store_id {
            Some(store_id) => self.customers.find_by("storeId", store_id).await?,
            None => self.customers.list().await?,
        })
    }

    /// Apply a partial update. Returns `None` if the store has no such
    /// customer.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Invalid` for a bad email.
    pub async fn update_customer(
        &self,
        store_id: &StoreId,
        id: &CustomerId,
        mut patch: CustomerPatch,
    ) -> ServiceResult<Option<Customer>> {
        let Some(mut customer) = self
            .customers
            .get(id.as_str())
            .await?
            .filter(|c| &c.store_id == store_id)
        else {
            return Ok(None);
        };
        if let Some(email) = patch.email.take() {
            let email = normalize_email(&email)?;
            if email != customer.email
                && self
                    .customer_by_email(store_id, &email)
                    .await?
                    .is_some_and(|other| other.id != customer.id)
            {
                return Err(ServiceError::Conflict(format!(
                    "customer {email} already exists"
                )));
            }
            patch.email = Some(email);
        }

        patch.apply(&mut customer);
        customer.updated_at = Utc::now();
        if !self.customers.update(&customer).await? {
            return Ok(None);
        }

        self.sync.publish(SyncEvent::CustomersUpdated {
            store_id: store_id.clone(),
        });
        Ok(Some(customer))
    }

    /// The store's customer with this (normalized) email.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the lookup fails.
    pub async fn customer_by_email(
        &self,
        store_id: &StoreId,
        email: &str,
    ) -> ServiceResult<Option<Customer>> {
        Ok(self
            .customers
            .find_by("storeId", store_id)
            .await?
            .into_iter()
            .find(|c| c.email == email))
    }

    pub(crate) async fn remove_customer(&self, customer: &Customer) -> ServiceResult<()> {
        self.customers.delete(customer.id.as_str()).await?;
        self.sync.publish(SyncEvent::CustomersUpdated {
            store_id: customer.store_id.clone(),
        });
        Ok(())
    }

    pub(crate) async fn save_customer(&self, customer: &Customer, is_new: bool) -> ServiceResult<()> {
        if is_new {
            self.customers.insert(customer).await?;
        } else {
            self.customers.update(customer).await?;
        }
        self.sync.publish(SyncEvent::CustomersUpdated {
            store_id: customer.store_id.clone(),
        });
        Ok(())
    }
}

fn validate_prices(price: Option<Decimal>, original: Option<Decimal>) -> ServiceResult<()> {
    let mut prices = price.into_iter().chain(original);
    if prices.clone().any(|p| p.is_sign_negative()) {
        return Err(ServiceError::Invalid("prices cannot be negative".to_owned()));
    }
    if prices.any(|p| p > MAX_SETTING_AMOUNT) {
        return Err(ServiceError::Invalid(format!(
            "prices cannot exceed {MAX_SETTING_AMOUNT}"
        )));
    }
    Ok(())
}

pub(crate) fn normalize_email(raw: &str) -> ServiceResult<String> {
    Email::parse(raw)
        .map(|email| email.as_str().to_owned())
        .map_err(|e| ServiceError::Invalid(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use bazaar_core::ProductStatus;

    use super::*;
    use crate::db::MemoryDocumentStore;

    fn new_product(name: &str, price: i64, stock: u32) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            description: String::new(),
            price: Decimal::from(price),
            original_price: None,
            images: Vec::new(),
            category: "electronics".to_owned(),
            sub_category: None,
            brand: None,
            sku: String::new(),
            stock,
            specifications: BTreeMap::new(),
            variants: Vec::new(),
            tags: Vec::new(),
            rating: 0.0,
            review_count: 0,
            status: ProductStatus::Active,
            featured: false,
        }
    }

    fn new_category(name: &str, sort: i32) -> NewCategory {
        NewCategory {
            name: name.to_owned(),
            description: None,
            image: None,
            parent_id: None,
            sort,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_products_are_scoped_by_store() {
        let docs = MemoryDocumentStore::new();
        let sync = SyncHub::new();
        let catalog = CatalogService::new(&docs, &sync);
        let ours = StoreId::new("store_a");
        let theirs = StoreId::new("store_b");

        let phone = catalog
            .create_product(&ours, new_product("Phone", 999, 5))
            .await
            .unwrap();
        catalog
            .create_product(&theirs, new_product("Lamp", 20, 1))
            .await
            .unwrap();

        assert_eq!(catalog.list_products(Some(&ours)).await.unwrap().len(), 1);
        assert_eq!(catalog.list_products(None).await.unwrap().len(), 2);

        let patch = ProductPatch {
            price: Some(Decimal::from(899)),
            ..ProductPatch::default()
        };
        assert!(
            catalog
                .update_product(&theirs, &phone.id, patch.clone())
                .await
                .unwrap()
                .is_none()
        );
        let updated = catalog
            .update_product(&ours, &phone.id, patch)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.price, Decimal::from(899));

        assert!(!catalog.delete_product(&theirs, &phone.id).await.unwrap());
        assert!(catalog.delete_product(&ours, &phone.id).await.unwrap());
        assert!(catalog.get_product(&phone.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_product_events() {
        let docs = MemoryDocumentStore::new();
        let sync = SyncHub::new();
        let mut rx = sync.subscribe();
        let catalog = CatalogService::new(&docs, &sync);
        let store = StoreId::new("store_a");

        let p = catalog
            .create_product(&store, new_product("Phone", 1, 1))
            .await
            .unwrap();
        catalog.delete_product(&store, &p.id).await.unwrap();

        assert!(matches!(rx.recv().await.unwrap().event, SyncEvent::ProductCreated { .. }));
        assert!(matches!(rx.recv().await.unwrap().event, SyncEvent::ProductDeleted { .. }));
    }

    #[tokio::test]
    async fn test_invalid_products_rejected() {
        let docs = MemoryDocumentStore::new();
        let sync = SyncHub::new();
        let catalog = CatalogService::new(&docs, &sync);
        let store = StoreId::new("store_a");

        assert!(matches!(
            catalog.create_product(&store, new_product("  ", 1, 1)).await,
            Err(ServiceError::Invalid(_))
        ));
        assert!(matches!(
            catalog.create_product(&store, new_product("Bad", -1, 1)).await,
            Err(ServiceError::Invalid(_))
        ));
        assert!(matches!(
            catalog
                .create_product(&store, new_product("Huge", 2_000_000_000, 1))
                .await,
            Err(ServiceError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_categories_sorted() {
        let docs = MemoryDocumentStore::new();
        let sync = SyncHub::new();
        let catalog = CatalogService::new(&docs, &sync);
        let store = StoreId::new("store_a");

        catalog.create_category(&store, new_category("Home", 3)).await.unwrap();
        catalog.create_category(&store, new_category("Electronics", 1)).await.unwrap();
        catalog.create_category(&store, new_category("Fashion", 2)).await.unwrap();

        let names: Vec<_> = catalog
            .list_categories(Some(&store))
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["Electronics", "Fashion", "Home"]);
    }

    #[tokio::test]
    async fn test_customers() {
        let docs = MemoryDocumentStore::new();
        let sync = SyncHub::new();
        let catalog = CatalogService::new(&docs, &sync);
        let store = StoreId::new("store_a");

        let customer = catalog
            .create_customer(
                &store,
                NewCustomer {
                    name: "Sara".to_owned(),
                    email: "Sara@Example.com".to_owned(),
                    phone: String::new(),
                    is_active: true,
                },
            )
            .await
            .unwrap();
        assert_eq!(customer.email, "sara@example.com");

        let duplicate = catalog
            .create_customer(
                &store,
                NewCustomer {
                    name: "Sara again".to_owned(),
                    email: "sara@example.com".to_owned(),
                    phone: String::new(),
                    is_active: true,
                },
            )
            .await;
        assert!(matches!(duplicate, Err(ServiceError::Conflict(_))));

        let updated = catalog
            .update_customer(
                &store,
                &customer.id,
                CustomerPatch {
                    is_active: Some(false),
                    ..CustomerPatch::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(!updated.is_active);
        assert_eq!(catalog.list_customers(Some(&store)).await.unwrap().len(), 1);
        assert!(
            catalog
                .update_customer(&StoreId::new("other"), &customer.id, CustomerPatch::default())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_customer_email_change_stays_unique() {
        let docs = MemoryDocumentStore::new();
        let sync = SyncHub::new();
        let catalog = CatalogService::new(&docs, &sync);
        let store = StoreId::new("store_a");

        let customer = |name: &str, email: &str| NewCustomer {
            name: name.to_owned(),
            email: email.to_owned(),
            phone: String::new(),
            is_active: true,
        };
        catalog.create_customer(&store, customer("A", "a@example.com")).await.unwrap();
        let b = catalog.create_customer(&store, customer("B", "b@example.com")).await.unwrap();

        let clash = catalog
            .update_customer(
                &store,
                &b.id,
                CustomerPatch {
                    email: Some("A@Example.com".to_owned()),
                    ..CustomerPatch::default()
                },
            )
            .await;
        assert!(matches!(clash, Err(ServiceError::Conflict(_))));

        // Re-saving the same address in another case is fine.
        let same = catalog
            .update_customer(
                &store,
                &b.id,
                CustomerPatch {
                    email: Some("B@example.COM".to_owned()),
                    ..CustomerPatch::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(same.email, "b@example.com");

        // Another store may use the address.
        let other = StoreId::new("store_b");
        catalog.create_customer(&other, customer("A2", "a@example.com")).await.unwrap();

        let emails: Vec<String> = catalog
            .list_customers(Some(&store))
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.email)
            .collect();
        assert_eq!(emails.iter().filter(|e| *e == "a@example.com").count(), 1);
    }
}
