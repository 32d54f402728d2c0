//! Cart pricing, checkout and order management.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use bazaar_core::{
    CurrencyCode, CustomerId, OrderId, OrderStatus, PaymentMethod, PaymentStatus,
    ProductId, StoreId, StoreSettings,
};

use super::catalog::normalize_email;
use super::{CatalogService, ServiceError, ServiceResult, SyncEvent, SyncHub, require};
use crate::db::{DocumentStore, Repository};
use crate::models::order::order_number;
use crate::models::{
    Address, Cart, Customer, Order, OrderItem, OrderStatusUpdate, Product, Store,
    total_quantity,
};

/// One priced cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLine {
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub price: Decimal,
    pub quantity: u32,
    pub total: Decimal,
}

/// Priced cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub lines: Vec<QuoteLine>,
    pub item_count: u32,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    /// Spend needed to reach free shipping, when shipping is charged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_for_free_shipping: Option<Decimal>,
    pub currency: CurrencyCode,
}

impl Quote {
    /// Price `lines` under a store's shipping and tax rules.
    #[must_use]
    pub fn compute(
        settings: &StoreSettings,
        lines: Vec<QuoteLine>,
        city: Option<&str>,
        discount: Decimal,
    ) -> Self {
        let subtotal: Decimal = lines.iter().map(|l| l.total).sum();
        let shipping_cost = settings.shipping.cost_for(subtotal, city);
        let tax_amount = settings.taxes.tax_for(subtotal);
        let item_count = total_quantity(lines.iter().map(|l| l.quantity));

        Self {
            item_count,
            subtotal,
            shipping_cost,
            tax_amount,
            discount_amount: discount,
            total: subtotal + shipping_cost + tax_amount - discount,
            remaining_for_free_shipping: settings.shipping.remaining_for_free(subtotal),
            currency: settings.currency,
            lines,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Price a cart at current product prices. Lines whose product is gone are
/// dropped.
#[must_use]
pub fn price_cart(cart: &Cart, products: &[Product]) -> Vec<QuoteLine> {
    let by_id: HashMap<&ProductId, &Product> = products.iter().map(|p| (&p.id, p)).collect();
    cart.lines
        .iter()
        .filter_map(|line| {
            let product = by_id.get(&line.product_id)?;
            Some(QuoteLine {
                product_id: product.id.clone(),
                name: product.name.clone(),
                image: product.images.first().cloned().unwrap_or_default(),
                price: product.price,
                quantity: line.quantity,
                total: product.price * Decimal::from(line.quantity),
            })
        })
        .collect()
}

/// Checkout form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub shipping_address: Address,
    #[serde(default)]
    pub billing_address: Option<Address>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Order service.
pub struct OrderService<'a> {
    orders: Repository<'a, Order>,
    catalog: CatalogService<'a>,
    sync: &'a SyncHub,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub fn new(docs: &'a dyn DocumentStore, sync: &'a SyncHub) -> Self {
        Self {
            orders: Repository::new(docs),
            catalog: CatalogService::new(docs, sync),
            sync,
        }
    }

    /// Price a cart against the store's current catalog.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the products cannot be loaded.
    pub async fn quote_cart(
        &self,
        store: &Store,
        cart: &Cart,
        city: Option<&str>,
    ) -> ServiceResult<Quote> {
        let products = self.catalog.list_products(Some(&store.id)).await?;
        Ok(Quote::compute(
            &store.settings,
            price_cart(cart, &products),
            city,
            Decimal::ZERO,
        ))
    }

    /// Turn a cart into an order.
    ///
    /// Every line is checked before anything is written: products must be
    /// active members of the store with enough stock. If a later write
    /// fails, the stock and the customer record are put back.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Invalid` for an empty cart, an incomplete
    /// address, a disabled payment method or an unavailable product, and
    /// `ServiceError::Conflict` when stock is insufficient.
    pub async fn place_order(
        &self,
        store: &Store,
        cart: &Cart,
        checkout: CheckoutRequest,
    ) -> ServiceResult<Order> {
        if cart.is_empty() {
            return Err(ServiceError::Invalid("cart is empty".to_owned()));
        }
        if !store.settings.payment.accepts(checkout.payment_method) {
            return Err(ServiceError::Invalid(
                "payment method is not enabled for this store".to_owned(),
            ));
        }
        let address = &checkout.shipping_address;
        require("name", &address.full_name())?;
        require("city", &address.city)?;
        require("street", &address.street)?;
        let email = normalize_email(&address.email)?;

        let mut products = Vec::with_capacity(cart.lines.len());
        for line in &cart.lines {
            let product = self
                .catalog
                .get_product(&line.product_id)
                .await?
                .filter(|p| p.store_id == store.id && p.is_active())
                .ok_or_else(|| {
                    ServiceError::Invalid(format!("product {} is not available", line.product_id))
                })?;
            if line.quantity == 0 {
                return Err(ServiceError::Invalid("quantity must be at least 1".to_owned()));
            }
            if line.quantity > product.stock {
                return Err(ServiceError::Conflict(format!(
                    "only {} of {} left in stock",
                    product.stock, product.name
                )));
            }
            products.push(product);
        }

        let quote = Quote::compute(
            &store.settings,
            price_cart(cart, &products),
            Some(address.city.as_str()),
            Decimal::ZERO,
        );
        let now = Utc::now();

        let mut taken = Vec::with_capacity(products.len());
        for (product, line) in products.iter_mut().zip(&cart.lines) {
            product.take_stock(line.quantity);
            product.updated_at = now;
            if let Err(err) = self.catalog.save_product(product).await {
                self.return_stock(&taken).await;
                return Err(err);
            }
            taken.push((product.id.clone(), line.quantity));
        }

        let (customer, previous) = match self
            .record_customer(&store.id, address, email, quote.total)
            .await
        {
            Ok(recorded) => recorded,
            Err(err) => {
                self.return_stock(&taken).await;
                return Err(err);
            }
        };

        let items = quote
            .lines
            .iter()
            .map(|line| OrderItem {
                product_id: line.product_id.clone(),
                product_name: line.name.clone(),
                product_image: line.image.clone(),
                variant_id: None,
                variant_name: None,
                price: line.price,
                quantity: line.quantity,
                total: line.total,
            })
            .collect();

        let order = Order {
            id: OrderId::generate(),
            order_number: order_number(now),
            store_id: store.id.clone(),
            customer_id: customer.id.clone(),
            items,
            subtotal: quote.subtotal,
            tax_amount: quote.tax_amount,
            shipping_cost: quote.shipping_cost,
            discount_amount: quote.discount_amount,
            total: quote.total,
            status: OrderStatus::Pending,
            payment_method: checkout.payment_method,
            payment_status: PaymentStatus::Pending,
            billing_address: checkout
                .billing_address
                .unwrap_or_else(|| checkout.shipping_address.clone()),
            shipping_address: checkout.shipping_address,
            tracking: None,
            notes: checkout.notes.filter(|n| !n.trim().is_empty()),
            created_at: now,
            updated_at: now,
        };
        if let Err(err) = self.orders.insert(&order).await {
            self.undo_customer(&customer, previous).await;
            self.return_stock(&taken).await;
            return Err(err.into());
        }

        info!(
            store_id = %store.id,
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total,
            "Order placed"
        );
        self.sync.publish(SyncEvent::OrderCreated {
            store_id: store.id.clone(),
            order_id: order.id.clone(),
        });
        Ok(order)
    }

    /// Orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the orders cannot be loaded.
    pub async fn list_orders(&self, store_id: Option<&StoreId>) -> ServiceResult<Vec<Order>> {
        let mut orders = match store_id {
            Some(store_id) => self.orders.find_by("storeId", store_id).await?,
            None => self.orders.list().await?,
        };
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the lookup fails.
    pub async fn get_order(&self, id: &OrderId) -> ServiceResult<Option<Order>> {
        Ok(self.orders.get(id.as_str()).await?)
    }

    /// Move an order to a new status. Returns `None` if the store has no
    /// such order.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Conflict` if the order is already delivered or
    /// cancelled.
    pub async fn update_order_status(
        &self,
        store_id: &StoreId,
        id: &OrderId,
        update: OrderStatusUpdate,
    ) -> ServiceResult<Option<Order>> {
        let Some(mut order) = self
            .orders
            .get(id.as_str())
            .await?
            .filter(|o| &o.store_id == store_id)
        else {
            return Ok(None);
        };
        if order.status.is_final() && order.status != update.status {
            return Err(ServiceError::Conflict(format!(
                "order is already {}",
                order.status
            )));
        }

        order.status = update.status;
        if let Some(payment_status) = update.payment_status {
            order.payment_status = payment_status;
        }
        if update.tracking.is_some() {
            order.tracking = update.tracking;
        }
        order.updated_at = Utc::now();
        if !self.orders.update(&order).await? {
            return Ok(None);
        }

        info!(order_id = %order.id, status = %order.status, "Order status updated");
        self.sync.publish(SyncEvent::OrderUpdated {
            store_id: store_id.clone(),
            order_id: order.id.clone(),
        });
        Ok(Some(order))
    }

    /// Create or update the store's customer record for this email.
    /// Returns the saved record and, for a returning customer, the record
    /// as it was before.
    async fn record_customer(
        &self,
        store_id: &StoreId,
        address: &Address,
        email: String,
        total: Decimal,
    ) -> ServiceResult<(Customer, Option<Customer>)> {
        let now = Utc::now();
        let previous = self.catalog.customer_by_email(store_id, &email).await?;
        let (mut customer, is_new) = match previous.clone() {
            Some(existing) => (existing, false),
            None => (
                Customer {
                    id: CustomerId::generate(),
                    store_id: store_id.clone(),
                    name: address.full_name(),
                    email,
                    phone: address.phone.clone(),
                    is_active: true,
                    total_orders: 0,
                    total_spent: Decimal::ZERO,
                    last_order_date: None,
                    created_at: now,
                    updated_at: now,
                },
                true,
            ),
        };
        customer.record_order(total, now);
        self.catalog.save_customer(&customer, is_new).await?;
        Ok((customer, previous))
    }

    /// Roll back [`OrderService::record_customer`] after a failed checkout.
    async fn undo_customer(&self, customer: &Customer, previous: Option<Customer>) {
        let result = match previous {
            Some(previous) => self.catalog.save_customer(&previous, false).await,
            None => self.catalog.remove_customer(customer).await,
        };
        if let Err(err) = result {
            warn!(customer_id = %customer.id, error = %err, "Failed to roll back customer");
        }
    }

    /// Put back stock reserved by a checkout that did not complete.
    async fn return_stock(&self, taken: &[(ProductId, u32)]) {
        for (product_id, quantity) in taken {
            let restored = match self.catalog.get_product(product_id).await {
                Ok(Some(mut product)) => {
                    product.return_stock(*quantity);
                    product.updated_at = Utc::now();
                    self.catalog.save_product(&product).await
                }
                Ok(None) => Ok(()),
                Err(err) => Err(err),
            };
            if let Err(err) = restored {
                warn!(product_id = %product_id, quantity, error = %err, "Failed to return stock");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use bazaar_core::{
        ProductStatus, ShippingZone, StoreCustomization, StoreStatus, Subdomain, TaxSettings,
        UserId, ZoneId,
    };

    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::db::{Filter, MemoryDocumentStore, StorageError, collections};
    use crate::models::NewProduct;

    /// Memory store whose order inserts always fail.
    #[derive(Default)]
    struct NoOrders {
        inner: MemoryDocumentStore,
    }

    #[async_trait]
    impl DocumentStore for NoOrders {
        fn backend(&self) -> &'static str {
            "no-orders"
        }

        async fn insert(&self, c: &str, id: &str, doc: Value) -> Result<(), StorageError> {
            if c == collections::ORDERS {
                return Err(StorageError::Unavailable("orders offline".to_owned()));
            }
            self.inner.insert(c, id, doc).await
        }

        async fn insert_unique(
            &self,
            c: &str,
            id: &str,
            field: &str,
            doc: Value,
        ) -> Result<(), StorageError> {
            self.inner.insert_unique(c, id, field, doc).await
        }

        async fn get(&self, c: &str, id: &str) -> Result<Option<Value>, StorageError> {
            self.inner.get(c, id).await
        }

        async fn find(&self, c: &str, filter: &Filter) -> Result<Vec<Value>, StorageError> {
            self.inner.find(c, filter).await
        }

        async fn replace(&self, c: &str, id: &str, doc: Value) -> Result<bool, StorageError> {
            self.inner.replace(c, id, doc).await
        }

        async fn replace_if(
            &self,
            c: &str,
            id: &str,
            field: &str,
            expected: &str,
            doc: Value,
        ) -> Result<bool, StorageError> {
            self.inner.replace_if(c, id, field, expected, doc).await
        }

        async fn delete(&self, c: &str, id: &str) -> Result<bool, StorageError> {
            self.inner.delete(c, id).await
        }

        async fn count(&self, c: &str) -> Result<u64, StorageError> {
            self.inner.count(c).await
        }

        async fn ping(&self) -> Result<(), StorageError> {
            Ok(())
        }
    }

    fn line(price: i64, quantity: u32) -> QuoteLine {
        QuoteLine {
            product_id: ProductId::generate(),
            name: "Item".to_owned(),
            image: String::new(),
            price: Decimal::from(price),
            quantity,
            total: Decimal::from(price) * Decimal::from(quantity),
        }
    }

    fn store() -> Store {
        let now = Utc::now();
        Store {
            id: StoreId::new("store_test"),
            name: "Test".to_owned(),
            description: String::new(),
            logo: None,
            cover: None,
            subdomain: Subdomain::parse("test").unwrap(),
            owner_id: UserId::new("user_owner"),
            template: "modern-ecommerce".to_owned(),
            customization: StoreCustomization::default(),
            settings: StoreSettings::default(),
            status: StoreStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    fn new_product(name: &str, price: i64, stock: u32) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            description: String::new(),
            price: Decimal::from(price),
            original_price: None,
            images: vec![format!("https://img.example.com/{name}.jpg")],
            category: String::new(),
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

    fn checkout(email: &str) -> CheckoutRequest {
        CheckoutRequest {
            shipping_address: Address {
                first_name: "Sara".to_owned(),
                last_name: "Ali".to_owned(),
                email: email.to_owned(),
                phone: "+966500000000".to_owned(),
                street: "King Fahd Rd".to_owned(),
                city: "Riyadh".to_owned(),
                ..Address::default()
            },
            billing_address: None,
            payment_method: PaymentMethod::CashOnDelivery,
            notes: None,
        }
    }

    #[test]
    fn test_quote_charges_shipping_below_threshold() {
        let settings = StoreSettings::default();
        let quote = Quote::compute(&settings, vec![line(50, 2)], None, Decimal::ZERO);
        assert_eq!(quote.subtotal, Decimal::from(100));
        assert_eq!(quote.shipping_cost, Decimal::from(25));
        assert_eq!(quote.tax_amount, Decimal::ZERO);
        assert_eq!(quote.total, Decimal::from(125));
        assert_eq!(quote.item_count, 2);
        assert_eq!(quote.remaining_for_free_shipping, Some(Decimal::from(100)));
    }

    #[test]
    fn test_quote_free_shipping_and_tax() {
        let mut settings = StoreSettings::default();
        settings.taxes = TaxSettings {
            enabled: true,
            rate: Decimal::from(15),
            include_in_price: false,
        };
        let quote = Quote::compute(&settings, vec![line(150, 1), line(50, 1)], None, Decimal::ZERO);
        assert_eq!(quote.shipping_cost, Decimal::ZERO);
        assert_eq!(quote.tax_amount, Decimal::from(30));
        assert_eq!(quote.total, Decimal::from(230));
        assert_eq!(quote.remaining_for_free_shipping, None);
    }

    #[test]
    fn test_quote_zone_and_discount() {
        let mut settings = StoreSettings::default();
        settings.shipping.zones.push(ShippingZone {
            id: ZoneId::new("zone_jeddah"),
            name: "Jeddah".to_owned(),
            cities: vec!["Jeddah".to_owned()],
            cost: Decimal::from(40),
            estimated_days: "2-3".to_owned(),
        });
        let quote = Quote::compute(&settings, vec![line(10, 1)], Some("jeddah"), Decimal::from(5));
        assert_eq!(quote.shipping_cost, Decimal::from(40));
        assert_eq!(quote.total, Decimal::from(45));
    }

    #[test]
    fn test_price_cart_drops_missing_products() {
        let now = Utc::now();
        let product = Product {
            id: ProductId::new("prod_1"),
            store_id: StoreId::new("store_test"),
            name: "Mug".to_owned(),
            description: String::new(),
            price: Decimal::new(1250, 2),
            original_price: None,
            images: Vec::new(),
            category: String::new(),
            sub_category: None,
            brand: None,
            sku: String::new(),
            stock: 3,
            specifications: BTreeMap::new(),
            variants: Vec::new(),
            tags: Vec::new(),
            rating: 0.0,
            review_count: 0,
            status: ProductStatus::Active,
            featured: false,
            created_at: now,
            updated_at: now,
        };
        let mut cart = Cart::default();
        cart.add(ProductId::new("prod_1"), 2);
        cart.add(ProductId::new("prod_gone"), 1);

        let lines = price_cart(&cart, &[product]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].total, Decimal::from(25));
    }

    #[tokio::test]
    async fn test_place_order_takes_stock_and_records_customer() {
        let docs = MemoryDocumentStore::new();
        let sync = SyncHub::new();
        let store = store();
        let catalog = CatalogService::new(&docs, &sync);
        let orders = OrderService::new(&docs, &sync);

        let mug = catalog
            .create_product(&store.id, new_product("mug", 40, 2))
            .await
            .unwrap();
        let mut cart = Cart::default();
        cart.add(mug.id.clone(), 2);

        let mut rx = sync.subscribe();
        let order = orders
            .place_order(&store, &cart, checkout("Sara@Example.com"))
            .await
            .unwrap();
        assert!(order.order_number.starts_with("ORD-"));
        assert_eq!(order.subtotal, Decimal::from(80));
        assert_eq!(order.shipping_cost, Decimal::from(25));
        assert_eq!(order.total, Decimal::from(105));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.billing_address, order.shipping_address);
        assert_eq!(order.items[0].product_image, "https://img.example.com/mug.jpg");

        let mug = catalog.get_product(&mug.id).await.unwrap().unwrap();
        assert_eq!(mug.stock, 0);
        assert_eq!(mug.status, ProductStatus::OutOfStock);

        let customer = catalog
            .customer_by_email(&store.id, "sara@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(customer.id, order.customer_id);
        assert_eq!(customer.total_orders, 1);
        assert_eq!(customer.total_spent, Decimal::from(105));
        assert_eq!(customer.name, "Sara Ali");

        let mut saw_order = false;
        while let Ok(message) = rx.try_recv() {
            saw_order |= matches!(message.event, SyncEvent::OrderCreated { .. });
        }
        assert!(saw_order);
    }

    #[tokio::test]
    async fn test_place_order_checks_everything_first() {
        let docs = MemoryDocumentStore::new();
        let sync = SyncHub::new();
        let store = store();
        let catalog = CatalogService::new(&docs, &sync);
        let orders = OrderService::new(&docs, &sync);

        let lamp = catalog
            .create_product(&store.id, new_product("lamp", 10, 5))
            .await
            .unwrap();
        let scarce = catalog
            .create_product(&store.id, new_product("scarce", 10, 1))
            .await
            .unwrap();
        let foreign = catalog
            .create_product(&StoreId::new("store_other"), new_product("foreign", 10, 5))
            .await
            .unwrap();

        let mut cart = Cart::default();
        cart.add(lamp.id.clone(), 1);
        cart.add(scarce.id.clone(), 2);
        assert!(matches!(
            orders.place_order(&store, &cart, checkout("a@b.co")).await,
            Err(ServiceError::Conflict(_))
        ));
        // Nothing was taken.
        assert_eq!(catalog.get_product(&lamp.id).await.unwrap().unwrap().stock, 5);

        let mut cart = Cart::default();
        cart.add(foreign.id, 1);
        assert!(matches!(
            orders.place_order(&store, &cart, checkout("a@b.co")).await,
            Err(ServiceError::Invalid(_))
        ));

        let mut cart = Cart::default();
        cart.add(lamp.id.clone(), 1);
        let mut card = checkout("a@b.co");
        card.payment_method = PaymentMethod::CreditCard;
        assert!(matches!(
            orders.place_order(&store, &cart, card).await,
            Err(ServiceError::Invalid(_))
        ));
        assert!(matches!(
            orders.place_order(&store, &cart, checkout("nope")).await,
            Err(ServiceError::Invalid(_))
        ));
        assert!(matches!(
            orders.place_order(&store, &Cart::default(), checkout("a@b.co")).await,
            Err(ServiceError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_order_write_returns_stock() {
        let docs = NoOrders::default();
        let sync = SyncHub::new();
        let store = store();
        let catalog = CatalogService::new(&docs, &sync);
        let orders = OrderService::new(&docs, &sync);

        let mug = catalog
            .create_product(&store.id, new_product("mug", 40, 2))
            .await
            .unwrap();
        let lamp = catalog
            .create_product(&store.id, new_product("lamp", 10, 5))
            .await
            .unwrap();
        let mut cart = Cart::default();
        cart.add(mug.id.clone(), 2);
        cart.add(lamp.id.clone(), 1);

        let result = orders.place_order(&store, &cart, checkout("new@example.com")).await;
        assert!(matches!(result, Err(ServiceError::Storage(_))));

        let mug = catalog.get_product(&mug.id).await.unwrap().unwrap();
        assert_eq!(mug.stock, 2);
        assert_eq!(mug.status, ProductStatus::Active);
        assert_eq!(catalog.get_product(&lamp.id).await.unwrap().unwrap().stock, 5);
        assert!(
            catalog
                .customer_by_email(&store.id, "new@example.com")
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(docs.count(collections::ORDERS).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_repeat_customer_and_status_updates() {
        let docs = MemoryDocumentStore::new();
        let sync = SyncHub::new();
        let store = store();
        let catalog = CatalogService::new(&docs, &sync);
        let orders = OrderService::new(&docs, &sync);

        let lamp = catalog
            .create_product(&store.id, new_product("lamp", 100, 10))
            .await
            .unwrap();
        let mut cart = Cart::default();
        cart.add(lamp.id, 1);

        let first = orders.place_order(&store, &cart, checkout("a@b.co")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = orders.place_order(&store, &cart, checkout("A@B.co")).await.unwrap();
        assert_eq!(first.customer_id, second.customer_id);

        let listed = orders.list_orders(Some(&store.id)).await.unwrap();
        assert_eq!(listed[0].id, second.id);

        let shipped = orders
            .update_order_status(
                &store.id,
                &first.id,
                OrderStatusUpdate {
                    status: OrderStatus::Delivered,
                    payment_status: Some(PaymentStatus::Paid),
                    tracking: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(shipped.payment_status, PaymentStatus::Paid);

        let reopen = orders
            .update_order_status(
                &store.id,
                &first.id,
                OrderStatusUpdate {
                    status: OrderStatus::Processing,
                    payment_status: None,
                    tracking: None,
                },
            )
            .await;
        assert!(matches!(reopen, Err(ServiceError::Conflict(_))));

        assert!(
            orders
                .update_order_status(
                    &StoreId::new("store_other"),
                    &second.id,
                    OrderStatusUpdate {
                        status: OrderStatus::Confirmed,
                        payment_status: None,
                        tracking: None,
                    },
                )
                .await
                .unwrap()
                .is_none()
        );
    }
}
