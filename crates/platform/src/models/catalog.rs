//! Products and categories.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{CategoryId, ProductId, ProductStatus, StoreId, VariantId};

use crate::db::{Document, collections};

/// A product listed by a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub store_id: StoreId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<String>,
    /// Category name, as shown on the storefront.
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Product {
    const COLLECTION: &'static str = collections::PRODUCTS;

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

impl Product {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Percentage off the original price, if discounted.
    #[must_use]
    pub fn discount_percent(&self) -> Option<Decimal> {
        let original = self.original_price?;
        (original > self.price && original > Decimal::ZERO).then(|| {
            ((original - self.price) / original * Decimal::ONE_HUNDRED).round()
        })
    }

    /// Remove `quantity` from stock, marking the product out of stock when
    /// nothing is left.
    pub fn take_stock(&mut self, quantity: u32) {
        self.stock = self.stock.saturating_sub(quantity);
        if self.stock == 0 {
            self.status = ProductStatus::OutOfStock;
        }
    }

    /// Put back stock taken by [`Product::take_stock`].
    pub fn return_stock(&mut self, quantity: u32) {
        self.stock = self.stock.saturating_add(quantity);
        if self.stock > 0 && self.status == ProductStatus::OutOfStock {
            self.status = ProductStatus::Active;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: VariantId,
    pub name: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Fields a merchant supplies when creating a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub featured: bool,
}

/// Partial product update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub images: Option<Vec<String>>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub brand: Option<String>,
    pub sku: Option<String>,
    pub stock: Option<u32>,
    pub specifications: Option<BTreeMap<String, String>>,
    pub variants: Option<Vec<ProductVariant>>,
    pub tags: Option<Vec<String>>,
    pub status: Option<ProductStatus>,
    pub featured: Option<bool>,
}

impl ProductPatch {
    /// Copy every present field onto `product`.
    pub fn apply(self, product: &mut Product) {
        let Self {
            name,
            description,
            price,
            original_price,
            images,
            category,
            sub_category,
            brand,
            sku,
            stock,
            specifications,
            variants,
            tags,
            status,
            featured,
        } = self;

        replace(&mut product.name, name);
        replace(&mut product.description, description);
        replace(&mut product.price, price);
        replace(&mut product.images, images);
        replace(&mut product.category, category);
        replace(&mut product.sku, sku);
        replace(&mut product.stock, stock);
        replace(&mut product.specifications, specifications);
        replace(&mut product.variants, variants);
        replace(&mut product.tags, tags);
        replace(&mut product.status, status);
        replace(&mut product.featured, featured);
        if original_price.is_some() {
            product.original_price = original_price;
        }
        if sub_category.is_some() {
            product.sub_category = sub_category;
        }
        if brand.is_some() {
            product.brand = brand;
        }
    }
}

fn replace<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// A storefront category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub store_id: StoreId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CategoryId>,
    #[serde(default)]
    pub sort: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Document for Category {
    const COLLECTION: &'static str = collections::CATEGORIES;

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default)]
    pub sort: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: i64, stock: u32) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::generate(),
            store_id: StoreId::new("store_1"),
            name: "Lamp".to_owned(),
            description: String::new(),
            price: Decimal::from(price),
            original_price: None,
            images: Vec::new(),
            category: String::new(),
            sub_category: None,
            brand: None,
            sku: "LAMP-001".to_owned(),
            stock,
            specifications: BTreeMap::new(),
            variants: Vec::new(),
            tags: Vec::new(),
            rating: 0.0,
            review_count: 0,
            status: ProductStatus::Active,
            featured: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_take_stock_marks_out_of_stock() {
        let mut p = product(10, 3);
        p.take_stock(2);
        assert_eq!(p.stock, 1);
        assert!(p.is_active());
        p.take_stock(1);
        assert_eq!(p.stock, 0);
        assert_eq!(p.status, ProductStatus::OutOfStock);
    }

    #[test]
    fn test_discount_percent() {
        let mut p = product(1999, 1);
        assert_eq!(p.discount_percent(), None);
        p.original_price = Some(Decimal::from(2299));
        assert_eq!(p.discount_percent(), Some(Decimal::from(13)));
    }

    #[test]
    fn test_patch_only_touches_present_fields() {
        let mut p = product(10, 3);
        ProductPatch {
            price: Some(Decimal::from(12)),
            brand: Some("Acme".to_owned()),
            ..ProductPatch::default()
        }
        .apply(&mut p);
        assert_eq!(p.price, Decimal::from(12));
        assert_eq!(p.brand.as_deref(), Some("Acme"));
        assert_eq!(p.stock, 3);
        assert_eq!(p.name, "Lamp");
    }
}
