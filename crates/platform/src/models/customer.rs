//! Store customers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{CustomerId, StoreId};

use crate::db::{Document, collections};

/// A shopper known to one store. The same person buying from two stores
/// has two customer records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub store_id: StoreId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub total_orders: u32,
    #[serde(default)]
    pub total_spent: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_order_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Customer {
    const COLLECTION: &'static str = collections::CUSTOMERS;

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

impl Customer {
    /// Count an order towards the customer's totals.
    pub fn record_order(&mut self, total: Decimal, at: DateTime<Utc>) {
        self.total_orders += 1;
        self.total_spent += total;
        self.last_order_date = Some(at);
        self.updated_at = at;
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

impl CustomerPatch {
    pub fn apply(self, customer: &mut Customer) {
        if let Some(name) = self.name {
            customer.name = name;
        }
        if let Some(email) = self.email {
            customer.email = email;
        }
        if let Some(phone) = self.phone {
            customer.phone = phone;
        }
        if let Some(is_active) = self.is_active {
            customer.is_active = is_active;
        }
    }
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_order_accumulates() {
        let now = Utc::now();
        let mut customer = Customer {
            id: CustomerId::generate(),
            store_id: StoreId::new("store_1"),
            name: "سارة".to_owned(),
            email: "sara@example.com".to_owned(),
            phone: String::new(),
            is_active: true,
            total_orders: 0,
            total_spent: Decimal::ZERO,
            last_order_date: None,
            created_at: now,
            updated_at: now,
        };

        customer.record_order(Decimal::new(14900, 2), now);
        customer.record_order(Decimal::from(51), now);

        assert_eq!(customer.total_orders, 2);
        assert_eq!(customer.total_spent, Decimal::from(200));
        assert_eq!(customer.last_order_date, Some(now));
    }
}
