//! Collection names shared by every backend.

pub const STORES: &str = "stores";
pub const PRODUCTS: &str = "products";
pub const CATEGORIES: &str = "categories";
pub const CUSTOMERS: &str = "customers";
pub const ORDERS: &str = "orders";
pub const APPLICATIONS: &str = "storeApplications";
pub const USERS: &str = "users";

/// Every collection, in dependency order.
pub const ALL: &[&str] = &[USERS, APPLICATIONS, STORES, CATEGORIES, PRODUCTS, CUSTOMERS, ORDERS];
