//! Domain models for the platform.
//!
//! Every persisted entity implements [`crate::db::Document`] and is stored
//! as camelCase JSON. Creation inputs (`New*`) and partial updates (`*Patch`)
//! live next to their entity.

pub mod application;
pub mod cart;
pub mod catalog;
pub mod customer;
pub mod order;
pub mod session;
pub mod store;
pub mod user;

pub use application::{
    AppliedCustomization, ApplicationForm, ApplicationStats, MerchantData, StoreApplication,
    StoreConfig,
};
pub use cart::{Cart, CartLine, total_quantity};
pub use catalog::{Category, NewCategory, NewProduct, Product, ProductPatch, ProductVariant};
pub use customer::{Customer, CustomerPatch, NewCustomer};
pub use order::{Address, Order, OrderItem, OrderStatusUpdate, Tracking};
pub use session::{CurrentUser, cart_key, keys as session_keys};
pub use store::{Store, StoreDraft, StorePatch};
pub use user::User;
