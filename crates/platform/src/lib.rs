//! Bazaar Platform library.
//!
//! The multi-tenant store platform as a library, so the binary, the CLI and
//! the integration tests share one router and one set of services.
//!
//! # Architecture
//!
//! - [`db`] - document store backends (`PostgreSQL`, memory, fallback)
//! - [`models`] - persisted entities and their inputs
//! - [`services`] - applications, stores, catalog, orders, storefront
//!   resolution and the sync hub
//! - [`routes`] / [`middleware`] - the axum HTTP surface
//! - [`app`] - router assembly shared by `main` and the integration tests

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use app::build_app;
pub use config::PlatformConfig;
pub use state::AppState;
