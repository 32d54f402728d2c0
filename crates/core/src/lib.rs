//! Bazaar Core - Shared types library.
//!
//! This crate provides the domain types used across all Bazaar components:
//! - `platform` - The multi-tenant server (storefronts, merchant and admin APIs)
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Prefixed string IDs, emails, money, statuses, subdomains and
//!   the storefront customization / settings documents

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
