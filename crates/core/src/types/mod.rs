//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod customization;
pub mod email;
pub mod id;
pub mod money;
pub mod settings;
pub mod status;
pub mod subdomain;

pub use customization::*;
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{CurrencyCode, round_money};
pub use settings::*;
pub use status::*;
pub use subdomain::{Subdomain, SubdomainError};
