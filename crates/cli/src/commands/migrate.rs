//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! bazaar-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `BAZAAR_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! `crates/platform/migrations/`: the `documents` table and the
//! `tower_sessions.session` table.

use super::{CliError, connect};

/// Run the platform database migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the database cannot be
/// reached, or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running platform migrations...");
    sqlx::migrate!("../platform/migrations").run(&pool).await?;

    tracing::info!("Platform migrations complete!");
    Ok(())
}
