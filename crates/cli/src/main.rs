//! Bazaar CLI - database migrations, demo data and user management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! bazaar-cli migrate
//!
//! # Create the demo accounts, a sample application and a sample store
//! bazaar-cli seed demo
//!
//! # Load a catalog into a store (bundled sample catalog without --file)
//! bazaar-cli seed store store_abc123 --file catalog.yaml
//!
//! # Create a platform admin
//! bazaar-cli user create -e admin@example.com -n "Admin Name" -r admin -p 'long-password'
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed demo` / `seed store` - Seed development data
//! - `user create` - Create user accounts

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bazaar-cli")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed development data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Create demo accounts, a sample application and a sample store
    Demo,
    /// Load categories, products and customers into a store
    Store {
        /// ID of the store to fill
        store_id: String,

        /// YAML catalog file (defaults to the bundled sample catalog)
        #[arg(short, long)]
        file: Option<String>,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Login email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`admin`, `merchant`, `customer`)
        #[arg(short, long, default_value = "admin")]
        role: String,

        /// Initial password
        #[arg(short, long, env = "BAZAAR_USER_PASSWORD")]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Demo => commands::seed::demo().await?,
            SeedTarget::Store { store_id, file } => {
                commands::seed::store(&store_id, file.as_deref()).await?;
            }
        },
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::user::create(&email, &name, &role, &password).await?;
            }
        },
    }
    Ok(())
}
