//! FreshDart CLI - database migrations, seed data and account management.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! fd-cli migrate
//!
//! # Load the demo catalog and shipping rates
//! fd-cli seed
//!
//! # Create a producer account
//! fd-cli user create -e lito@farm.ph -n "Lito Reyes" -r PRODUCER -p 'long-password'
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "fd-cli")]
#[command(author, version, about = "FreshDart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Upsert categories, products and shipping rates from a YAML file
    Seed {
        /// Path to the seed file
        #[arg(short, long, default_value = commands::seed::DEFAULT_SEED_FILE)]
        file: String,
    },
    /// Manage marketplace accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an account
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`CUSTOMER`, `MERCHANT`, `PRODUCER`)
        #[arg(short, long, default_value = "CUSTOMER")]
        role: String,

        /// Initial password
        #[arg(short, long)]
        password: String,
    },
    /// List accounts
    List {
        /// Only show this role
        #[arg(short, long)]
        role: Option<String>,
    },
    /// Replace an account's password
    SetPassword {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => {
            commands::seed::run(&file).await?;
        }
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::user::create(&email, &name, &role, &password).await?;
            }
            UserAction::List { role } => commands::user::list(role.as_deref()).await?,
            UserAction::SetPassword { email, password } => {
                commands::user::set_password(&email, &password).await?;
            }
        },
    }
    Ok(())
}
