//! Shopfront CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (including the session table)
//! shopfront-cli migrate
//!
//! # Create an administrator
//! shopfront-cli user create -u admin -e admin@example.com -p 'a long password' --admin
//!
//! # Toggle admin rights
//! shopfront-cli user promote -u alice
//! shopfront-cli user demote -u alice
//!
//! # Catalog
//! shopfront-cli category create -n Mugs
//! shopfront-cli category delete -n Mugs
//! shopfront-cli seed
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "shopfront-cli")]
#[command(author, version, about = "Shopfront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage categories
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Insert a small demo catalog (skips names that already exist)
    Seed,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Username
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,

        /// Grant administrator rights
        #[arg(long)]
        admin: bool,
    },
    /// Grant administrator rights
    Promote {
        /// Username
        #[arg(short, long)]
        username: String,
    },
    /// Revoke administrator rights
    Demote {
        /// Username
        #[arg(short, long)]
        username: String,
    },
}

#[derive(Subcommand)]
enum CategoryAction {
    /// Create a new category
    Create {
        /// Category name
        #[arg(short, long)]
        name: String,
    },
    /// Delete a category that no product uses
    Delete {
        /// Category name
        #[arg(short, long)]
        name: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                email,
                password,
                admin,
            } => commands::users::create(&username, &email, &password, admin).await?,
            UserAction::Promote { username } => commands::users::set_admin(&username, true).await?,
            UserAction::Demote { username } => commands::users::set_admin(&username, false).await?,
        },
        Commands::Category { action } => match action {
            CategoryAction::Create { name } => commands::catalog::create_category(&name).await?,
            CategoryAction::Delete { name } => commands::catalog::delete_category(&name).await?,
        },
        Commands::Seed => commands::catalog::seed().await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_user_create() {
        let cli = Cli::try_parse_from([
            "shopfront-cli",
            "user",
            "create",
            "-u",
            "alice",
            "-e",
            "alice@example.com",
            "-p",
            "hunter2hunter2",
            "--admin",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::User {
                action: UserAction::Create { admin: true, .. }
            })
        ));
    }

    #[test]
    fn test_parse_category_delete() {
        let cli = Cli::try_parse_from(["shopfront-cli", "category", "delete", "-n", "Mugs"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Category {
                action: CategoryAction::Delete { name }
            }) if name == "Mugs"
        ));
    }
}
