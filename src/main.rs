// todo-list: serve the TODO pages, or manage the table from the terminal
//
// Usage:
//   todo-list serve       Run the web application
//   todo-list admin       Open the terminal admin on the same database
//   todo-list migrate     Create or upgrade the database schema

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use todo_list::app::{admin, server, storage::Storage};
use todo_list::config::Settings;

#[derive(Parser)]
#[command(name = "todo-list")]
#[command(author, version, about = "A small TODO list over SQLite")]
struct Cli {
    /// Settings file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web application
    Serve {
        /// Address to listen on
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// SQLite database file
        #[arg(long)]
        database: Option<PathBuf>,
    },

    /// Open the terminal admin
    Admin {
        /// SQLite database file
        #[arg(long)]
        database: Option<PathBuf>,
    },

    /// Create or upgrade the database schema
    Migrate {
        /// SQLite database file
        #[arg(long)]
        database: Option<PathBuf>,
    },
}

fn init_logging(settings: &Settings, verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|error| anyhow::anyhow!("install log subscriber: {error}"))
}

fn open_storage(settings: &Settings) -> Result<Storage> {
    Storage::open(&settings.database)
        .with_context(|| format!("open database {}", settings.database.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind, database } => {
            if let Some(bind) = bind {
                settings.bind = bind;
            }
            if let Some(database) = database {
                settings.database = database;
            }
            init_logging(&settings, cli.verbose)?;
            server::serve(&settings).await
        }
        Commands::Admin { database } => {
            if let Some(database) = database {
                settings.database = database;
            }
            // No log subscriber here, the terminal belongs to the admin UI
            tokio::task::spawn_blocking(move || -> Result<()> {
                let storage = open_storage(&settings)?;
                admin::run(&storage).context("admin terminal failed")
            })
            .await?
        }
        Commands::Migrate { database } => {
            if let Some(database) = database {
                settings.database = database;
            }
            init_logging(&settings, cli.verbose)?;
            let storage = open_storage(&settings)?;
            println!(
                "{}: schema version {}",
                settings.database.display(),
                storage.schema_version()?
            );
            Ok(())
        }
    }
}
