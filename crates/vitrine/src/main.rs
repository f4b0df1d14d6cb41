//! Vitrine - admin console client for the catalog API
//!
//! Main entry point for the Vitrine CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{auth, config, request, resources};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Vitrine - admin console client for the catalog API
#[derive(Parser)]
#[command(name = "vitrine")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// API base URL (overrides config files)
    #[arg(long, global = true, env = "VITRINE_API_HOST")]
    pub api_host: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and persist the session
    Login(auth::LoginArgs),

    /// Sign out and clear the persisted session
    Logout,

    /// Show the current session
    Status(auth::StatusArgs),

    /// Keep the session alive in the foreground
    Watch,

    /// Issue a raw authenticated request
    Request(request::RequestArgs),

    /// Brand management
    Brands(resources::FormResourceArgs),

    /// Category management
    Categories(resources::FormResourceArgs),

    /// Subcategory management
    Subcategories(resources::FormResourceArgs),

    /// Product management
    Products(resources::FormResourceArgs),

    /// Tag management
    Tags(resources::TagArgs),

    /// Characteristic group management
    Characteristics(resources::CharacteristicArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing: console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "vitrine=debug,vitrine_client=debug,vitrine_session=debug,vitrine_config=debug,info"
    } else {
        "vitrine=info,vitrine_client=warn,vitrine_session=warn,warn"
    };

    let log_dir = vitrine_config::xdg_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "vitrine.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "vitrine=trace,vitrine_client=trace,vitrine_session=trace,vitrine_config=trace,info",
                )),
        )
        .init();

    // Load layered config; the CLI flag wins over files and environment
    let cwd = std::env::current_dir()?;
    let loaded = vitrine_config::load_config(Some(&cwd))?;
    let mut config = loaded.config.clone();
    if let Some(host) = cli.api_host {
        config = config.with_api_host(host);
    }

    let ctx = commands::Context {
        config,
        loaded,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Login(args) => auth::login(args, &ctx).await,
        Commands::Logout => auth::logout(&ctx).await,
        Commands::Status(args) => auth::status(args, &ctx).await,
        Commands::Watch => auth::watch(&ctx).await,
        Commands::Request(args) => request::run(args, &ctx).await,
        Commands::Brands(args) => resources::run_form(resources::FormResource::Brands, args, &ctx).await,
        Commands::Categories(args) => {
            resources::run_form(resources::FormResource::Categories, args, &ctx).await
        }
        Commands::Subcategories(args) => {
            resources::run_form(resources::FormResource::Subcategories, args, &ctx).await
        }
        Commands::Products(args) => {
            resources::run_form(resources::FormResource::Products, args, &ctx).await
        }
        Commands::Tags(args) => resources::run_tags(args, &ctx).await,
        Commands::Characteristics(args) => resources::run_characteristics(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
