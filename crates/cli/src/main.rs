//! Solemate CLI - Product listing and cart session.
//!
//! # Usage
//!
//! ```bash
//! # List products from the catalog at CATALOG_BASE_URL
//! solemate products
//!
//! # List products from a JSON dump instead
//! solemate --catalog-file products.json products
//!
//! # Interactive cart session (commands on stdin)
//! solemate cart
//! ```
//!
//! # Commands
//!
//! - `products` - Print the product listing with formatted prices
//! - `cart` - Read cart commands (`add`, `set`, `inc`, `dec`, `remove`, ...)
//!   from stdin and print the cart after each one

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use solemate_storefront::catalog::{HttpCatalog, InMemoryCatalog, ProductCatalog};
use solemate_storefront::error::report;
use solemate_storefront::{StorefrontConfig, StorefrontError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "solemate")]
#[command(author, version, about = "Solemate storefront CLI")]
struct Cli {
    /// Serve products from a JSON file instead of the HTTP catalog
    #[arg(long, global = true)]
    catalog_file: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products with their prices
    Products,
    /// Start an interactive cart session reading commands from stdin
    Cart,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the tracing subscriber. Logs go to stderr; stdout is for output.
fn init_tracing() {
    // Defaults to warn so log lines don't interleave with the session
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "solemate_storefront=warn,solemate=warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            report(&StorefrontError::from(e));
            return ExitCode::FAILURE;
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let catalog: Arc<dyn ProductCatalog> = match &cli.catalog_file {
        Some(path) => {
            let catalog = InMemoryCatalog::load(path).await?;
            tracing::info!(path = %path.display(), products = catalog.len(), "Loaded catalog file");
            Arc::new(catalog)
        }
        None => Arc::new(HttpCatalog::new(&config.catalog)?),
    };

    match cli.command {
        Commands::Products => commands::products::list(catalog.as_ref(), config, cli.json).await?,
        Commands::Cart => commands::cart::session(catalog.as_ref(), config, cli.json).await?,
    }
    Ok(())
}
