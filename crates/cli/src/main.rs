//! Handicraft CLI - catalog browsing, admin edits, settings, and migrations.
//!
//! # Usage
//!
//! ```bash
//! # First page of brass idols, cheapest first
//! handicraft products --category Idols --material Brass --sort price-asc
//!
//! # Weight-aware search over the whole catalog
//! handicraft products --search 2kg
//!
//! # Search as you type: one term per line on stdin
//! handicraft search --debounce-ms 300
//!
//! # Work offline against an exported catalog
//! handicraft --fixture catalog.json products --visibility hidden
//!
//! # Mark products as featured
//! handicraft bulk --ids 3,7,12 --featured true
//!
//! # Switch product cards to the "complete" preset
//! handicraft settings preset complete
//!
//! # Create the products table
//! handicraft migrate
//! ```
//!
//! All command output is JSON on stdout. Logs go to stderr.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use handicraft_storefront::config::{CatalogConfig, ConfigError};
use handicraft_storefront::store::{AnyCatalogStore, MemoryCatalogStore};

mod commands;

use commands::admin::{BulkArgs, UpdateArgs};
use commands::catalog::{ProductsArgs, SearchArgs};
use commands::settings::SettingsAction;

#[derive(Parser)]
#[command(name = "handicraft")]
#[command(author, version, about = "Handicraft catalog tools")]
struct Cli {
    /// Serve reads and writes from a JSON export instead of the configured store
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List one page of products matching the given filters
    Products(ProductsArgs),
    /// Search terms read from stdin, applied once typing pauses
    Search(SearchArgs),
    /// Show a single product
    Product {
        /// Product id
        id: i64,
    },
    /// Show facet values and the catalog price span
    Filters,
    /// Edit one product
    Update(UpdateArgs),
    /// Apply the same change to several products
    Bulk(BulkArgs),
    /// Show or change display preferences
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Create or upgrade the products table (`PostgreSQL` backend only)
    Migrate,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CatalogConfig) -> Option<sentry::ClientInitGuard> {
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

    Some(guard)
}

/// Errors and warnings become Sentry events; info and debug become breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = CatalogConfig::from_env();

    let sentry_guard = config.as_ref().ok().and_then(init_sentry);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "handicraft_storefront=info,handicraft_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let code = match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    };

    // Flushes queued events before the process exits
    drop(sentry_guard);
    code
}

async fn run(
    cli: Cli,
    config: Result<CatalogConfig, ConfigError>,
) -> Result<(), Box<dyn std::error::Error>> {
    let context = commands::Context::new(config.as_ref().ok());

    match cli.command {
        Commands::Settings { action } => commands::settings::run(&context, action).await,
        Commands::Migrate => commands::migrate::run(&config?).await,
        command => {
            if let Some(path) = cli.fixture {
                let json = tokio::fs::read_to_string(&path).await?;
                let store = MemoryCatalogStore::from_json(&json)?;
                tracing::info!(path = %path.display(), products = store.len(), "Using fixture catalog");
                dispatch(command, store, &context).await
            } else {
                let store = AnyCatalogStore::connect(&config?).await?;
                dispatch(command, store, &context).await
            }
        }
    }
}

async fn dispatch<S>(
    command: Commands,
    store: S,
    context: &commands::Context,
) -> Result<(), Box<dyn std::error::Error>>
where
    S: handicraft_storefront::CatalogStore,
{
    match command {
        Commands::Products(args) => commands::catalog::products(store, context, args).await,
        Commands::Search(args) => commands::catalog::search(store, context, args).await,
        Commands::Product { id } => commands::catalog::product(store, id).await,
        Commands::Filters => commands::catalog::filters(store).await,
        Commands::Update(args) => commands::admin::update(store, args).await,
        Commands::Bulk(args) => commands::admin::bulk(store, args).await,
        // Handled before a store is opened
        Commands::Settings { .. } | Commands::Migrate => Ok(()),
    }
}
