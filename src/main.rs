//! Remote Select CLI
//!
//! Runs lookups from the command line against the configured database.
//!
//! # Usage
//!
//! ```bash
//! # First page of hosts matching "db"
//! remote-select search hosts --term db
//!
//! # Label for a known identifier
//! remote-select pair hosts 42
//!
//! # Validate a submitted identifier
//! remote-select exists sites 6ba7b810-9dad-11d1-80b4-00c04fd430c8
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use remote_select::{
    BoundLookup, LookupEngine, LookupId, LookupRegistry, LookupsFile, PairLookup, PgSource,
    SearchRequest, SearchResponseBody,
};

#[derive(Parser)]
#[command(name = "remote-select")]
#[command(version)]
#[command(about = "Ranked typeahead lookups over relational tables")]
struct Cli {
    /// Lookup configuration file
    #[arg(
        long,
        short,
        global = true,
        env = "REMOTE_SELECT_CONFIG",
        default_value = "config/lookups.yaml"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One page of ranked results
    Search {
        /// Lookup name
        lookup: String,

        /// Search term (omit for an unfiltered listing)
        #[arg(long, short)]
        term: Option<String>,

        /// 1-based page number
        #[arg(long, short, default_value_t = 1)]
        page: u32,
    },

    /// Display pair for an identifier
    Pair { lookup: String, id: String },

    /// Whether an identifier belongs to the lookup
    Exists { lookup: String, id: String },

    /// List configured lookups
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "remote_select=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    tracing::info!(path = %cli.config.display(), "Loading configuration");
    let config = LookupsFile::from_file(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    let output = match cli.command {
        Commands::List => {
            let mut names: Vec<&String> = config.lookups.keys().collect();
            names.sort();
            serde_json::to_value(names)?
        }
        Commands::Search { lookup, term, page } => {
            let bound = open_lookup(&config, &lookup).await?;
            let request = SearchRequest {
                search_string: term,
                page,
            };
            let response = SearchResponseBody::from(bound.search(&request).await?);
            serde_json::to_value(response)?
        }
        Commands::Pair { lookup, id } => {
            let bound = open_lookup(&config, &lookup).await?;
            serde_json::to_value(bound.optional_pair(&LookupId::from(id)).await?)?
        }
        Commands::Exists { lookup, id } => {
            let bound = open_lookup(&config, &lookup).await?;
            serde_json::to_value(bound.has_id(&LookupId::from(id)).await?)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Connect to the database and bind the named lookup
async fn open_lookup(config: &LookupsFile, name: &str) -> Result<BoundLookup> {
    let source = PgSource::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    let registry = LookupRegistry::from_config(config, LookupEngine::new(Arc::new(source)))?;

    tracing::info!(lookups = registry.len(), "Lookups ready");

    registry
        .get(name)
        .with_context(|| format!("Unknown lookup '{name}'"))
}
