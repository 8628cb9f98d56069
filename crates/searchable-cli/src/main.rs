#![forbid(unsafe_code)]

//! Searchable CLI
//!
//! Maintenance commands for the search index: a full reindex and a dump of
//! the derived search mappings.

mod config;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use searchable_core::{MemoryStore, ModelRegistry, Snapshot};
use searchable_fts::{create_engine, SchemaBuilder, SearchEngine};
use searchable_sync::{ReindexReport, ReindexTask, SearchService};

use crate::config::{CliConfig, CONFIG_ENV};

/// Searchable - search index maintenance
#[derive(Parser, Debug)]
#[command(name = "searchable")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = CONFIG_ENV, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Define the mappings, repopulate and refresh the index
    Reindex,
    /// Print the search mapping of every indexable type as JSON
    Schema {
        /// Only print this type
        type_name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = CliConfig::load(args.config.as_deref()).context("loading configuration")?;

    match args.command {
        Command::Reindex => reindex(config).await,
        Command::Schema { type_name } => schema(&config, type_name.as_deref()),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn load_registry(config: &CliConfig) -> Result<Arc<ModelRegistry>> {
    let path = config
        .content
        .models
        .as_deref()
        .context("no content models configured ([content] models)")?;
    let registry = ModelRegistry::load(path)
        .with_context(|| format!("loading models from {}", path.display()))?;
    Ok(Arc::new(registry))
}

fn build_service(config: &CliConfig) -> Result<SearchService> {
    let registry = load_registry(config)?;

    let snapshot = match &config.content.snapshot {
        Some(path) => Snapshot::load(path)
            .with_context(|| format!("loading content snapshot from {}", path.display()))?,
        None => {
            tracing::warn!("No content snapshot configured; the index will be empty");
            Snapshot::default()
        }
    };
    let mut store = MemoryStore::from_snapshot(registry.clone(), snapshot)?;
    if let Some(assets) = &config.content.assets {
        store = store.with_asset_root(assets);
    }

    let engine: Arc<dyn SearchEngine> = Arc::from(create_engine(&config.search)?);
    tracing::info!("Using {} search engine", engine.name());

    Ok(SearchService::new(
        registry,
        Arc::new(store),
        engine,
        config.search.clone(),
    ))
}

async fn reindex(config: CliConfig) -> Result<()> {
    let service = Arc::new(build_service(&config)?);
    let limit = Duration::from_secs(config.search.time_limit_secs);

    match run_with_limit(ReindexTask::new(service), limit).await? {
        Some(_) => Ok(()),
        None => {
            tracing::error!("Reindex exceeded the time limit of {}s", limit.as_secs());
            // The blocking run cannot be interrupted; leave without waiting for it.
            std::process::exit(2);
        }
    }
}

/// Run the task on a blocking thread. `None` means the limit was reached
/// first.
async fn run_with_limit(task: ReindexTask, limit: Duration) -> Result<Option<ReindexReport>> {
    let handle = tokio::task::spawn_blocking(move || {
        let mut out = std::io::stdout().lock();
        task.run(&mut out)
    });

    match tokio::time::timeout(limit, handle).await {
        Ok(joined) => {
            let report = joined.context("reindex task panicked")??;
            Ok(Some(report))
        }
        Err(_) => Ok(None),
    }
}

fn schema(config: &CliConfig, type_name: Option<&str>) -> Result<()> {
    let mappings = mappings(config, type_name)?;
    println!("{}", serde_json::to_string_pretty(&mappings)?);
    Ok(())
}

/// Mapping definition of one type, or of every indexable type. No engine is
/// created, so nothing is written to the index path.
fn mappings(
    config: &CliConfig,
    type_name: Option<&str>,
) -> Result<BTreeMap<String, serde_json::Value>> {
    let registry = load_registry(config)?;
    let builder = SchemaBuilder::new(&registry, &config.search);

    let names: Vec<String> = match type_name {
        Some(name) => {
            registry.model(name)?;
            vec![name.to_string()]
        }
        None => registry.indexable().map(|m| m.name.clone()).collect(),
    };

    let mut mappings = BTreeMap::new();
    for name in names {
        let schema = builder.build(&name)?;
        mappings.insert(name, schema.to_mapping());
    }
    Ok(mappings)
}

// ============================================================================
// Tests
// ============================================================================
