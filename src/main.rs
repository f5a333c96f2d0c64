use anyhow::Context;
use clap::{Parser, Subcommand};
use errata::{
    config::Config,
    models::ErrorRecord,
    search::{create_index_client, metrics, IndexAvailability, SearchGateway},
    state::create_store,
    ErrorCatalog,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "errata")]
#[command(about = "Search and manage a catalog of programming errors", version)]
struct Cli {
    /// Configuration file (defaults to $ERRATA_CONFIG, then config/errata.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Use the primary search index regardless of configuration
    #[arg(long, global = true, conflicts_with = "disable_index")]
    enable_index: bool,

    /// Skip the primary search index regardless of configuration
    #[arg(long, global = true)]
    disable_index: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search error records
    Search {
        #[arg(value_name = "QUERY")]
        query: String,
    },

    /// Show one error record
    Get {
        #[arg(value_name = "ID")]
        id: Uuid,
    },

    /// Import records from a JSON array file
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Delete an error record
    Delete {
        #[arg(value_name = "ID")]
        id: Uuid,
    },

    /// Rebuild the search index from the record store
    Reindex,

    /// List all error records
    List,
}

impl Cli {
    fn index_override(&self) -> Option<bool> {
        match (self.enable_index, self.disable_index) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config);

    tracing::debug!("Starting errata v{}", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        metrics::init_search_metrics();
    }

    let store = create_store(&config.store).context("Failed to open record store")?;

    let enabled = cli.index_override().unwrap_or(config.search.enabled);
    let availability = IndexAvailability::new(enabled);
    let index = create_index_client(&config.search)
        .await
        .context("Failed to initialize search index client")?;
    tracing::debug!(enabled, backend = index.backend_name(), "Search index configured");

    let gateway = Arc::new(SearchGateway::new(availability, index, store.clone()));
    let catalog = ErrorCatalog::new(store, gateway);

    match cli.command {
        Commands::Search { query } => {
            let response = catalog.search(&query).await?;
            print_json(&response)?;
        }
        Commands::Get { id } => {
            let record = catalog.get(&id).await?;
            print_json(&record)?;
        }
        Commands::Import { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let records: Vec<ErrorRecord> = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a JSON array of error records", file.display()))?;
            let summary = catalog.import(records).await?;
            print_json(&summary)?;
        }
        Commands::Delete { id } => {
            let removed = catalog.delete(&id).await?;
            print_json(&removed)?;
        }
        Commands::Reindex => {
            if !catalog.gateway().availability().is_enabled() {
                tracing::warn!("Search index is disabled, nothing will be indexed");
            }
            let records = catalog.store().count().await?;
            tracing::info!(records, "Rebuilding search index from the record store");
            let report = catalog.gateway().reindex_from_store().await?;
            print_json(&serde_json::json!({
                "succeeded": report.succeeded.len(),
                "failed": report
                    .failed
                    .iter()
                    .map(|f| serde_json::json!({ "id": f.id, "cause": f.cause.to_string() }))
                    .collect::<Vec<_>>(),
            }))?;
        }
        Commands::List => {
            let records = catalog.list().await?;
            print_json(&records)?;
        }
    }

    if config.observability.metrics_enabled {
        eprintln!("{}", metrics::gather_metrics());
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("errata={}", config.observability.log_level).into());

    // Logs go to stderr so command output stays pipeable
    if config.observability.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
