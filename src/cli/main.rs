use adaptive_search::config::EngineConfig;
use adaptive_search::models::Item;
use adaptive_search::search::{FilterSet, PriceRange, Query, SearchEngine};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "adaptive-search")]
#[command(about = "Search a JSON item catalog with the adaptive search engine", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file layered over the built-in defaults
    #[arg(short, long, global = true, env = "ADAPTIVE_SEARCH_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query and print results with provenance
    Search {
        #[command(flatten)]
        query: QueryArgs,

        /// Maximum results to return
        #[arg(short, long)]
        limit: Option<usize>,

        /// Run the query this many times (later runs hit the cache)
        #[arg(short, long, default_value = "1")]
        repeat: usize,
    },

    /// Build the index and print its statistics
    Index {
        /// JSON array of items
        #[arg(short, long)]
        items: PathBuf,
    },

    /// Run a query and print the engine's performance statistics
    Stats {
        #[command(flatten)]
        query: QueryArgs,

        #[arg(short, long, default_value = "1")]
        repeat: usize,
    },
}

#[derive(Args)]
struct QueryArgs {
    /// JSON array of items
    #[arg(short, long)]
    items: PathBuf,

    /// Free text
    #[arg(short, long, default_value = "")]
    query: String,

    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    min_price: Option<f64>,

    #[arg(long)]
    max_price: Option<f64>,

    #[arg(long)]
    manufacturer: Option<String>,

    #[arg(long)]
    in_stock: Option<bool>,

    /// Required tag (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,
}

impl QueryArgs {
    fn to_query(&self) -> Query {
        let price = match (self.min_price, self.max_price) {
            (None, None) => None,
            (min, max) => Some(PriceRange::new(min, max)),
        };

        Query::new(self.query.clone()).with_filters(FilterSet {
            category: self.category.clone(),
            price,
            manufacturer: self.manufacturer.clone(),
            in_stock: self.in_stock,
            tags: self.tags.clone(),
        })
    }
}

fn load_items(path: &Path) -> Result<Vec<Item>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read items from {}", path.display()))?;
    let items: Vec<Item> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse items in {}", path.display()))?;
    Ok(items)
}

async fn run_query(engine: &SearchEngine, args: &QueryArgs, repeat: usize) -> Result<()> {
    let items = load_items(&args.items)?;
    let query = args.to_query();

    for _ in 0..repeat.max(1) {
        let response = engine
            .search(&items, &query, &CancellationToken::new())
            .await?
            .context("Search was cancelled")?;
        println!("{}", serde_json::to_string_pretty(&response)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "adaptive_search=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let mut config = EngineConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Search {
            query,
            limit,
            repeat,
        } => {
            if let Some(limit) = limit {
                config.search.max_results = limit;
            }
            let engine = SearchEngine::new(config)?;
            run_query(&engine, &query, repeat).await?;
        }

        Commands::Index { items } => {
            let engine = SearchEngine::new(config)?;
            let items = load_items(&items)?;
            let stats = engine.initialize_index(&items, None).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }

        Commands::Stats { query, repeat } => {
            let engine = SearchEngine::new(config)?;
            run_query(&engine, &query, repeat).await?;
            let stats = engine.performance_stats().await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}
