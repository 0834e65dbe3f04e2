use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use fabx_core::{FieldCatalog, Record};
use fabx_engine::{SearchEngine, SearchPolicy};
use fabx_store::{Attachment, MemoryStore};

/// Fabric catalog search engine - local demo runner
#[derive(Parser, Debug)]
#[command(name = "fabx")]
#[command(about = "Search and rank a fabric product catalog", long_about = None)]
struct Args {
    /// Path to the catalog file (JSON array of records)
    #[arg(short, long)]
    catalog: PathBuf,

    /// Optional attachment file (JSON array of {name, url, kind})
    #[arg(long)]
    attachments: Option<PathBuf>,

    /// Query as inline JSON (object for one query, array for a batch)
    #[arg(short, long)]
    query: Option<String>,

    /// Fetch a single product detail by identifier instead of searching
    #[arg(long)]
    detail: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting fabx v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(MemoryStore::default());

    let catalog_json = std::fs::read_to_string(&args.catalog)?;
    let records: Vec<Record> = serde_json::from_str(&catalog_json)?;
    info!("Loaded {} records from {:?}", records.len(), args.catalog);
    store.load_records(records);

    if let Some(path) = &args.attachments {
        let attachment_json = std::fs::read_to_string(path)?;
        let attachments: Vec<Attachment> = serde_json::from_str(&attachment_json)?;
        info!("Loaded {} attachments from {:?}", attachments.len(), path);
        store.load_attachments(attachments);
    }

    let engine = SearchEngine::new(store, FieldCatalog::default(), SearchPolicy::default());

    if let Some(code) = &args.detail {
        let response = engine.detail(code).await;
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let query_text = args
        .query
        .ok_or_else(|| anyhow::anyhow!("either --query or --detail is required"))?;
    let parsed: serde_json::Value = serde_json::from_str(&query_text)?;

    match parsed {
        serde_json::Value::Object(query) => {
            let response = engine.search(&query).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        serde_json::Value::Array(items) => {
            let queries: Vec<_> = items
                .into_iter()
                .map(|item| match item {
                    serde_json::Value::Object(q) => q,
                    // malformed batch entries still get a result slot
                    _ => serde_json::Map::new(),
                })
                .collect();
            let responses = engine.search_batch(&queries).await;
            println!("{}", serde_json::to_string_pretty(&responses)?);
        }
        _ => anyhow::bail!("query must be a JSON object or array"),
    }

    Ok(())
}
