//! searchive-reindex: rebuild the search index from stored documents.
//!
//! Drops and recreates the index, then re-extracts and re-upserts every
//! document. Run after enabling the language analyzer plugin.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use searchive_core::SearchIndex;
use searchive_db::{log_pool_metrics, Database, PoolConfig};
use searchive_ingest::{ExtractionRegistry, Reindexer};
use searchive_search::{ElasticsearchConfig, ElasticsearchIndex};

use searchive_api::startup::{blob_store, init_tracing};
use searchive_api::AppConfig;

#[derive(Parser)]
#[command(name = "searchive-reindex")]
#[command(author, version, about = "Rebuild the searchive search index")]
struct Cli {
    /// Confirm dropping the existing index
    #[arg(long)]
    yes: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let db = Database::connect_with_config(&config.database_url, PoolConfig::from_env()).await?;
    let blobs = blob_store(&config).await?;

    let index = Arc::new(ElasticsearchIndex::connect(ElasticsearchConfig::from_env()).await?);
    info!(
        index = index.index_name(),
        analyzer = index.analyzer().as_str(),
        "Reindexing"
    );

    let reindexer = Reindexer::new(
        Arc::new(db.documents.clone()),
        blobs,
        Arc::new(ExtractionRegistry::with_default_adapters()),
        index,
    );
    let report = reindexer.run().await;
    log_pool_metrics(db.pool());
    db.close().await;
    let report = report?;

    if cli.json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!(
            "indexed: {}  skipped: {}  failed: {}",
            report.indexed, report.skipped, report.failed
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _log_guard = init_tracing("searchive_api=info,searchive_ingest=info,searchive_search=info");

    let cli = Cli::parse();
    if !cli.yes {
        eprintln!("This drops and recreates the search index. Re-run with --yes to proceed.");
        return ExitCode::from(2);
    }

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Reindex failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
