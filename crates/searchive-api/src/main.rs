//! searchive HTTP API server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use searchive_core::{defaults, KeyphraseRanker, SearchIndex};
use searchive_db::{log_pool_metrics, spawn_pool_metrics, Database, PoolConfig};
use searchive_inference::{EmbeddingRanker, OllamaEmbedder};
use searchive_ingest::{ExtractionRegistry, IngestionPipeline, KeywordExtractionOrchestrator};
use searchive_search::{ElasticsearchConfig, ElasticsearchIndex};

use searchive_api::session::RedisSessionStore;
use searchive_api::startup::{blob_store, init_tracing, redis_connection};
use searchive_api::{router, AppConfig, AppState, Capabilities};

/// Cold-start ranker, or `None` when disabled or the model cannot be loaded.
async fn resolve_ranker(enabled: bool) -> Option<Arc<dyn KeyphraseRanker>> {
    if !enabled {
        info!("Keyphrase ranker disabled; cold-start extraction yields no keywords");
        return None;
    }
    let backend = match OllamaEmbedder::from_env() {
        Ok(backend) => backend,
        Err(e) => {
            warn!(error = %e, "Embedding backend misconfigured, ranker unavailable");
            return None;
        }
    };
    let ranker = EmbeddingRanker::new(Arc::new(backend));
    match ranker.warm_up().await {
        Ok(()) => Some(Arc::new(ranker)),
        Err(e) => {
            warn!(error = %e, "Embedding model warm-up failed, ranker unavailable");
            None
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = init_tracing("searchive_api=debug,searchive_ingest=debug,tower_http=debug");

    let config = AppConfig::from_env()?;

    let db = Database::connect_with_config(&config.database_url, PoolConfig::from_env()).await?;
    db.migrate().await?;
    log_pool_metrics(db.pool());
    let pool_metrics = spawn_pool_metrics(
        db.pool().clone(),
        Duration::from_secs(defaults::POOL_METRICS_INTERVAL_SECS),
    );
    info!("Database ready");

    let blobs = blob_store(&config).await?;

    let index = Arc::new(ElasticsearchIndex::connect(ElasticsearchConfig::from_env()).await?);
    index.ensure_index().await?;
    let analyzer = index.analyzer();
    info!(index = index.index_name(), analyzer = analyzer.as_str(), "Search index ready");

    let ranker = resolve_ranker(config.ranker_enabled).await;

    let extractor = ExtractionRegistry::with_default_adapters();
    let extraction_health = extractor.health_check_all().await;

    let redis = redis_connection(&config.redis_url).await?;
    info!("Redis session store connected");

    let capabilities = Capabilities::new(
        analyzer,
        ranker.as_ref().map(|r| r.name().to_string()),
        config.blob_backend,
        &extraction_health,
    );

    let orchestrator = Arc::new(KeywordExtractionOrchestrator::new(
        index.clone(),
        ranker,
        config.orchestrator(),
    ));
    let pipeline = Arc::new(IngestionPipeline::new(
        blobs,
        Arc::new(db.documents.clone()),
        Arc::new(db.tags.clone()),
        Arc::new(extractor),
        index,
        orchestrator,
    ));

    let state = AppState {
        pipeline,
        sessions: Arc::new(RedisSessionStore::new(redis)),
        capabilities: Arc::new(capabilities),
    };
    let app = router(
        state,
        config.allowed_origins.clone(),
        config.max_upload_bytes,
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    pool_metrics.abort();
    info!("Server stopped");
    Ok(())
}
