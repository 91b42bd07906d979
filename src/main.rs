// Process wiring: configuration, logging, storage backend, ingestion worker,
// HTTP server, and a shared cancellation token for graceful shutdown.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tx_parser_service::{
    api,
    blockchain::{join_worker, BlockSource, EvmRpcClient, IngestionWorker, WorkerSettings},
    config::Config,
    db::{
        connection, AddressRegistry, InMemoryAddressRegistry, InMemoryProgressTracker,
        InMemoryTransactionStore, ProgressTracker, SqliteAddressRegistry, SqliteProgressTracker,
        SqliteTransactionStore, TransactionStore,
    },
    state::AppState,
    validation::parse_address_list,
};

struct Storage {
    registry: Arc<dyn AddressRegistry>,
    store: Arc<dyn TransactionStore>,
    progress: Arc<dyn ProgressTracker>,
}

async fn init_storage(config: &Config) -> Result<Storage, sqlx::Error> {
    if !config.use_database {
        info!("Using in-memory storage");
        return Ok(Storage {
            registry: Arc::new(InMemoryAddressRegistry::new()),
            store: Arc::new(InMemoryTransactionStore::new()),
            progress: Arc::new(InMemoryProgressTracker::new()),
        });
    }

    let db_pool = connection::establish_connection(&config.database_url).await?;
    info!("Database connection established");

    Ok(Storage {
        registry: Arc::new(SqliteAddressRegistry::new(
            db_pool.clone(),
            config.subscription_cache_capacity,
        )),
        store: Arc::new(SqliteTransactionStore::new(db_pool.clone())),
        progress: Arc::new(SqliteProgressTracker::new(db_pool)),
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tx-parser-service");

    let config = Config::from_env();
    info!("Configuration loaded: {:?}", config);

    let source: Arc<dyn BlockSource> = Arc::new(EvmRpcClient::new(&config)?);
    let storage = init_storage(&config).await?;

    for address in parse_address_list(&config.subscribe_addresses) {
        storage.registry.subscribe(address.as_str()).await?;
        info!("Subscribed {} from configuration", address);
    }

    let shutdown = CancellationToken::new();

    let worker = Arc::new(IngestionWorker::new(
        source.clone(),
        storage.registry.clone(),
        storage.store.clone(),
        storage.progress.clone(),
        WorkerSettings::from_config(&config),
    ));

    let worker_task = worker.clone().spawn(shutdown.clone());
    info!("Parser worker started");

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutting down...");
                signal_token.cancel();
            }
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
    });

    let app_state = Arc::new(AppState {
        config: config.clone(),
        source,
        registry: storage.registry,
        store: storage.store,
        progress: storage.progress,
    });

    let app = api::create_router(app_state);
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await?;

    shutdown.cancel();
    let outcome = join_worker(worker_task).await;
    worker.pool().drain().await;

    // A fatal worker error must reach the exit status
    outcome?;

    info!("Gracefully stopped.");
    Ok(())
}
