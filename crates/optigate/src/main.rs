//! Optigate
//!
//! A gateway that federates OPTIMADE queries over many materials databases.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use optigate_federation::providers::ProvidersLoader;
use optigate_federation::walker::PaginationWalker;
use optigate_federation::{HttpBackendClient, Resources};
use optigate_persistence::ResourceStore;
use optigate_persistence::backends::memory::MemoryStore;
use optigate_rest::{ServerConfig, StorageBackendMode, create_app_with_config, init_logging};
use tracing::{info, warn};

#[cfg(feature = "sqlite")]
use optigate_persistence::backends::sqlite::SqliteStore;

/// Creates and initializes a SQLite store from the server configuration.
#[cfg(feature = "sqlite")]
fn create_sqlite_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn ResourceStore>> {
    let db_path = config.database_url.as_deref().unwrap_or("optigate.db");
    info!(database = %db_path, "Initializing SQLite store");

    let store = if db_path == ":memory:" {
        SqliteStore::in_memory()?
    } else {
        SqliteStore::open(db_path)?
    };
    store.init_schema()?;

    Ok(Arc::new(store))
}

/// Fallback when sqlite feature is not enabled.
#[cfg(not(feature = "sqlite"))]
fn create_sqlite_store(_config: &ServerConfig) -> anyhow::Result<Arc<dyn ResourceStore>> {
    anyhow::bail!(
        "The sqlite backend requires the 'sqlite' feature. \
         Build with: cargo build -p optigate --features sqlite"
    )
}

/// Registers the databases of every OPTIMADE provider.
///
/// Failures are logged; the server starts either way.
async fn load_providers(store: Arc<dyn ResourceStore>, config: &ServerConfig) {
    let client = match HttpBackendClient::new(Duration::from_secs(config.backend_timeout)) {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Cannot create client for providers bootstrap");
            return;
        }
    };
    let walker = PaginationWalker::new(Arc::new(client), config.max_pagination_pages);
    let loader = ProvidersLoader::new(Resources::new(store), walker);

    match loader.load(&config.providers_url).await {
        Ok(registered) => info!(
            count = registered.len(),
            url = %config.providers_url,
            "Registered provider databases"
        ),
        Err(e) => warn!(error = %e, url = %config.providers_url, "Providers bootstrap failed"),
    }
}

/// Starts the Axum HTTP server.
async fn serve(app: axum::Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr();
    info!(address = %addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let backend_mode = config
        .storage_backend_mode()
        .map_err(|e| anyhow::anyhow!("Invalid storage backend configuration: {}", e))?;

    info!(
        port = config.port,
        host = %config.host,
        base_url = %config.base_url(),
        storage_backend = %backend_mode,
        "Starting Optigate"
    );

    let store: Arc<dyn ResourceStore> = match backend_mode {
        StorageBackendMode::Memory => Arc::new(MemoryStore::new()),
        StorageBackendMode::Sqlite => create_sqlite_store(&config)?,
    };

    if config.load_providers_databases {
        load_providers(store.clone(), &config).await;
    }

    let app = create_app_with_config(store, config.clone())?;
    serve(app, &config).await
}
