#![deny(unsafe_code)]

use signed_data_pool::{BackendSignedDataStore, SignedDataService};
use signed_data_pool_server::{ServerConfig, router};
use signed_data_pool_storage::MemoryBackend;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    let store = BackendSignedDataStore::new(MemoryBackend::new(), config.pool.batch_config()?);
    let service = SignedDataService::new(store, config.pool.clone());

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!(address = %config.listen, "Signed data pool listening");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutting down");
            }
        })
        .await?;
    Ok(())
}
