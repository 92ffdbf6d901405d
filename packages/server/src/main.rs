use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::BlobStore;
use common::storage::filesystem::FilesystemBlobStore;
use common::storage::s3::S3BlobStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::config::{AppConfig, StorageBackend, StorageConfig};
use server::state::AppState;
use server::vault::Vault;
use server::{build_router, database, seed};

async fn build_blob_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    let store: Arc<dyn BlobStore> = match config.backend {
        StorageBackend::Filesystem => {
            info!(path = %config.path.display(), "Using filesystem blob store");
            Arc::new(FilesystemBlobStore::new(config.path.clone()).await?)
        }
        StorageBackend::S3 => {
            let s3 = config
                .s3
                .as_ref()
                .context("storage.s3 must be set when storage.backend is \"s3\"")?;
            info!(bucket = %s3.bucket, "Using S3 blob store");
            Arc::new(S3BlobStore::new(s3)?)
        }
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    seed::ensure_indexes(&db)
        .await
        .context("Failed to create secondary indexes")?;

    let store = build_blob_store(&config.storage).await?;
    let vault = Vault::new(db.clone(), store, config.vault.clone());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let app = build_router(AppState { db, config, vault });

    info!("Server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
