use dotenvy::dotenv;
use proofit_critique::{
    cache::{CacheError, CacheStore, LazyCacheStore, MemoryCacheStore},
    server, ServerConfig,
};
use std::{error::Error, sync::Arc};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(?config, "starting proofit server");

    // One cache handle for the whole process, opened on first use.
    let cache_store: Arc<dyn CacheStore> = Arc::new(LazyCacheStore::new(|| async {
        Ok::<_, CacheError>(Arc::new(MemoryCacheStore::new()) as Arc<dyn CacheStore>)
    }));

    let pipeline = Arc::new(config.build_pipeline(cache_store));
    let app = server::with_cors(server::router(pipeline), &config.app_url)?;

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
