//! Server binary: reads config from the environment, prepares the store, and
//! serves the cat and owner resources.

use kittygram::{
    app, apply_migrations, ensure_database_exists, AppState, ServerConfig, Storage, StorageKind,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("kittygram=info,tower_http=info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let store = match config.storage {
        StorageKind::Postgres => {
            ensure_database_exists(&config.database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(&config.database_url)
                .await?;
            apply_migrations(&pool, &config.schema).await?;
            Storage::new_postgres(pool, config.schema.clone())
        }
        StorageKind::Memory => {
            tracing::warn!("using in-memory storage; data is lost on exit");
            Storage::new_in_memory()
        }
    };

    // /auth is served by the external user and token service.
    let router = app(AppState::new(store.clone()), None, config.max_body_bytes);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Storage::Postgres(pg) = store {
        pg.pool().close().await;
    }
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
