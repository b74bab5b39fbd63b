//! Pokedex HTTP server: bootstrap the database, seed on first start, serve the catalog.

use pokedex::{app, connect, ensure_database_exists, ensure_schema, seed_if_empty, AppState, Settings};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pokedex=info,tower_http=info")),
        )
        .init();

    ensure_database_exists(&settings.database_url).await?;
    let pool = connect(&settings).await?;
    ensure_schema(&pool, settings.db_schema.as_deref()).await?;

    if settings.seed_on_start {
        seed_if_empty(&pool, &settings.seed_path).await?;
    }

    let state = AppState { pool };
    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
