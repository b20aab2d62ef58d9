use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, EnvFilter};

use website_generator::hf::HfClient;
use website_generator::routes::{app, AppState};
use website_generator::store::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let api_key = std::env::var("HUGGINGFACE_API_KEY").unwrap_or_default();
    if api_key.is_empty() {
        tracing::warn!("HUGGINGFACE_API_KEY is not set; every generation will use a fallback template");
    }
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set (sqlite connection string for the website store)")?;

    let state = AppState {
        model: Arc::new(HfClient::new(api_key)),
        store: Arc::new(SqliteStore::new(database_url)),
    };

    let port: u16 = std::env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;
    Ok(())
}
