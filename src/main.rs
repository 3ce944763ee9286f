use std::sync::Arc;

use anyhow::Context;

use notes_service::auth::TokenCodec;
use notes_service::config::AppConfig;
use notes_service::quota::QuotaEnforcer;
use notes_service::store::{MemoryStore, PgStore, Store};
use notes_service::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and secrets
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notes_service=debug,tower_http=debug".into()),
        )
        .init();

    // Fail fast: a missing or weak signing secret refuses to start
    let config = AppConfig::from_env().context("invalid configuration")?;
    let codec = TokenCodec::new(
        &config.security.jwt_secret,
        config.security.token_ttl_secs,
    )
    .context("invalid token configuration")?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url)
                .await
                .context("failed to connect to database")?;
            store.ensure_schema().await.context("schema setup failed")?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState {
        store,
        codec: Arc::new(codec),
        quota: Arc::new(QuotaEnforcer::new(config.quota.free_note_limit)),
    };

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("notes service listening on http://{}", bind_addr);
    axum::serve(listener, app(state)).await.context("server")?;

    Ok(())
}
