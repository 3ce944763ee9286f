pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod quota;
pub mod store;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::TokenCodec;
use crate::quota::QuotaEnforcer;
use crate::store::Store;

/// Shared application state, constructed once in `main` and injected
/// everywhere. The codec and quota enforcer are read-mostly and safely
/// shared across concurrent requests.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub codec: Arc<TokenCodec>,
    pub quota: Arc<QuotaEnforcer>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth routes (token acquisition, outside the gate)
        .merge(auth_public_routes())
        // Protected API behind the authentication gate
        .merge(api_routes(state.clone()))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

fn api_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::{auth, notes, tenants};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/notes", get(notes::list).post(notes::create))
        .route(
            "/api/notes/:id",
            get(notes::get).put(notes::update).delete(notes::delete),
        )
        .route("/api/tenants/upgrade", put(tenants::upgrade))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth_gate,
        ))
}

async fn root() -> axum::response::Json<Value> {
    axum::response::Json(json!({
        "name": "Notes Service",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/auth/register, /auth/login (public - token acquisition)",
            "notes": "/api/notes[/:id] (protected)",
            "tenants": "/api/tenants/upgrade (protected, ADMIN)",
            "whoami": "/api/auth/whoami (protected)",
        }
    }))
}

async fn health() -> axum::response::Json<Value> {
    axum::response::Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}
