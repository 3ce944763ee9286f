#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use notes_service::auth::TokenCodec;
use notes_service::models::Role;
use notes_service::quota::QuotaEnforcer;
use notes_service::store::{MemoryStore, Store};
use notes_service::{app, AppState};

pub const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef";
pub const PRO_INVITE_CODE: &str = "TENANT1_PRO_INVITE";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

/// Build the full service in-process against a fresh in-memory store.
pub fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let state = AppState {
        store: store.clone(),
        codec: Arc::new(TokenCodec::new(TEST_SECRET, 3600).expect("test codec")),
        quota: Arc::new(QuotaEnforcer::new(3)),
    };
    TestApp {
        router: app(state.clone()),
        state,
        store,
    }
}

/// Drive one request through the router and return status plus parsed body.
pub async fn send_json(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

/// Register through the public endpoint and return the issued token.
pub async fn register(router: &Router, email: &str, invite_code: Option<&str>) -> Result<String> {
    let mut body = json!({ "email": email, "password": "secret1" });
    if let Some(code) = invite_code {
        body["invite_code"] = code.into();
    }
    let (status, value) = send_json(router, "POST", "/auth/register", None, Some(body)).await?;
    anyhow::ensure!(status == StatusCode::OK, "register failed: {} {}", status, value);
    Ok(value["token"]
        .as_str()
        .expect("register response carries a token")
        .to_string())
}

/// Seed a tenant (with arbitrary stored plan text) and a user directly in
/// the store, bypassing the registration policy, and issue a token.
pub async fn seed_user(
    app: &TestApp,
    tenant_name: &str,
    plan: &str,
    email: &str,
    role: Role,
) -> Result<(i64, i64, String)> {
    let tenant = app.store.insert_tenant_with_raw_plan(tenant_name, plan).await;
    let user = app.store.create_user(email, "digest", tenant.id, role).await?;
    let token = app.state.codec.issue(user.id, user.tenant_id, user.role)?;
    Ok((tenant.id, user.id, token))
}

pub async fn create_note(
    router: &Router,
    token: &str,
    title: &str,
) -> Result<(StatusCode, Value)> {
    send_json(
        router,
        "POST",
        "/api/notes",
        Some(token),
        Some(json!({ "title": title, "content": "body" })),
    )
    .await
}
