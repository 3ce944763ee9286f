// POST /auth/register and POST /auth/login - token acquisition endpoints.
// These establish identity and are the only routes outside the gate.
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ApiError;
use crate::models::Role;
use crate::quota::SubscriptionPlan;
use crate::AppState;

/// Invite code granting access to the PRO tenant. In production this would
/// be a signed, single-use invitation token.
pub const PRO_INVITE_CODE: &str = "TENANT1_PRO_INVITE";

const PRO_TENANT_NAME: &str = "Test Company";
const FREE_TENANT_NAME: &str = "Another Company";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub invite_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Register a new user and return a token for immediate login.
///
/// Tenant assignment is invite-code gated: the PRO invite code places the
/// user in the PRO tenant with the ADMIN role, everyone else lands in the
/// FREE tenant as MEMBER. Tenants are created lazily by name.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    validate_credentials(&req.email, &req.password)?;

    let (tenant_name, plan, role) = if req.invite_code.as_deref() == Some(PRO_INVITE_CODE) {
        (PRO_TENANT_NAME, SubscriptionPlan::Pro, Role::Admin)
    } else {
        (FREE_TENANT_NAME, SubscriptionPlan::Free, Role::Member)
    };

    let tenant = state.store.find_or_create_tenant(tenant_name, plan).await?;
    let user = state
        .store
        .create_user(&req.email, &password_digest(&req.password), tenant.id, role)
        .await?;

    tracing::info!(
        user_id = user.id,
        tenant_id = tenant.id,
        "registered user in tenant '{}'",
        tenant.name
    );

    let token = state.codec.issue(user.id, user.tenant_id, user.role)?;
    Ok(Json(TokenResponse { token }))
}

/// Authenticate by email and password and return a fresh token. Unknown
/// email and wrong password are indistinguishable to the caller.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .store
        .find_user_by_email(&req.email)
        .await?
        .ok_or_else(ApiError::invalid_credentials)?;

    if user.password_digest != password_digest(&req.password) {
        return Err(ApiError::invalid_credentials());
    }

    let token = state.codec.issue(user.id, user.tenant_id, user.role)?;
    Ok(Json(TokenResponse { token }))
}

fn validate_credentials(email: &str, password: &str) -> Result<(), ApiError> {
    if email.trim().is_empty() {
        return Err(ApiError::bad_request("Email is required"));
    }
    if !email.contains('@') {
        return Err(ApiError::bad_request("Invalid email format"));
    }
    if password.len() < 6 {
        return Err(ApiError::bad_request(
            "Password must be at least 6 characters",
        ));
    }
    Ok(())
}

pub(crate) fn password_digest(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}
