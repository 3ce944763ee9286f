// PUT /api/tenants/upgrade - tenant plan management.
//
// The tenant being upgraded always comes from the authenticated identity,
// never from the request body.
use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::context::RequestIdentity;
use crate::error::ApiError;
use crate::models::Role;
use crate::quota::SubscriptionPlan;
use crate::AppState;

/// Upgrade the caller's tenant to the PRO plan. ADMIN only; idempotent.
pub async fn upgrade(
    State(state): State<AppState>,
    identity: RequestIdentity,
) -> Result<Json<Value>, ApiError> {
    identity.require_role(Role::Admin)?;

    let tenant = state
        .store
        .find_tenant(identity.tenant_id)
        .await?
        .ok_or_else(|| {
            tracing::error!(
                tenant_id = identity.tenant_id,
                "authenticated request for a tenant that does not exist"
            );
            ApiError::internal()
        })?;

    if SubscriptionPlan::parse(&tenant.plan) == Some(SubscriptionPlan::Pro) {
        return Ok(Json(json!({ "message": "Tenant already on PRO plan" })));
    }

    state
        .store
        .update_tenant_plan(tenant.id, SubscriptionPlan::Pro)
        .await?;
    tracing::info!(tenant_id = tenant.id, "tenant upgraded to PRO");

    Ok(Json(
        json!({ "message": "Tenant successfully upgraded to PRO plan" }),
    ))
}
