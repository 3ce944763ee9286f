// GET /api/auth/whoami - echo the identity resolved by the gate.
use axum::response::Json;
use serde_json::{json, Value};

use crate::context::RequestIdentity;

pub async fn whoami(identity: RequestIdentity) -> Json<Value> {
    Json(json!({
        "user_id": identity.user_id,
        "tenant_id": identity.tenant_id,
        "role": identity.role,
    }))
}
