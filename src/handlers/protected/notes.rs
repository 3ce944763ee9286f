// /api/notes - tenant-scoped note CRUD.
//
// Tenant and creator always come from the authenticated identity; a note id
// from another tenant is indistinguishable from a missing one.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use crate::context::RequestIdentity;
use crate::error::ApiError;
use crate::models::{Note, Role};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NotePayload {
    pub title: String,
    pub content: String,
}

impl NotePayload {
    fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::bad_request("Title is required"));
        }
        Ok(())
    }
}

/// Create a note, gated by the tenant plan's quota. The admission guard is
/// held across count-then-create so concurrent creates for the same user
/// cannot overshoot the FREE cap.
pub async fn create(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Json(payload): Json<NotePayload>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    payload.validate()?;

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

    let _admission = state
        .quota
        .admission(identity.tenant_id, identity.user_id)
        .await;

    let count = state
        .store
        .count_notes_by_tenant_and_user(identity.tenant_id, identity.user_id)
        .await?;
    state.quota.check(&tenant.plan, count)?;

    let note = state
        .store
        .create_note(
            identity.tenant_id,
            identity.user_id,
            &payload.title,
            &payload.content,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn list(
    State(state): State<AppState>,
    identity: RequestIdentity,
) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = state.store.list_notes(identity.tenant_id).await?;
    Ok(Json(notes))
}

pub async fn get(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Path(id): Path<i64>,
) -> Result<Json<Note>, ApiError> {
    let note = state
        .store
        .find_note(identity.tenant_id, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(note))
}

pub async fn update(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Path(id): Path<i64>,
    Json(payload): Json<NotePayload>,
) -> Result<Json<Note>, ApiError> {
    payload.validate()?;

    let note = state
        .store
        .update_note(identity.tenant_id, id, &payload.title, &payload.content)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(note))
}

/// Delete a note. Restricted to the ADMIN role.
pub async fn delete(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    identity.require_role(Role::Admin)?;

    if !state.store.delete_note(identity.tenant_id, id).await? {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn not_found(id: i64) -> ApiError {
    ApiError::not_found(format!("Note not found with id: {}", id))
}
