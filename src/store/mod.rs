// Persistence collaborator: tenant-scoped CRUD behind a trait.
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Note, Role, Tenant, User};
use crate::quota::SubscriptionPlan;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage operations used by the handlers. Every note read and write is
/// keyed by tenant id; a note from another tenant is indistinguishable from
/// one that does not exist.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(
        &self,
        email: &str,
        password_digest: &str,
        tenant_id: i64,
        role: Role,
    ) -> Result<User, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_tenant(&self, id: i64) -> Result<Option<Tenant>, StoreError>;

    async fn find_or_create_tenant(
        &self,
        name: &str,
        plan: SubscriptionPlan,
    ) -> Result<Tenant, StoreError>;

    async fn update_tenant_plan(&self, id: i64, plan: SubscriptionPlan) -> Result<(), StoreError>;

    async fn create_note(
        &self,
        tenant_id: i64,
        created_by: i64,
        title: &str,
        content: &str,
    ) -> Result<Note, StoreError>;

    async fn list_notes(&self, tenant_id: i64) -> Result<Vec<Note>, StoreError>;

    async fn find_note(&self, tenant_id: i64, id: i64) -> Result<Option<Note>, StoreError>;

    async fn update_note(
        &self,
        tenant_id: i64,
        id: i64,
        title: &str,
        content: &str,
    ) -> Result<Option<Note>, StoreError>;

    async fn delete_note(&self, tenant_id: i64, id: i64) -> Result<bool, StoreError>;

    async fn count_notes_by_tenant_and_user(
        &self,
        tenant_id: i64,
        user_id: i64,
    ) -> Result<i64, StoreError>;

    async fn count_notes_by_tenant(&self, tenant_id: i64) -> Result<i64, StoreError>;
}
