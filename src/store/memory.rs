// In-memory store backing tests and DATABASE_URL-less development runs.
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{Store, StoreError};
use crate::models::{Note, Role, Tenant, User};
use crate::quota::SubscriptionPlan;

#[derive(Default)]
struct Tables {
    tenants: HashMap<i64, Tenant>,
    users: HashMap<i64, User>,
    notes: HashMap<i64, Note>,
    next_tenant_id: i64,
    next_user_id: i64,
    next_note_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a tenant with an arbitrary stored plan value. Test hook for
    /// fail-closed behavior on plan text no release build ever writes.
    pub async fn insert_tenant_with_raw_plan(&self, name: &str, plan: &str) -> Tenant {
        let mut tables = self.tables.write().await;
        tables.next_tenant_id += 1;
        let tenant = Tenant {
            id: tables.next_tenant_id,
            name: name.to_string(),
            plan: plan.to_string(),
        };
        tables.tenants.insert(tenant.id, tenant.clone());
        tenant
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(
        &self,
        email: &str,
        password_digest: &str,
        tenant_id: i64,
        role: Role,
    ) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail);
        }
        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            email: email.to_string(),
            password_digest: password_digest.to_string(),
            tenant_id,
            role,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_tenant(&self, id: i64) -> Result<Option<Tenant>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.tenants.get(&id).cloned())
    }

    async fn find_or_create_tenant(
        &self,
        name: &str,
        plan: SubscriptionPlan,
    ) -> Result<Tenant, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(tenant) = tables.tenants.values().find(|t| t.name == name) {
            return Ok(tenant.clone());
        }
        tables.next_tenant_id += 1;
        let tenant = Tenant {
            id: tables.next_tenant_id,
            name: name.to_string(),
            plan: plan.as_str().to_string(),
        };
        tables.tenants.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    async fn update_tenant_plan(&self, id: i64, plan: SubscriptionPlan) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(tenant) = tables.tenants.get_mut(&id) {
            tenant.plan = plan.as_str().to_string();
        }
        Ok(())
    }

    async fn create_note(
        &self,
        tenant_id: i64,
        created_by: i64,
        title: &str,
        content: &str,
    ) -> Result<Note, StoreError> {
        let mut tables = self.tables.write().await;
        tables.next_note_id += 1;
        let now = Utc::now();
        let note = Note {
            id: tables.next_note_id,
            title: title.to_string(),
            content: content.to_string(),
            tenant_id,
            created_by,
            created_at: now,
            updated_at: now,
        };
        tables.notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn list_notes(&self, tenant_id: i64) -> Result<Vec<Note>, StoreError> {
        let tables = self.tables.read().await;
        let mut notes: Vec<Note> = tables
            .notes
            .values()
            .filter(|n| n.tenant_id == tenant_id)
            .cloned()
            .collect();
        notes.sort_by_key(|n| n.id);
        Ok(notes)
    }

    async fn find_note(&self, tenant_id: i64, id: i64) -> Result<Option<Note>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .notes
            .get(&id)
            .filter(|n| n.tenant_id == tenant_id)
            .cloned())
    }

    async fn update_note(
        &self,
        tenant_id: i64,
        id: i64,
        title: &str,
        content: &str,
    ) -> Result<Option<Note>, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.notes.get_mut(&id).filter(|n| n.tenant_id == tenant_id) {
            Some(note) => {
                note.title = title.to_string();
                note.content = content.to_string();
                note.updated_at = Utc::now();
                Ok(Some(note.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_note(&self, tenant_id: i64, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .notes
            .get(&id)
            .map(|n| n.tenant_id == tenant_id)
            .unwrap_or(false);
        if owned {
            tables.notes.remove(&id);
        }
        Ok(owned)
    }

    async fn count_notes_by_tenant_and_user(
        &self,
        tenant_id: i64,
        user_id: i64,
    ) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .notes
            .values()
            .filter(|n| n.tenant_id == tenant_id && n.created_by == user_id)
            .count() as i64)
    }

    async fn count_notes_by_tenant(&self, tenant_id: i64) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .notes
            .values()
            .filter(|n| n.tenant_id == tenant_id)
            .count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notes_are_scoped_to_their_tenant() {
        let store = MemoryStore::new();
        let a = store
            .find_or_create_tenant("Tenant A", SubscriptionPlan::Free)
            .await
            .unwrap();
        let b = store
            .find_or_create_tenant("Tenant B", SubscriptionPlan::Free)
            .await
            .unwrap();

        let note = store.create_note(a.id, 1, "a note", "body").await.unwrap();

        // Visible inside tenant A, invisible from tenant B
        assert!(store.find_note(a.id, note.id).await.unwrap().is_some());
        assert!(store.find_note(b.id, note.id).await.unwrap().is_none());
        assert!(!store.delete_note(b.id, note.id).await.unwrap());
        assert_eq!(store.count_notes_by_tenant(a.id).await.unwrap(), 1);
        assert_eq!(store.count_notes_by_tenant(b.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        store
            .create_user("a@example.com", "digest", 1, Role::Member)
            .await
            .unwrap();
        let err = store
            .create_user("a@example.com", "digest", 1, Role::Member)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn find_or_create_tenant_is_idempotent_by_name() {
        let store = MemoryStore::new();
        let first = store
            .find_or_create_tenant("Test Company", SubscriptionPlan::Pro)
            .await
            .unwrap();
        let second = store
            .find_or_create_tenant("Test Company", SubscriptionPlan::Pro)
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn per_user_counts_ignore_other_creators() {
        let store = MemoryStore::new();
        store.create_note(1, 5, "t", "c").await.unwrap();
        store.create_note(1, 5, "t", "c").await.unwrap();
        store.create_note(1, 6, "t", "c").await.unwrap();

        assert_eq!(store.count_notes_by_tenant_and_user(1, 5).await.unwrap(), 2);
        assert_eq!(store.count_notes_by_tenant_and_user(1, 6).await.unwrap(), 1);
        assert_eq!(store.count_notes_by_tenant(1).await.unwrap(), 3);
    }
}
