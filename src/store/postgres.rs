// Postgres-backed store.
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use super::{Store, StoreError};
use crate::models::{Note, Role, Tenant, User};
use crate::quota::SubscriptionPlan;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Create the tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tenants (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                plan TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_digest TEXT NOT NULL,
                tenant_id BIGINT NOT NULL REFERENCES tenants(id),
                role TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS notes (
                id BIGSERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                tenant_id BIGINT NOT NULL REFERENCES tenants(id),
                created_by BIGINT NOT NULL REFERENCES users(id),
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn tenant_from_row(row: &PgRow) -> Tenant {
    Tenant {
        id: row.get("id"),
        name: row.get("name"),
        plan: row.get("plan"),
    }
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let role_text: String = row.get("role");
    let role = Role::parse(&role_text).ok_or_else(|| {
        StoreError::Database(sqlx::Error::Decode(
            format!("invalid role value '{}' in users table", role_text).into(),
        ))
    })?;
    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        password_digest: row.get("password_digest"),
        tenant_id: row.get("tenant_id"),
        role,
    })
}

fn note_from_row(row: &PgRow) -> Note {
    Note {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        tenant_id: row.get("tenant_id"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(
        &self,
        email: &str,
        password_digest: &str,
        tenant_id: i64,
        role: Role,
    ) -> Result<User, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (email, password_digest, tenant_id, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_digest, tenant_id, role
            "#,
        )
        .bind(email)
        .bind(password_digest)
        .bind(tenant_id)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return StoreError::DuplicateEmail;
                }
            }
            StoreError::Database(e)
        })?;

        user_from_row(&row)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            "SELECT id, email, password_digest, tenant_id, role FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_tenant(&self, id: i64) -> Result<Option<Tenant>, StoreError> {
        let row = sqlx::query("SELECT id, name, plan FROM tenants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(tenant_from_row))
    }

    async fn find_or_create_tenant(
        &self,
        name: &str,
        plan: SubscriptionPlan,
    ) -> Result<Tenant, StoreError> {
        // Upsert on the unique name so concurrent registrations converge on
        // one tenant row
        let row = sqlx::query(
            r#"
            INSERT INTO tenants (name, plan)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, plan
            "#,
        )
        .bind(name)
        .bind(plan.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(tenant_from_row(&row))
    }

    async fn update_tenant_plan(&self, id: i64, plan: SubscriptionPlan) -> Result<(), StoreError> {
        sqlx::query("UPDATE tenants SET plan = $1 WHERE id = $2")
            .bind(plan.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_note(
        &self,
        tenant_id: i64,
        created_by: i64,
        title: &str,
        content: &str,
    ) -> Result<Note, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO notes (title, content, tenant_id, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, content, tenant_id, created_by, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(tenant_id)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(note_from_row(&row))
    }

    async fn list_notes(&self, tenant_id: i64) -> Result<Vec<Note>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, content, tenant_id, created_by, created_at, updated_at
            FROM notes WHERE tenant_id = $1 ORDER BY id
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(note_from_row).collect())
    }

    async fn find_note(&self, tenant_id: i64, id: i64) -> Result<Option<Note>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, content, tenant_id, created_by, created_at, updated_at
            FROM notes WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(note_from_row))
    }

    async fn update_note(
        &self,
        tenant_id: i64,
        id: i64,
        title: &str,
        content: &str,
    ) -> Result<Option<Note>, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE notes SET title = $1, content = $2, updated_at = now()
            WHERE id = $3 AND tenant_id = $4
            RETURNING id, title, content, tenant_id, created_by, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(note_from_row))
    }

    async fn delete_note(&self, tenant_id: i64, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_notes_by_tenant_and_user(
        &self,
        tenant_id: i64,
        user_id: i64,
    ) -> Result<i64, StoreError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM notes WHERE tenant_id = $1 AND created_by = $2",
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("count"))
    }

    async fn count_notes_by_tenant(&self, tenant_id: i64) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM notes WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }
}
