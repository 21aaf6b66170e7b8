//! User Repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::Role;
use crate::models::User;

use super::StoreError;

const USER_COLUMNS: &str =
    "id, phone, name, role, password_hash, is_verified, created_at, updated_at";

/// Repository for `users`
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE phone = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Create a verified customer for `phone`, or return the user that won a
    /// concurrent insert for the same phone.
    pub async fn create_customer(&self, phone: &str) -> Result<User, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO users (phone, role, is_verified)
            VALUES ($1, $2, TRUE)
            ON CONFLICT (phone) DO UPDATE SET updated_at = users.updated_at
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(phone)
            .bind(Role::Customer.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    /// Insert an admin. A taken phone fails with [`StoreError::Duplicate`].
    pub async fn create_admin(
        &self,
        phone: &str,
        name: Option<&str>,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO users (phone, name, role, password_hash, is_verified)
            VALUES ($1, $2, $3, $4, TRUE)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(phone)
            .bind(name)
            .bind(Role::Admin.as_str())
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn admin_exists(&self) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE role = $1)")
                .bind(Role::Admin.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}
