//! User model

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{DomainError, Role};

/// A row of `users`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub phone: String,
    pub name: Option<String>,
    pub role: String,
    pub password_hash: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Result<Role, DomainError> {
        self.role.parse()
    }
}

/// What clients get to see about a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub phone: String,
    pub name: Option<String>,
    pub role: Role,
}

impl UserSummary {
    pub fn from_user(user: &User) -> Result<Self, DomainError> {
        Ok(Self {
            id: user.id,
            phone: user.phone.clone(),
            name: user.name.clone(),
            role: user.role()?,
        })
    }
}
