use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const ROLE_ADMIN: &str = "Admin";
pub const ROLE_STAFF: &str = "Staff";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            email: email.trim().to_lowercase(),
            password_hash,
            role: role.to_string(),
            created_at: Utc::now(),
        }
    }
}
