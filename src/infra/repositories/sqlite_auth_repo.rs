use crate::domain::{models::auth::RefreshTokenRecord, ports::AuthRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

const TOKEN_COLUMNS: &str = "token_hash, user_id, family_id, generation_id, expires_at, created_at, revoked_at";

/// Refresh tokens are never deleted on use. A revoked row stays behind so a replay
/// of it can be recognised and the whole family shut down.
pub struct SqliteAuthRepo {
    pool: SqlitePool,
}

impl SqliteAuthRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthRepository for SqliteAuthRepo {
    async fn store_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), AppError> {
        sqlx::query(&format!("INSERT INTO refresh_tokens ({TOKEN_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)"))
            .bind(&record.token_hash).bind(&record.user_id).bind(&record.family_id).bind(record.generation_id)
            .bind(record.expires_at).bind(record.created_at).bind(record.revoked_at)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError> {
        sqlx::query_as::<_, RefreshTokenRecord>(&format!("SELECT {TOKEN_COLUMNS} FROM refresh_tokens WHERE token_hash = ?"))
            .bind(token_hash)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn consume_refresh_token(&self, token_hash: &str, at: DateTime<Utc>) -> Result<Option<RefreshTokenRecord>, AppError> {
        // At most one caller revokes a given live token.
        sqlx::query_as::<_, RefreshTokenRecord>(&format!(
            "UPDATE refresh_tokens SET revoked_at = ?
             WHERE token_hash = ? AND revoked_at IS NULL
             RETURNING {TOKEN_COLUMNS}"
        ))
            .bind(at).bind(token_hash)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn revoke_family(&self, family_id: &str, at: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE refresh_tokens SET revoked_at = ? WHERE family_id = ? AND revoked_at IS NULL")
            .bind(at).bind(family_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    /// Drops whole families once their newest token has expired.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            "DELETE FROM refresh_tokens WHERE family_id IN (
                 SELECT family_id FROM refresh_tokens GROUP BY family_id HAVING MAX(expires_at) < ?
             )"
        )
            .bind(now)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
