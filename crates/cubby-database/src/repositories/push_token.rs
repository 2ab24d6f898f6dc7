//! Push token repository implementation.

use sqlx::PgPool;

use cubby_core::error::{AppError, ErrorKind};
use cubby_core::result::AppResult;
use cubby_core::types::id::UserId;
use cubby_entity::push_token::{Platform, PushToken};

/// Repository for device push token registrations.
#[derive(Debug, Clone)]
pub struct PushTokenRepository {
    pool: PgPool,
}

impl PushTokenRepository {
    /// Create a new push token repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a token for a user.
    ///
    /// Older tokens of the same user and platform are removed in the same
    /// transaction, so each user keeps at most one token per platform.
    pub async fn save(
        &self,
        user_id: UserId,
        token: &str,
        platform: Platform,
    ) -> AppResult<PushToken> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e))?;

        sqlx::query("DELETE FROM push_tokens WHERE user_id = $1 AND platform = $2 AND token <> $3")
            .bind(user_id)
            .bind(platform.as_str())
            .bind(token)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete stale push tokens", e)
            })?;

        let saved = sqlx::query_as::<_, PushToken>(
            "INSERT INTO push_tokens (user_id, token, platform) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, token) DO UPDATE SET \
                 platform = EXCLUDED.platform, \
                 updated_at = NOW() \
             RETURNING *",
        )
        .bind(user_id)
        .bind(token)
        .bind(platform.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save push token", e))?;

        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit push token", e))?;

        Ok(saved)
    }

    /// List every token registered by a user.
    pub async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<PushToken>> {
        sqlx::query_as::<_, PushToken>(
            "SELECT * FROM push_tokens WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list push tokens", e))
    }
}
