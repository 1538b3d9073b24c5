// src/favorites/services.rs

use sqlx::SqlitePool;
use tracing::info;

use crate::common::{generate_favorite_id, now_rfc3339, ApiError};

pub struct FavoriteService {
    db: SqlitePool,
}

impl FavoriteService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Flip membership in one transaction; returns the new state
    pub async fn toggle(&self, user_id: &str, provider_id: &str) -> Result<bool, ApiError> {
        let provider: Option<(String,)> =
            sqlx::query_as("SELECT id FROM provider_profiles WHERE id = ?")
                .bind(provider_id)
                .fetch_optional(&self.db)
                .await
                .map_err(ApiError::DatabaseError)?;
        if provider.is_none() {
            return Err(ApiError::NotFound("Prestador não encontrado.".to_string()));
        }

        let mut tx = self.db.begin().await.map_err(ApiError::DatabaseError)?;

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM favorites WHERE user_id = ? AND provider_id = ?")
                .bind(user_id)
                .bind(provider_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(ApiError::DatabaseError)?;

        let favorited = match existing {
            Some((favorite_id,)) => {
                sqlx::query("DELETE FROM favorites WHERE id = ?")
                    .bind(&favorite_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(ApiError::DatabaseError)?;
                false
            }
            None => {
                sqlx::query(
                    "INSERT INTO favorites (id, user_id, provider_id, created_at) VALUES (?, ?, ?, ?)",
                )
                .bind(generate_favorite_id())
                .bind(user_id)
                .bind(provider_id)
                .bind(now_rfc3339())
                .execute(&mut *tx)
                .await
                .map_err(ApiError::DatabaseError)?;
                true
            }
        };

        tx.commit().await.map_err(ApiError::DatabaseError)?;

        info!(
            user_id = %user_id,
            provider_id = %provider_id,
            favorited = favorited,
            "Favorite toggled"
        );
        Ok(favorited)
    }

    pub async fn is_favorited(&self, user_id: &str, provider_id: &str) -> Result<bool, ApiError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM favorites WHERE user_id = ? AND provider_id = ?)",
        )
        .bind(user_id)
        .bind(provider_id)
        .fetch_one(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;
        Ok(exists)
    }

    /// Favorited provider ids, newest favorite first
    pub async fn provider_ids(&self, user_id: &str) -> Result<Vec<String>, ApiError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT provider_id FROM favorites WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
