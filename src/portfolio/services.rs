// src/portfolio/services.rs

use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::models::PortfolioImage;
use crate::common::{generate_portfolio_image_id, now_rfc3339, ApiError};
use crate::services::storage::{validate_image_upload, Bucket, StorageService};

pub const MAX_PORTFOLIO_IMAGES: i64 = 10;

fn limit_reached() -> ApiError {
    ApiError::LimitReached(format!(
        "Limite de {} imagens atingido.",
        MAX_PORTFOLIO_IMAGES
    ))
}

pub struct PortfolioService {
    db: SqlitePool,
    storage: Arc<StorageService>,
}

impl PortfolioService {
    pub fn new(db: SqlitePool, storage: Arc<StorageService>) -> Self {
        Self { db, storage }
    }

    /// Newest first
    pub async fn list(&self, provider_id: &str) -> Result<Vec<PortfolioImage>, ApiError> {
        sqlx::query_as::<_, PortfolioImage>(
            "SELECT * FROM portfolio_images WHERE provider_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(provider_id)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::DatabaseError)
    }

    pub async fn count(&self, provider_id: &str) -> Result<i64, ApiError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM portfolio_images WHERE provider_id = ?")
                .bind(provider_id)
                .fetch_one(&self.db)
                .await
                .map_err(ApiError::DatabaseError)?;
        Ok(count)
    }

    /// Store the image under `{user_id}/{millis}-{image_id}.{ext}` and record it
    ///
    /// A full portfolio is refused before the storage write. The row insert
    /// re-checks the count in its transaction; if it fails the file is removed.
    pub async fn upload(
        &self,
        user_id: &str,
        provider_id: &str,
        data: &[u8],
    ) -> Result<PortfolioImage, ApiError> {
        let kind = validate_image_upload(data)?;

        if self.count(provider_id).await? >= MAX_PORTFOLIO_IMAGES {
            warn!(provider_id = %provider_id, "Portfolio upload refused: limit reached");
            return Err(limit_reached());
        }

        let image_id = generate_portfolio_image_id();
        let storage_path = portfolio_object_path(user_id, &image_id, kind.extension);
        self.storage
            .upload(Bucket::Portfolio, &storage_path, data)
            .await?;

        match self.insert_row(&image_id, provider_id, &storage_path).await {
            Ok(image) => {
                info!(
                    provider_id = %provider_id,
                    image_id = %image.id,
                    size = data.len(),
                    "Portfolio image uploaded"
                );
                Ok(image)
            }
            Err(e) => {
                if let Err(cleanup) = self
                    .storage
                    .remove(Bucket::Portfolio, &[storage_path.clone()])
                    .await
                {
                    error!(
                        path = %storage_path,
                        error = %cleanup,
                        "Failed to remove portfolio file after insert failure"
                    );
                }
                Err(e)
            }
        }
    }

    async fn insert_row(
        &self,
        image_id: &str,
        provider_id: &str,
        storage_path: &str,
    ) -> Result<PortfolioImage, ApiError> {
        let mut tx = self.db.begin().await.map_err(ApiError::DatabaseError)?;

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM portfolio_images WHERE provider_id = ?")
                .bind(provider_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(ApiError::DatabaseError)?;
        if count >= MAX_PORTFOLIO_IMAGES {
            return Err(limit_reached());
        }

        let image = PortfolioImage {
            id: image_id.to_string(),
            provider_id: provider_id.to_string(),
            image_url: self.storage.public_url(storage_path),
            storage_path: storage_path.to_string(),
            created_at: now_rfc3339(),
        };

        sqlx::query(
            r#"
            INSERT INTO portfolio_images (id, provider_id, image_url, storage_path, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&image.id)
        .bind(&image.provider_id)
        .bind(&image.image_url)
        .bind(&image.storage_path)
        .bind(&image.created_at)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::DatabaseError)?;

        tx.commit().await.map_err(ApiError::DatabaseError)?;
        Ok(image)
    }

    /// Delete one of the provider's own images, row first, then the file
    pub async fn delete(&self, provider_id: &str, image_id: &str) -> Result<(), ApiError> {
        let image = sqlx::query_as::<_, PortfolioImage>(
            "SELECT * FROM portfolio_images WHERE id = ? AND provider_id = ?",
        )
        .bind(image_id)
        .bind(provider_id)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound("Imagem não encontrada.".to_string()))?;

        sqlx::query("DELETE FROM portfolio_images WHERE id = ?")
            .bind(&image.id)
            .execute(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;

        if let Err(e) = self
            .storage
            .remove(Bucket::Portfolio, &[image.storage_path.clone()])
            .await
        {
            warn!(image_id = %image.id, error = %e, "Portfolio file could not be removed");
        }

        info!(provider_id = %provider_id, image_id = %image_id, "Portfolio image deleted");
        Ok(())
    }
}

/// `{user_id}/{millis}-{image_id}.{ext}`; the id keeps same-millisecond uploads apart
pub fn portfolio_object_path(user_id: &str, image_id: &str, extension: &str) -> String {
    format!(
        "{}/{}-{}.{}",
        user_id,
        Utc::now().timestamp_millis(),
        image_id,
        extension
    )
}
