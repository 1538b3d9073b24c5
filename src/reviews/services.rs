// src/reviews/services.rs

use sqlx::SqlitePool;
use tracing::{info, warn};

use super::models::*;
use super::validators::ReviewValidator;
use crate::common::helpers::non_blank;
use crate::common::{generate_review_id, now_rfc3339, ApiError, Validator};

pub struct ReviewService {
    db: SqlitePool,
}

impl ReviewService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Newest first, with the reviewer's name and avatar
    pub async fn list_for_provider(&self, provider_id: &str) -> Result<Vec<ReviewWithClient>, ApiError> {
        let rows = sqlx::query_as::<_, ReviewListingRow>(
            r#"
            SELECT r.id, r.provider_id, r.rating, r.comment, r.created_at,
                   u.full_name AS client_full_name, u.avatar_url AS client_avatar_url
            FROM reviews r
            LEFT JOIN users u ON u.id = r.client_id
            WHERE r.provider_id = ?
            ORDER BY r.created_at DESC, r.id DESC
            "#,
        )
        .bind(provider_id)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        Ok(rows.into_iter().map(ReviewWithClient::from).collect())
    }

    pub async fn has_reviewed(&self, provider_id: &str, client_id: &str) -> Result<bool, ApiError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE provider_id = ? AND client_id = ?)",
        )
        .bind(provider_id)
        .bind(client_id)
        .fetch_one(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;
        Ok(exists)
    }

    /// Validate, pre-check and insert a single review row
    ///
    /// Refused before any write for an out-of-range rating, an unknown
    /// provider, the provider's own account and a repeat review.
    pub async fn submit(
        &self,
        client_id: &str,
        provider_id: &str,
        request: &SubmitReviewRequest,
    ) -> Result<Review, ApiError> {
        ReviewValidator.validate(request).into_result()?;

        let owner: Option<(String,)> =
            sqlx::query_as("SELECT user_id FROM provider_profiles WHERE id = ?")
                .bind(provider_id)
                .fetch_optional(&self.db)
                .await
                .map_err(ApiError::DatabaseError)?;
        let (owner_id,) =
            owner.ok_or_else(|| ApiError::NotFound("Prestador não encontrado.".to_string()))?;

        if owner_id == client_id {
            warn!(provider_id = %provider_id, "Self-review refused");
            return Err(ApiError::Forbidden(
                "Você não pode avaliar o próprio perfil.".to_string(),
            ));
        }

        if self.has_reviewed(provider_id, client_id).await? {
            return Err(already_reviewed());
        }

        let review = Review {
            id: generate_review_id(),
            provider_id: provider_id.to_string(),
            client_id: client_id.to_string(),
            rating: request.rating,
            comment: non_blank(request.comment.clone()),
            created_at: now_rfc3339(),
        };

        sqlx::query(
            r#"
            INSERT INTO reviews (id, provider_id, client_id, rating, comment, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&review.id)
        .bind(&review.provider_id)
        .bind(&review.client_id)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(&review.created_at)
        .execute(&self.db)
        .await
        .map_err(|e| {
            // Lost a race with a concurrent submission; the unique index caught it
            if e.to_string().contains("UNIQUE constraint failed") {
                already_reviewed()
            } else {
                ApiError::DatabaseError(e)
            }
        })?;

        info!(
            provider_id = %provider_id,
            client_id = %client_id,
            rating = review.rating,
            "Review submitted"
        );
        Ok(review)
    }
}

fn already_reviewed() -> ApiError {
    ApiError::Conflict("Você já avaliou este prestador.".to_string())
}
