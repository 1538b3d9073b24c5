// src/reviews/handlers.rs

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::{Review, ReviewWithClient, SubmitReviewRequest};
use super::services::ReviewService;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};

/// GET /api/providers/:id/reviews
pub async fn list_reviews(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(provider_id): Path<String>,
) -> Result<Json<Vec<ReviewWithClient>>, ApiError> {
    let state = state_lock.read().await.clone();
    let reviews = ReviewService::new(state.db)
        .list_for_provider(&provider_id)
        .await?;
    Ok(Json(reviews))
}

/// POST /api/providers/:id/reviews
pub async fn submit_review(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
    Path(provider_id): Path<String>,
    Json(payload): Json<SubmitReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let state = state_lock.read().await.clone();
    let review = ReviewService::new(state.db)
        .submit(&user.id, &provider_id, &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}
