// src/favorites/handlers.rs

use axum::extract::{Extension, Json, Path};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::FavoriteStatus;
use super::services::FavoriteService;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};
use crate::providers::services::ProviderService;
use crate::providers::ProviderWithDetails;

/// GET /api/favorites - orphaned providers are skipped
pub async fn list_favorites(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
) -> Result<Json<Vec<ProviderWithDetails>>, ApiError> {
    let state = state_lock.read().await.clone();

    let ids = FavoriteService::new(state.db.clone())
        .provider_ids(&user.id)
        .await?;
    let providers = ProviderService::new(state.db).fetch_by_ids(&ids).await?;

    Ok(Json(providers))
}

/// GET /api/favorites/:provider_id
pub async fn get_favorite_status(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
    Path(provider_id): Path<String>,
) -> Result<Json<FavoriteStatus>, ApiError> {
    let state = state_lock.read().await.clone();
    let favorited = FavoriteService::new(state.db)
        .is_favorited(&user.id, &provider_id)
        .await?;
    Ok(Json(FavoriteStatus {
        provider_id,
        favorited,
    }))
}

/// POST /api/favorites/:provider_id/toggle
pub async fn toggle_favorite(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
    Path(provider_id): Path<String>,
) -> Result<Json<FavoriteStatus>, ApiError> {
    let state = state_lock.read().await.clone();
    let favorited = FavoriteService::new(state.db)
        .toggle(&user.id, &provider_id)
        .await?;
    Ok(Json(FavoriteStatus {
        provider_id,
        favorited,
    }))
}
