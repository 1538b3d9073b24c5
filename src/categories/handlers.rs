// src/categories/handlers.rs

use axum::extract::{Extension, Json, Path, Query};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::{Category, CategoryGroup, CategoryQuery};
use super::services::CategoryService;
use super::taxonomy::group_categories;
use crate::common::{ApiError, AppState};

/// GET /api/categories
pub async fn list_categories(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let state = state_lock.read().await.clone();
    let categories = CategoryService::new(state.db).list(query.q.as_deref()).await?;
    Ok(Json(categories))
}

/// GET /api/categories/grouped
pub async fn list_grouped_categories(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Vec<CategoryGroup>>, ApiError> {
    let state = state_lock.read().await.clone();
    let categories = CategoryService::new(state.db).list(query.q.as_deref()).await?;
    Ok(Json(group_categories(&categories)))
}

/// GET /api/categories/:slug
pub async fn get_category(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(slug): Path<String>,
) -> Result<Json<Category>, ApiError> {
    let state = state_lock.read().await.clone();
    CategoryService::new(state.db)
        .get_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Categoria não encontrada.".to_string()))
}
