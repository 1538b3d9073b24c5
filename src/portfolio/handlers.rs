// src/portfolio/handlers.rs

use axum::{
    extract::{Extension, Json, Multipart, Path},
    http::{header, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::{MessageResponse, PortfolioImage};
use super::services::PortfolioService;
use crate::auth::AuthedUser;
use crate::common::uploads::read_file_fields;
use crate::common::{ApiError, AppState};
use crate::providers::services::ProviderService;
use crate::services::storage::{content_type_for, Bucket};

const IMAGE_FIELD: &str = "image";

fn portfolio_service(state: &AppState) -> PortfolioService {
    PortfolioService::new(state.db.clone(), state.storage.clone())
}

/// GET /api/providers/:id/portfolio
pub async fn list_portfolio(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(provider_id): Path<String>,
) -> Result<Json<Vec<PortfolioImage>>, ApiError> {
    let state = state_lock.read().await.clone();
    Ok(Json(portfolio_service(&state).list(&provider_id).await?))
}

/// POST /api/provider/me/portfolio - multipart field `image`
pub async fn upload_portfolio_image(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<PortfolioImage>), ApiError> {
    let state = state_lock.read().await.clone();

    let profile = ProviderService::new(state.db.clone())
        .require_own_profile(&user.id)
        .await?;

    let mut files = read_file_fields(&mut multipart, &[IMAGE_FIELD]).await?;
    let data = files
        .remove(IMAGE_FIELD)
        .ok_or_else(|| ApiError::ValidationError("Selecione uma imagem.".to_string()))?;

    let image = portfolio_service(&state)
        .upload(&user.id, &profile.id, &data)
        .await?;

    Ok((StatusCode::CREATED, Json(image)))
}

/// DELETE /api/provider/me/portfolio/:image_id
pub async fn delete_portfolio_image(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
    Path(image_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let profile = ProviderService::new(state.db.clone())
        .require_own_profile(&user.id)
        .await?;
    portfolio_service(&state).delete(&profile.id, &image_id).await?;

    Ok(Json(MessageResponse {
        message: "Imagem removida.".to_string(),
    }))
}

/// GET /api/storage/portfolio/*path - public bucket
pub async fn serve_portfolio_file(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(object_path): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let state = state_lock.read().await.clone();
    let data = state.storage.read(Bucket::Portfolio, &object_path).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type_for(&object_path)),
            (header::CACHE_CONTROL, "public, max-age=31536000"),
        ],
        data,
    ))
}
