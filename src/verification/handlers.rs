// src/verification/handlers.rs

use axum::{
    extract::{Extension, Json, Multipart, Path, Query},
    http::{header, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use super::models::*;
use super::services::VerificationService;
use super::state_machine::VerificationAction;
use crate::auth::AuthedUser;
use crate::common::uploads::read_file_fields;
use crate::common::{ApiError, AppState};
use crate::providers::services::ProviderService;
use crate::services::storage::{content_type_for, Bucket};

fn verification_service(state: &AppState) -> VerificationService {
    VerificationService::new(
        state.db.clone(),
        state.storage.clone(),
        state.config.signed_url_ttl_secs,
    )
}

/// GET /api/provider/me/verification
pub async fn get_own_verification(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
) -> Result<Json<VerificationStatusResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let profile = ProviderService::new(state.db.clone())
        .require_own_profile(&user.id)
        .await?;
    Ok(Json(verification_service(&state).status(&profile).await?))
}

/// POST /api/provider/me/verification - multipart fields `identity` and `selfie`
pub async fn submit_verification(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<VerificationStatusResponse>), ApiError> {
    let state = state_lock.read().await.clone();

    let provider_service = ProviderService::new(state.db.clone());
    let profile = provider_service.require_own_profile(&user.id).await?;

    let field_names = DocumentType::ALL.map(|t| t.as_str());
    let mut files = read_file_fields(&mut multipart, &field_names).await?;
    let identity = files.remove(DocumentType::Identity.as_str());
    let selfie = files.remove(DocumentType::Selfie.as_str());
    let (identity, selfie) = match (identity, selfie) {
        (Some(i), Some(s)) => (i, s),
        _ => {
            return Err(ApiError::ValidationError(
                "Envie o documento de identidade e a selfie.".to_string(),
            ))
        }
    };

    let service = verification_service(&state);
    service
        .submit(&user.id, &profile, &identity, &selfie)
        .await?;

    let refreshed = provider_service.require_own_profile(&user.id).await?;
    Ok((StatusCode::CREATED, Json(service.status(&refreshed).await?)))
}

/// GET /api/admin/verifications
pub async fn admin_list_verifications(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
) -> Result<Json<AdminVerificationList>, ApiError> {
    user.require_admin()?;
    let state = state_lock.read().await.clone();
    Ok(Json(verification_service(&state).admin_list().await?))
}

/// POST /api/admin/verifications/:provider_id/approve
pub async fn admin_approve_verification(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
    Path(provider_id): Path<String>,
    Json(payload): Json<ReviewDecisionRequest>,
) -> Result<Json<ReviewDecisionResponse>, ApiError> {
    user.require_admin()?;
    let state = state_lock.read().await.clone();
    let response = verification_service(&state)
        .review(&user.id, &provider_id, VerificationAction::Approve, &payload.document_ids)
        .await?;
    Ok(Json(response))
}

/// POST /api/admin/verifications/:provider_id/reject
pub async fn admin_reject_verification(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
    Path(provider_id): Path<String>,
    Json(payload): Json<ReviewDecisionRequest>,
) -> Result<Json<ReviewDecisionResponse>, ApiError> {
    user.require_admin()?;
    let state = state_lock.read().await.clone();
    let response = verification_service(&state)
        .review(&user.id, &provider_id, VerificationAction::Reject, &payload.document_ids)
        .await?;
    Ok(Json(response))
}

/// GET /api/storage/verifications/*path?token= - private bucket, signed links only
pub async fn serve_verification_file(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(object_path): Path<String>,
    Query(query): Query<SignedFileQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let state = state_lock.read().await.clone();

    let token = query.token.ok_or_else(|| {
        warn!(path = %object_path, "Verification file requested without token");
        ApiError::Forbidden("Link inválido ou expirado.".to_string())
    })?;
    state
        .storage
        .verify_signed_token(Bucket::Verifications, &object_path, &token)?;

    let data = state.storage.read(Bucket::Verifications, &object_path).await?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type_for(&object_path)),
            (header::CACHE_CONTROL, "private, no-store"),
        ],
        data,
    ))
}
