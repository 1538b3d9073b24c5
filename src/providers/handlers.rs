// src/providers/handlers.rs

use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::models::*;
use super::search::{search, Pagination, SearchFilters};
use super::services::ProviderService;
use super::validators::ProviderValidator;
use crate::auth::{AuthedUser, MaybeAuthedUser};
use crate::categories::Category;
use crate::common::helpers::whatsapp_url;
use crate::common::{ApiError, AppState, Validator};
use crate::favorites::services::FavoriteService;
use crate::portfolio::services::PortfolioService;
use crate::reviews::services::ReviewService;
use crate::services::cep::{CepData, Coordinates};

fn provider_not_found() -> ApiError {
    ApiError::NotFound("Prestador não encontrado.".to_string())
}

fn provider_whatsapp_url(provider: &ProviderWithDetails, message: Option<&str>) -> Option<String> {
    provider
        .whatsapp
        .as_deref()
        .filter(|w| !w.trim().is_empty())
        .map(|w| whatsapp_url(w, message))
}

async fn own_profile_response(
    state: &AppState,
    profile: ProviderProfile,
) -> Result<OwnProviderResponse, ApiError> {
    let provider_service = ProviderService::new(state.db.clone());
    let details = provider_service.get_details(&profile.id).await?;
    let categories = match &details {
        Some(d) => d.categories.clone(),
        None => provider_service
            .categories_for(&[profile.id.clone()])
            .await?
            .remove(&profile.id)
            .unwrap_or_default(),
    };
    let portfolio = PortfolioService::new(state.db.clone(), state.storage.clone())
        .list(&profile.id)
        .await?;

    Ok(OwnProviderResponse {
        categories,
        portfolio,
        average_rating: details.as_ref().and_then(|d| d.average_rating),
        review_count: details.as_ref().map_or(0, |d| d.review_count),
        profile,
    })
}

// ============================================================================
// Public listings
// ============================================================================

/// GET /api/providers
pub async fn search_providers(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let active = ProviderService::new(state.db)
        .fetch_active(query.city.as_deref(), query.neighborhood.as_deref())
        .await?;

    let filters = SearchFilters::from_query(&query);
    let pagination = Pagination::new(query.page, query.page_size);
    let response = search(active, &filters, pagination);

    debug!(
        category = ?filters.category,
        sort = ?filters.sort,
        total = response.total,
        page = response.page,
        "Provider search"
    );

    Ok(Json(response))
}

/// GET /api/providers/cities
pub async fn list_cities(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let state = state_lock.read().await.clone();
    Ok(Json(ProviderService::new(state.db).list_cities().await?))
}

/// GET /api/providers/neighborhoods
pub async fn list_neighborhoods(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(query): Query<NeighborhoodQuery>,
) -> Result<Json<Vec<String>>, ApiError> {
    let state = state_lock.read().await.clone();
    let neighborhoods = ProviderService::new(state.db)
        .list_neighborhoods(query.city.as_deref())
        .await?;
    Ok(Json(neighborhoods))
}

/// GET /api/providers/category-counts
pub async fn category_counts(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
) -> Result<Json<HashMap<String, i64>>, ApiError> {
    let state = state_lock.read().await.clone();
    Ok(Json(ProviderService::new(state.db).category_counts().await?))
}

/// GET /api/providers/:id
///
/// Inactive profiles are only visible to their owner.
pub async fn get_provider(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    MaybeAuthedUser(viewer): MaybeAuthedUser,
    Path(provider_id): Path<String>,
) -> Result<Json<ProviderDetailResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let provider = ProviderService::new(state.db.clone())
        .get_details(&provider_id)
        .await?
        .ok_or_else(provider_not_found)?;

    let is_owner = viewer.as_ref().map_or(false, |v| v.id == provider.user_id);
    if !provider.is_active && !is_owner {
        return Err(provider_not_found());
    }

    let portfolio = PortfolioService::new(state.db.clone(), state.storage.clone())
        .list(&provider.id)
        .await?;

    let review_service = ReviewService::new(state.db.clone());
    let reviews = review_service.list_for_provider(&provider.id).await?;

    // Anonymous visitors get already_reviewed=true so the review form stays hidden
    let (is_favorited, already_reviewed) = match &viewer {
        Some(v) => (
            FavoriteService::new(state.db.clone())
                .is_favorited(&v.id, &provider.id)
                .await?,
            review_service.has_reviewed(&provider.id, &v.id).await?,
        ),
        None => (false, true),
    };

    Ok(Json(ProviderDetailResponse {
        whatsapp_url: provider_whatsapp_url(&provider, None),
        provider,
        portfolio,
        reviews,
        is_owner,
        is_favorited,
        already_reviewed,
    }))
}

/// GET /api/providers/:id/whatsapp
pub async fn whatsapp_link(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(provider_id): Path<String>,
    Query(query): Query<WhatsAppQuery>,
) -> Result<Json<WhatsAppLinkResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let provider = ProviderService::new(state.db)
        .get_details(&provider_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(provider_not_found)?;

    let url = provider_whatsapp_url(&provider, query.message.as_deref()).ok_or_else(|| {
        ApiError::NotFound("Este prestador não informou um WhatsApp.".to_string())
    })?;

    Ok(Json(WhatsAppLinkResponse { url }))
}

// ============================================================================
// Own provider profile
// ============================================================================

/// POST /api/provider
pub async fn become_provider(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
    Json(payload): Json<BecomeProviderRequest>,
) -> Result<(StatusCode, Json<OwnProviderResponse>), ApiError> {
    let state = state_lock.read().await.clone();
    ProviderValidator.validate(&payload).into_result()?;

    debug!(user_id = %user.id, role = %user.role, "Become-provider request");
    let profile = ProviderService::new(state.db.clone())
        .become_provider(&user.id, &payload)
        .await?;

    let response = own_profile_response(&state, profile).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/provider/me
pub async fn get_own_profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
) -> Result<Json<OwnProviderResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let profile = ProviderService::new(state.db.clone())
        .require_own_profile(&user.id)
        .await?;
    Ok(Json(own_profile_response(&state, profile).await?))
}

/// PUT /api/provider/me
pub async fn update_own_profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
    Json(payload): Json<UpdateProviderRequest>,
) -> Result<Json<OwnProviderResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    ProviderValidator.validate(&payload).into_result()?;

    let profile = ProviderService::new(state.db.clone())
        .update_profile(&user.id, &payload)
        .await?;
    Ok(Json(own_profile_response(&state, profile).await?))
}

/// PUT /api/provider/me/categories
pub async fn replace_own_categories(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
    Json(payload): Json<ReplaceCategoriesRequest>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let state = state_lock.read().await.clone();
    ProviderValidator.validate(&payload).into_result()?;

    let service = ProviderService::new(state.db);
    let profile = service.require_own_profile(&user.id).await?;
    let categories = service
        .replace_categories(&profile.id, &payload.category_ids)
        .await?;

    info!(user_id = %user.id, provider_id = %profile.id, "Categories updated by owner");
    Ok(Json(categories))
}

// ============================================================================
// Location lookups
// ============================================================================

/// GET /api/cep/:cep
pub async fn lookup_cep(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(cep): Path<String>,
) -> Result<Json<CepData>, ApiError> {
    let state = state_lock.read().await.clone();
    state
        .cep_service
        .lookup(&cep)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("CEP não encontrado.".to_string()))
}

/// GET /api/geocode
pub async fn geocode(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<Coordinates>, ApiError> {
    let state = state_lock.read().await.clone();
    if query.city.trim().is_empty() || query.state.trim().is_empty() {
        return Err(ApiError::ValidationError(
            "Informe cidade e estado.".to_string(),
        ));
    }

    state
        .cep_service
        .geocode(&query.city, &query.state, query.neighborhood.as_deref())
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Localização não encontrada.".to_string()))
}
