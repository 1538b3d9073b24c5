// src/providers/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::categories::Category;
use crate::portfolio::models::PortfolioImage;
use crate::reviews::models::ReviewWithClient;

// ============================================================================
// Database rows
// ============================================================================

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProviderProfile {
    pub id: String,
    pub user_id: String,
    pub description: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub whatsapp: Option<String>,
    pub is_active: bool,
    pub verification_status: String,
    pub is_verified: bool,
    pub verified_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Profile joined with its user (nullable for orphans) and rating aggregate
#[derive(Debug, Clone, FromRow)]
pub struct ProviderListingRow {
    pub id: String,
    pub user_id: String,
    pub description: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub whatsapp: Option<String>,
    pub is_active: bool,
    pub verification_status: String,
    pub is_verified: bool,
    pub verified_at: Option<String>,
    pub created_at: String,
    pub joined_user_id: Option<String>,
    pub user_full_name: Option<String>,
    pub user_avatar_url: Option<String>,
    pub average_rating: Option<f64>,
    pub review_count: Option<i64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProviderCategoryRow {
    pub provider_id: String,
    pub id: String,
    pub name: String,
    pub slug: String,
}

// ============================================================================
// API shapes
// ============================================================================

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProviderUser {
    pub full_name: String,
    pub avatar_url: Option<String>,
}

/// Provider as shown in listings: profile, user, categories and rating
#[derive(Debug, Clone, Serialize)]
pub struct ProviderWithDetails {
    pub id: String,
    pub user_id: String,
    pub description: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub whatsapp: Option<String>,
    pub is_active: bool,
    pub verification_status: String,
    pub is_verified: bool,
    pub verified_at: Option<String>,
    pub created_at: String,
    /// `None` when the linked user row is missing; such providers are never returned
    pub user: Option<ProviderUser>,
    pub categories: Vec<Category>,
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

impl ProviderWithDetails {
    pub fn from_row(row: ProviderListingRow, categories: Vec<Category>) -> Self {
        let user = row.joined_user_id.map(|_| ProviderUser {
            full_name: row.user_full_name.unwrap_or_default(),
            avatar_url: row.user_avatar_url,
        });
        Self {
            id: row.id,
            user_id: row.user_id,
            description: row.description,
            neighborhood: row.neighborhood,
            city: row.city,
            whatsapp: row.whatsapp,
            is_active: row.is_active,
            verification_status: row.verification_status,
            is_verified: row.is_verified,
            verified_at: row.verified_at,
            created_at: row.created_at,
            user,
            categories,
            average_rating: row.average_rating,
            review_count: row.review_count.unwrap_or(0),
        }
    }

    pub fn display_name(&self) -> &str {
        self.user.as_ref().map(|u| u.full_name.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub providers: Vec<ProviderWithDetails>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

#[derive(Debug, Serialize)]
pub struct ProviderDetailResponse {
    pub provider: ProviderWithDetails,
    pub portfolio: Vec<PortfolioImage>,
    pub reviews: Vec<ReviewWithClient>,
    pub whatsapp_url: Option<String>,
    pub is_owner: bool,
    pub is_favorited: bool,
    pub already_reviewed: bool,
}

/// The caller's own provider profile
#[derive(Debug, Serialize)]
pub struct OwnProviderResponse {
    #[serde(flatten)]
    pub profile: ProviderProfile,
    pub categories: Vec<Category>,
    pub portfolio: Vec<PortfolioImage>,
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

#[derive(Debug, Serialize)]
pub struct WhatsAppLinkResponse {
    pub url: String,
}

// ============================================================================
// Requests
// ============================================================================

/// Search query string; Portuguese names are the ones the site links use
#[derive(Debug, Deserialize, Default)]
pub struct SearchQuery {
    #[serde(alias = "categoria")]
    pub category: Option<String>,
    #[serde(alias = "cidade")]
    pub city: Option<String>,
    #[serde(alias = "bairro")]
    pub neighborhood: Option<String>,
    #[serde(alias = "busca")]
    pub q: Option<String>,
    #[serde(alias = "ordenar")]
    pub sort: Option<String>,
    #[serde(alias = "pagina")]
    pub page: Option<i64>,
    #[serde(alias = "por_pagina")]
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct NeighborhoodQuery {
    #[serde(alias = "cidade")]
    pub city: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct WhatsAppQuery {
    #[serde(alias = "mensagem")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BecomeProviderRequest {
    pub description: Option<String>,
    pub neighborhood: Option<String>,
    pub city: String,
    pub whatsapp: Option<String>,
    pub category_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateProviderRequest {
    pub description: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub whatsapp: Option<String>,
    pub is_active: Option<bool>,
    pub category_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceCategoriesRequest {
    pub category_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    #[serde(alias = "cidade")]
    pub city: String,
    #[serde(alias = "estado", alias = "uf")]
    pub state: String,
    #[serde(alias = "bairro")]
    pub neighborhood: Option<String>,
}
