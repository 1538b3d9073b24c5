// src/providers/routes.rs

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers;

/// Provider routes
///
/// # Routes
/// - `GET /api/providers` - Search active providers
/// - `GET /api/providers/cities` - Cities for the filter dropdown
/// - `GET /api/providers/neighborhoods` - Neighborhoods, optionally by city
/// - `GET /api/providers/category-counts` - Visible providers per category
/// - `GET /api/providers/:id` - Public profile page data
/// - `GET /api/providers/:id/whatsapp` - WhatsApp deep link
/// - `POST /api/provider` - Become a provider
/// - `GET|PUT /api/provider/me` - Own provider profile
/// - `PUT /api/provider/me/categories` - Replace own category set
/// - `GET /api/cep/:cep` - Postal-code lookup
/// - `GET /api/geocode` - City/neighborhood coordinates
pub fn providers_routes() -> Router {
    Router::new()
        .route("/api/providers", get(handlers::search_providers))
        .route("/api/providers/cities", get(handlers::list_cities))
        .route("/api/providers/neighborhoods", get(handlers::list_neighborhoods))
        .route("/api/providers/category-counts", get(handlers::category_counts))
        .route("/api/providers/:id", get(handlers::get_provider))
        .route("/api/providers/:id/whatsapp", get(handlers::whatsapp_link))
        .route("/api/provider", post(handlers::become_provider))
        .route(
            "/api/provider/me",
            get(handlers::get_own_profile).put(handlers::update_own_profile),
        )
        .route("/api/provider/me/categories", put(handlers::replace_own_categories))
        .route("/api/cep/:cep", get(handlers::lookup_cep))
        .route("/api/geocode", get(handlers::geocode))
}
