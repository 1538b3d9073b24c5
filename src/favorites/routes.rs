// src/favorites/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Favorite routes (all require a session)
///
/// # Routes
/// - `GET /api/favorites` - Favorited providers, newest favorite first
/// - `GET /api/favorites/:provider_id` - Membership check
/// - `POST /api/favorites/:provider_id/toggle` - Add or remove
pub fn favorites_routes() -> Router {
    Router::new()
        .route("/api/favorites", get(handlers::list_favorites))
        .route("/api/favorites/:provider_id", get(handlers::get_favorite_status))
        .route(
            "/api/favorites/:provider_id/toggle",
            post(handlers::toggle_favorite),
        )
}
