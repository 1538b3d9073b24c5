// src/reviews/routes.rs

use axum::{routing::get, Router};

use super::handlers;

/// Review routes
///
/// # Routes
/// - `GET /api/providers/:id/reviews` - Reviews, newest first
/// - `POST /api/providers/:id/reviews` - Submit a review (one per client)
pub fn reviews_routes() -> Router {
    Router::new().route(
        "/api/providers/:id/reviews",
        get(handlers::list_reviews).post(handlers::submit_review),
    )
}
