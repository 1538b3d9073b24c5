// src/portfolio/routes.rs

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use super::handlers;
use crate::common::uploads::SINGLE_IMAGE_BODY_LIMIT;

/// Portfolio routes
///
/// # Routes
/// - `GET /api/providers/:id/portfolio` - Provider's images, newest first
/// - `POST /api/provider/me/portfolio` - Upload an image (multipart `image`)
/// - `DELETE /api/provider/me/portfolio/:image_id` - Remove an own image
/// - `GET /api/storage/portfolio/*path` - Public image files
pub fn portfolio_routes() -> Router {
    Router::new()
        .route("/api/providers/:id/portfolio", get(handlers::list_portfolio))
        .route(
            "/api/provider/me/portfolio",
            post(handlers::upload_portfolio_image)
                .layer(DefaultBodyLimit::max(SINGLE_IMAGE_BODY_LIMIT)),
        )
        .route(
            "/api/provider/me/portfolio/:image_id",
            delete(handlers::delete_portfolio_image),
        )
        .route("/api/storage/portfolio/*path", get(handlers::serve_portfolio_file))
}
