// src/categories/routes.rs

use axum::{routing::get, Router};

use super::handlers;

pub fn categories_routes() -> Router {
    Router::new()
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/categories/grouped", get(handlers::list_grouped_categories))
        .route("/api/categories/:slug", get(handlers::get_category))
}
