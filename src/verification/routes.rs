// src/verification/routes.rs

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use super::handlers;
use crate::common::uploads::DOUBLE_IMAGE_BODY_LIMIT;

/// Verification routes
///
/// # Routes
/// - `GET /api/provider/me/verification` - Own verification state
/// - `POST /api/provider/me/verification` - Submit identity + selfie
/// - `GET /api/admin/verifications` - Admin queue (allow-listed emails only)
/// - `POST /api/admin/verifications/:provider_id/approve` - Approve
/// - `POST /api/admin/verifications/:provider_id/reject` - Reject
/// - `GET /api/storage/verifications/*path` - Signed document files
pub fn verification_routes() -> Router {
    Router::new()
        .route(
            "/api/provider/me/verification",
            get(handlers::get_own_verification).post(handlers::submit_verification),
        )
        .layer(DefaultBodyLimit::max(DOUBLE_IMAGE_BODY_LIMIT))
        .route("/api/admin/verifications", get(handlers::admin_list_verifications))
        .route(
            "/api/admin/verifications/:provider_id/approve",
            post(handlers::admin_approve_verification),
        )
        .route(
            "/api/admin/verifications/:provider_id/reject",
            post(handlers::admin_reject_verification),
        )
        .route(
            "/api/storage/verifications/*path",
            get(handlers::serve_verification_file),
        )
}
