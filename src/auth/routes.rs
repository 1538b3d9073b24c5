//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /api/auth/signup` - Email/password registration
/// - `POST /api/auth/login` - Email/password sign-in
/// - `POST /api/auth/logout` - Clear the session cookie
/// - `POST /api/auth/forgot-password` - Request a recovery link
/// - `POST /api/auth/reset-password` - Set a new password
/// - `GET /auth/google` - Start Google OAuth
/// - `GET /callback` - Google OAuth callback
/// - `GET /auth/confirm` - Email-link confirmation
/// - `GET|PUT /api/me` - Current user
pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/auth/signup", post(handlers::sign_up))
        .route("/api/auth/login", post(handlers::sign_in))
        .route("/api/auth/logout", post(handlers::sign_out))
        .route("/api/auth/forgot-password", post(handlers::forgot_password))
        .route("/api/auth/reset-password", post(handlers::reset_password))
        .route("/auth/google", get(handlers::google_oauth_start))
        .route("/callback", get(handlers::google_oauth_callback))
        .route("/auth/confirm", get(handlers::confirm_email))
        .route("/api/me", get(handlers::me_handler).put(handlers::update_me))
}
