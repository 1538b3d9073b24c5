//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
        HeaderMap,
    },
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use super::models::User;
use super::services::decode_session_token;
use crate::common::{safe_email_log, ApiError, AppState};

/// Authenticated user extractor
///
/// Accepts a `Bearer` token in the Authorization header or the `session`
/// cookie, then loads the user. `is_admin` comes from the ADMIN_EMAILS list.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub id: String,
    pub email: String,
    pub role: String,
    pub is_admin: bool,
}

impl AuthedUser {
    /// Fails with 403 unless the caller is on the admin allow-list
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin {
            Ok(())
        } else {
            warn!(user_id = %self.id, "Admin action refused for non-admin user");
            Err(ApiError::Forbidden("Não autorizado.".to_string()))
        }
    }
}

/// Like `AuthedUser` but never rejects; anonymous callers yield `None`
#[derive(Debug, Clone)]
pub struct MaybeAuthedUser(pub Option<AuthedUser>);

/// Pull the session token from `Authorization: Bearer` or the `session` cookie
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) {
        let bare = value.strip_prefix("Bearer ").unwrap_or(value).trim();
        if !bare.is_empty() {
            return Some(bare.to_string());
        }
    }

    cookie_value(headers, "session")
}

/// First non-empty value of the named cookie
pub fn cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

async fn load_authed_user(app_state: &AppState, token: &str) -> Result<AuthedUser, ApiError> {
    let claims = decode_session_token(token, &app_state.config.jwt_secret)?;
    let user_id = claims.sub;

    let user: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&user_id)
        .fetch_optional(&app_state.db)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                user_id = %user_id,
                "Database error during user lookup in authentication"
            );
            ApiError::DatabaseError(e)
        })?;

    match user {
        Some(u) => {
            let is_admin = app_state.is_admin_email(&u.email);
            debug!(
                user_id = %u.id,
                email = %safe_email_log(&u.email),
                is_admin = is_admin,
                "User authentication successful via extractor"
            );
            Ok(AuthedUser {
                id: u.id,
                email: u.email,
                role: u.role,
                is_admin,
            })
        }
        None => {
            warn!(user_id = %user_id, "Authentication failed: user not found in database");
            Err(ApiError::Unauthorized("user not found".into()))
        }
    }
}

async fn app_state_from_parts<S>(parts: &mut Parts, state: &S) -> Result<AppState, ApiError>
where
    S: Send + Sync,
{
    let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
        Extension::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

    let app_state = state_lock.read().await.clone();
    Ok(app_state)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = app_state_from_parts(parts, state).await?;

        let token = match session_token_from_headers(&parts.headers) {
            Some(t) => t,
            None => {
                warn!("Authentication failed: missing session token");
                return Err(ApiError::Unauthorized("missing auth".into()));
            }
        };

        load_authed_user(&app_state, &token).await
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = match session_token_from_headers(&parts.headers) {
            Some(t) => t,
            None => return Ok(MaybeAuthedUser(None)),
        };

        let app_state = app_state_from_parts(parts, state).await?;
        match load_authed_user(&app_state, &token).await {
            Ok(user) => Ok(MaybeAuthedUser(Some(user))),
            Err(ApiError::Unauthorized(_)) => Ok(MaybeAuthedUser(None)),
            Err(e) => Err(e),
        }
    }
}
