//! Authentication handlers

use axum::{
    extract::{Extension, Json, Query},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::extractors::{cookie_value, AuthedUser};
use super::models::*;
use super::services::{
    clear_oauth_state_cookie, clear_session_cookie, new_oauth_state, oauth_state_cookie,
    parse_oauth_state, session_cookie, AuthService, OAUTH_STATE_COOKIE,
};
use super::validators::AccountValidator;
use crate::common::helpers::safe_redirect_path;
use crate::common::{safe_email_log, ApiError, AppState, Validator};

const INVALID_LINK_MESSAGE: &str = "Link inválido ou expirado. Tente novamente.";
const OAUTH_DEFAULT_ERROR: &str = "Erro na autenticação";

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        state.db.clone(),
        state.config.jwt_secret.clone(),
        state.config.session_ttl_hours,
    )
}

fn session_response(
    service: &AuthService,
    state: &AppState,
    user: User,
) -> Result<Response, ApiError> {
    let token = service.issue_session(&user.id)?;
    let cookie = session_cookie(&token, service.session_ttl_secs());
    let is_admin = state.is_admin_email(&user.email);
    let body = SessionResponse {
        token,
        user: UserResponse::from_user(user, is_admin),
    };
    Ok(([(SET_COOKIE, cookie)], Json(body)).into_response())
}

fn site_redirect(state: &AppState, path: &str) -> String {
    format!("{}{}", state.config.site_url, path)
}

fn login_redirect(state: &AppState, error: Option<&str>) -> Response {
    let url = match error {
        Some(msg) => site_redirect(
            state,
            &format!("/login?error={}", urlencoding::encode(msg)),
        ),
        None => site_redirect(state, "/login"),
    };
    Redirect::to(&url).into_response()
}

/// POST /api/auth/signup
pub async fn sign_up(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<SignUpRequest>,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();
    AccountValidator.validate(&payload).into_result()?;

    let service = auth_service(&state);
    let (user, token) = service.sign_up(&payload).await?;

    // Email delivery is not wired up; the link is written to the log instead.
    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        link = %site_redirect(&state, &format!("/auth/confirm?token_hash={}&type=signup", token)),
        "Signup confirmation link generated"
    );

    // No session until the email is confirmed
    let is_admin = state.is_admin_email(&user.email);
    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            message: "Conta criada! Verifique seu email para confirmar.".to_string(),
            user: UserResponse::from_user(user, is_admin),
        }),
    )
        .into_response())
}

/// POST /api/auth/login
pub async fn sign_in(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<SignInRequest>,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();
    AccountValidator.validate(&payload).into_result()?;

    let service = auth_service(&state);
    let user = service.sign_in(&payload.email, &payload.password).await?;

    session_response(&service, &state, user)
}

/// POST /api/auth/logout
/// Clears the session cookie; bearer tokens are dropped client-side
pub async fn sign_out() -> impl IntoResponse {
    info!("User logout successful");
    (
        [(SET_COOKIE, clear_session_cookie())],
        Json(serde_json::json!({ "message": "Logout successful" })),
    )
}

/// GET /api/me
pub async fn me_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<UserResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let user = auth_service(&state)
        .get_user(&authed.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Usuário não encontrado.".to_string()))?;

    Ok(Json(UserResponse::from_user(user, authed.is_admin)))
}

/// PUT /api/me
pub async fn update_me(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(payload): Json<UpdateMeRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    AccountValidator.validate(&payload).into_result()?;

    let user = auth_service(&state).update_profile(&authed.id, &payload).await?;
    Ok(Json(UserResponse::from_user(user, authed.is_admin)))
}

/// POST /api/auth/forgot-password
/// Always answers the same way so the endpoint cannot be used to probe accounts
pub async fn forgot_password(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    if payload.email.trim().is_empty() {
        return Err(ApiError::ValidationError("email: Informe seu email.".to_string()));
    }

    if let Some(token) = auth_service(&state)
        .request_password_recovery(&payload.email)
        .await?
    {
        info!(
            email = %safe_email_log(&payload.email),
            link = %site_redirect(&state, &format!("/auth/confirm?token_hash={}&type=recovery", token)),
            "Password recovery link generated"
        );
    }

    Ok(Json(serde_json::json!({
        "message": "Se o email estiver cadastrado, você receberá um link de recuperação."
    })))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    AccountValidator.validate(&payload).into_result()?;

    auth_service(&state)
        .set_password(&authed.id, &payload.password)
        .await?;

    info!(
        user_id = %authed.id,
        email = %safe_email_log(&authed.email),
        "Password reset completed"
    );

    Ok(Json(serde_json::json!({ "message": "Senha redefinida com sucesso." })))
}

/// GET /auth/google - Start Google OAuth flow
pub async fn google_oauth_start(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(query): Query<OAuthStartQuery>,
) -> Response {
    let state = state_lock.read().await.clone();
    let next = safe_redirect_path(query.next.as_deref());

    let (nonce, oauth_state) = new_oauth_state(next.as_deref());

    match state.google_service.get_authorization_url(&oauth_state) {
        Ok(auth_url) => {
            info!("Redirecting to Google OAuth");
            (
                [(SET_COOKIE, oauth_state_cookie(&nonce))],
                Redirect::to(&auth_url),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to generate Google OAuth URL");
            login_redirect(&state, Some("Erro ao entrar com Google."))
        }
    }
}

/// GET /callback - Handle OAuth callback from Google
///
/// Never answers with JSON: every outcome is a redirect to the site.
pub async fn google_oauth_callback(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    headers: HeaderMap,
    Query(params): Query<OAuthCallbackQuery>,
) -> Response {
    let state = state_lock.read().await.clone();

    if let Some(oauth_error) = params.error.as_deref() {
        let description = params
            .error_description
            .as_deref()
            .unwrap_or(OAUTH_DEFAULT_ERROR);
        warn!(oauth_error = %oauth_error, "Google OAuth returned error");
        return login_redirect(&state, Some(description));
    }

    let code = match params.code.as_deref().filter(|c| !c.is_empty()) {
        Some(c) => c,
        None => {
            warn!("No authorization code in OAuth callback");
            return login_redirect(&state, None);
        }
    };

    // The returned state must carry the nonce this browser was given at /auth/google
    let (nonce, state_next) = parse_oauth_state(params.state.as_deref().unwrap_or_default());
    let expected = cookie_value(&headers, OAUTH_STATE_COOKIE);
    if nonce.is_empty() || expected.as_deref() != Some(nonce) {
        warn!("OAuth state mismatch; callback refused");
        return login_redirect(&state, Some(OAUTH_DEFAULT_ERROR));
    }

    let next = safe_redirect_path(params.next.as_deref())
        .or_else(|| safe_redirect_path(state_next))
        .unwrap_or_else(|| "/home".to_string());

    let token_response = match state.google_service.exchange_code(code).await {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to exchange authorization code for tokens");
            return login_redirect(&state, None);
        }
    };

    let user_info = match state
        .google_service
        .get_user_info(&token_response.access_token)
        .await
    {
        Ok(info) => info,
        Err(e) => {
            error!(error = %e, "Failed to load Google user info");
            return login_redirect(&state, None);
        }
    };

    let service = auth_service(&state);
    let session = async {
        let user = service.find_or_create_google_user(&user_info).await?;
        let token = service.issue_session(&user.id)?;
        Ok::<_, ApiError>((user, token))
    }
    .await;

    match session {
        Ok((user, token)) => {
            info!(
                user_id = %user.id,
                email = %safe_email_log(&user.email),
                provider = "google",
                "User authentication successful via Google OAuth"
            );
            (
                AppendHeaders([
                    (SET_COOKIE, session_cookie(&token, service.session_ttl_secs())),
                    (SET_COOKIE, clear_oauth_state_cookie()),
                ]),
                Redirect::to(&site_redirect(&state, &next)),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to establish session after Google OAuth");
            login_redirect(&state, None)
        }
    }
}

/// GET /auth/confirm - Email-link confirmation (signup or password recovery)
pub async fn confirm_email(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(query): Query<ConfirmQuery>,
) -> Response {
    let state = state_lock.read().await.clone();

    let (raw_token, kind) = match (
        query.token_hash.as_deref().filter(|t| !t.is_empty()),
        query.kind.as_deref().and_then(TokenKind::parse),
    ) {
        (Some(token), Some(kind)) => (token, kind),
        _ => return login_redirect(&state, Some(INVALID_LINK_MESSAGE)),
    };

    let service = auth_service(&state);
    let user = match service.verify_email_token(raw_token, kind).await {
        Ok(Some(user)) => user,
        Ok(None) => return login_redirect(&state, Some(INVALID_LINK_MESSAGE)),
        Err(e) => {
            error!(error = %e, "Email token verification failed");
            return login_redirect(&state, Some(INVALID_LINK_MESSAGE));
        }
    };

    let token = match service.issue_session(&user.id) {
        Ok(t) => t,
        Err(_) => return login_redirect(&state, Some(INVALID_LINK_MESSAGE)),
    };

    let destination = safe_redirect_path(query.next.as_deref()).unwrap_or_else(|| match kind {
        TokenKind::Recovery => "/reset-password".to_string(),
        TokenKind::Signup => "/home".to_string(),
    });

    (
        [(SET_COOKIE, session_cookie(&token, service.session_ttl_secs()))],
        Redirect::to(&site_redirect(&state, &destination)),
    )
        .into_response()
}
