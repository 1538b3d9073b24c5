//! Authentication data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// JWT claims structure
#[derive(Serialize, Deserialize, Debug)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

pub const ROLE_CLIENT: &str = "CLIENT";
pub const ROLE_PROVIDER: &str = "PROVIDER";

/// User database model
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub role: String,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub auth_provider: String,
    pub email_confirmed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// User as returned to the caller, with the admin flag resolved
#[derive(Serialize, Debug)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub role: String,
    pub is_admin: bool,
    pub email_confirmed: bool,
    pub created_at: String,
}

impl UserResponse {
    pub fn from_user(user: User, is_admin: bool) -> Self {
        Self {
            email_confirmed: user.email_confirmed_at.is_some(),
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
            role: user.role,
            is_admin,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct SignUpResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Serialize, Debug)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserResponse,
}

// ============================================================================
// Email-link tokens
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Signup,
    Recovery,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Signup => "signup",
            TokenKind::Recovery => "recovery",
        }
    }

    /// Accepts the `type` values used in email links ("email" is an alias of signup)
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "signup" | "email" => Some(TokenKind::Signup),
            "recovery" => Some(TokenKind::Recovery),
            _ => None,
        }
    }
}

#[derive(FromRow, Debug, Clone)]
pub struct AuthToken {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub token_hash: String,
    pub expires_at: String,
    pub used_at: Option<String>,
    pub created_at: String,
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Deserialize, Debug)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(alias = "name")]
    pub full_name: String,
    pub role: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct ResetPasswordRequest {
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct UpdateMeRequest {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Query of `GET /callback`
#[derive(Deserialize, Debug, Default)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub next: Option<String>,
    pub state: Option<String>,
}

/// Query of `GET /auth/google`
#[derive(Deserialize, Debug, Default)]
pub struct OAuthStartQuery {
    pub next: Option<String>,
}

/// Query of `GET /auth/confirm`
#[derive(Deserialize, Debug, Default)]
pub struct ConfirmQuery {
    pub token_hash: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub next: Option<String>,
}
