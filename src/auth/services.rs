// src/auth/services.rs

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{error, info, warn};

use super::models::*;
use super::validators::normalize_email;
use crate::common::{
    generate_token_id, generate_user_id, now_rfc3339, safe_email_log, ApiError,
};
use crate::services::google::GoogleUserInfo;

/// Email-link tokens stay valid for one hour
const EMAIL_TOKEN_TTL_MINUTES: i64 = 60;

pub struct AuthService {
    db: SqlitePool,
    jwt_secret: String,
    session_ttl_hours: i64,
}

impl AuthService {
    pub fn new(db: SqlitePool, jwt_secret: impl Into<String>, session_ttl_hours: i64) -> Self {
        Self {
            db,
            jwt_secret: jwt_secret.into(),
            session_ttl_hours,
        }
    }

    // ============================================================================
    // Sessions
    // ============================================================================

    pub fn session_ttl_secs(&self) -> i64 {
        self.session_ttl_hours * 3600
    }

    pub fn issue_session(&self, user_id: &str) -> Result<String, ApiError> {
        let exp = (Utc::now() + Duration::hours(self.session_ttl_hours)).timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            exp,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| {
            error!(error = %e, user_id = %user_id, "JWT encoding error");
            ApiError::InternalServer("jwt error".to_string())
        })
    }

    pub fn decode_session(&self, token: &str) -> Result<Claims, ApiError> {
        decode_session_token(token, &self.jwt_secret)
    }

    // ============================================================================
    // Accounts
    // ============================================================================

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::DatabaseError)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(normalize_email(email))
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::DatabaseError)
    }

    /// Register an email/password account; returns the user and the raw confirmation token
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<(User, String), ApiError> {
        let email = normalize_email(&request.email);

        if self.find_by_email(&email).await?.is_some() {
            return Err(ApiError::Conflict("Este email já está cadastrado.".to_string()));
        }

        let password_hash = hash_password(&request.password)?;
        let role = request.role.as_deref().unwrap_or(ROLE_CLIENT);
        let user_id = generate_user_id();
        let now = now_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, full_name, role, password_hash, auth_provider, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 'email', ?, ?)
            "#,
        )
        .bind(&user_id)
        .bind(&email)
        .bind(request.full_name.trim())
        .bind(role)
        .bind(&password_hash)
        .bind(&now)
        .bind(&now)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                ApiError::Conflict("Este email já está cadastrado.".to_string())
            } else {
                ApiError::DatabaseError(e)
            }
        })?;

        let token = self.create_email_token(&user_id, TokenKind::Signup).await?;
        let user = self
            .get_user(&user_id)
            .await?
            .ok_or_else(|| ApiError::InternalServer("user vanished after insert".to_string()))?;

        info!(
            user_id = %user.id,
            email = %safe_email_log(&user.email),
            role = %user.role,
            "User account created"
        );

        Ok((user, token))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let invalid = || ApiError::Unauthorized("Email ou senha inválidos.".to_string());

        let user = match self.find_by_email(email).await? {
            Some(u) => u,
            None => {
                warn!(email = %safe_email_log(email), "Sign-in failed: unknown email");
                return Err(invalid());
            }
        };

        let hash = match &user.password_hash {
            Some(h) => h,
            None => {
                warn!(user_id = %user.id, "Sign-in failed: account has no password");
                return Err(invalid());
            }
        };

        if !verify_password(password, hash) {
            warn!(user_id = %user.id, "Sign-in failed: wrong password");
            return Err(invalid());
        }

        if user.email_confirmed_at.is_none() {
            warn!(user_id = %user.id, "Sign-in refused: email not confirmed");
            return Err(ApiError::Forbidden(
                "Confirme seu email antes de entrar.".to_string(),
            ));
        }

        info!(user_id = %user.id, "User signed in with password");
        Ok(user)
    }

    /// Find the account for a Google identity, creating a CLIENT account on first sign-in
    ///
    /// Only Google-verified emails are accepted. Linking to an unconfirmed
    /// password account confirms it and drops the password nobody proved.
    pub async fn find_or_create_google_user(&self, info: &GoogleUserInfo) -> Result<User, ApiError> {
        let email = normalize_email(&info.email);

        if !info.verified_email {
            warn!(email = %safe_email_log(&email), "Google sign-in refused: email not verified by Google");
            return Err(ApiError::Forbidden(
                "Seu email do Google não está verificado.".to_string(),
            ));
        }

        if let Some(user) = self.find_by_email(&email).await? {
            let unconfirmed = user.email_confirmed_at.is_none();
            let needs_avatar = user.avatar_url.is_none() && info.picture.is_some();
            if !unconfirmed && !needs_avatar {
                return Ok(user);
            }

            let now = now_rfc3339();
            sqlx::query(
                r#"
                UPDATE users SET
                    avatar_url = COALESCE(avatar_url, ?),
                    password_hash = CASE WHEN email_confirmed_at IS NULL THEN NULL ELSE password_hash END,
                    email_confirmed_at = COALESCE(email_confirmed_at, ?),
                    updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(&info.picture)
            .bind(&now)
            .bind(&now)
            .bind(&user.id)
            .execute(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;

            if unconfirmed {
                info!(user_id = %user.id, "Unconfirmed account claimed via Google; password cleared");
            }

            return self
                .get_user(&user.id)
                .await?
                .ok_or_else(|| ApiError::InternalServer("user vanished".to_string()));
        }

        let user_id = generate_user_id();
        let now = now_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, full_name, avatar_url, role, auth_provider, email_confirmed_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, 'CLIENT', 'google', ?, ?, ?)
            "#,
        )
        .bind(&user_id)
        .bind(&email)
        .bind(info.name.as_deref().unwrap_or(""))
        .bind(&info.picture)
        .bind(&now)
        .bind(&now)
        .bind(&now)
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        info!(
            user_id = %user_id,
            email = %safe_email_log(&email),
            provider = "google",
            "Creating new user account via Google OAuth"
        );

        self.get_user(&user_id)
            .await?
            .ok_or_else(|| ApiError::InternalServer("user vanished after insert".to_string()))
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        request: &UpdateMeRequest,
    ) -> Result<User, ApiError> {
        let avatar_url = request
            .avatar_url
            .as_ref()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        sqlx::query(
            r#"
            UPDATE users SET
                full_name = COALESCE(?, full_name),
                avatar_url = CASE WHEN ? THEN ? ELSE avatar_url END,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(request.full_name.as_ref().map(|n| n.trim().to_string()))
        .bind(request.avatar_url.is_some())
        .bind(&avatar_url)
        .bind(now_rfc3339())
        .bind(user_id)
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        info!(user_id = %user_id, "User profile updated");

        self.get_user(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Usuário não encontrado.".to_string()))
    }

    pub async fn set_password(&self, user_id: &str, password: &str) -> Result<(), ApiError> {
        let hash = hash_password(password)?;
        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(&hash)
            .bind(now_rfc3339())
            .bind(user_id)
            .execute(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Usuário não encontrado.".to_string()));
        }

        info!(user_id = %user_id, "Password updated");
        Ok(())
    }

    // ============================================================================
    // Email-link tokens
    // ============================================================================

    /// Store the hash of a fresh random token and return the raw value for the link
    pub async fn create_email_token(&self, user_id: &str, kind: TokenKind) -> Result<String, ApiError> {
        let raw = uuid::Uuid::new_v4().simple().to_string();
        let expires_at = (Utc::now() + Duration::minutes(EMAIL_TOKEN_TTL_MINUTES))
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        sqlx::query(
            r#"
            INSERT INTO auth_tokens (id, user_id, kind, token_hash, expires_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(generate_token_id())
        .bind(user_id)
        .bind(kind.as_str())
        .bind(hash_token(&raw))
        .bind(&expires_at)
        .bind(now_rfc3339())
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        Ok(raw)
    }

    /// Consume an unused, unexpired token of the given kind
    ///
    /// Returns `None` for unknown, expired, reused or wrong-kind tokens.
    pub async fn verify_email_token(
        &self,
        raw_token: &str,
        kind: TokenKind,
    ) -> Result<Option<User>, ApiError> {
        let now = now_rfc3339();
        let mut tx = self.db.begin().await.map_err(ApiError::DatabaseError)?;

        let token = sqlx::query_as::<_, AuthToken>(
            "SELECT * FROM auth_tokens WHERE token_hash = ? AND kind = ?",
        )
        .bind(hash_token(raw_token))
        .bind(kind.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(ApiError::DatabaseError)?;

        let token = match token {
            Some(t) if t.used_at.is_none() && t.expires_at > now => t,
            Some(t) => {
                warn!(token_id = %t.id, kind = kind.as_str(), "Email token expired or already used");
                return Ok(None);
            }
            None => {
                warn!(kind = kind.as_str(), "Unknown email token");
                return Ok(None);
            }
        };

        if !consume_token(&mut *tx, &token.id, &now).await? {
            warn!(token_id = %token.id, kind = kind.as_str(), "Email token consumed concurrently");
            return Ok(None);
        }

        // Either link kind proves control of the mailbox
        sqlx::query(
            "UPDATE users SET email_confirmed_at = COALESCE(email_confirmed_at, ?), updated_at = ? WHERE id = ?",
        )
        .bind(&now)
        .bind(&now)
        .bind(&token.user_id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::DatabaseError)?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(&token.user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(ApiError::DatabaseError)?;

        tx.commit().await.map_err(ApiError::DatabaseError)?;

        if let Some(u) = &user {
            info!(user_id = %u.id, kind = kind.as_str(), "Email token verified");
        }
        Ok(user)
    }

    /// Create a recovery token when the email belongs to an account
    pub async fn request_password_recovery(&self, email: &str) -> Result<Option<String>, ApiError> {
        match self.find_by_email(email).await? {
            Some(user) => {
                let token = self.create_email_token(&user.id, TokenKind::Recovery).await?;
                info!(user_id = %user.id, "Password recovery requested");
                Ok(Some(token))
            }
            None => {
                info!(email = %safe_email_log(email), "Password recovery requested for unknown email");
                Ok(None)
            }
        }
    }
}

// ---- Helper Functions ----

/// Mark a token used; false when another request got there first
pub async fn consume_token(
    conn: &mut SqliteConnection,
    token_id: &str,
    now: &str,
) -> Result<bool, ApiError> {
    let result = sqlx::query("UPDATE auth_tokens SET used_at = ? WHERE id = ? AND used_at IS NULL")
        .bind(now)
        .bind(token_id)
        .execute(conn)
        .await
        .map_err(ApiError::DatabaseError)?;
    Ok(result.rows_affected() == 1)
}

pub fn decode_session_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        warn!(error = %e, "JWT token validation failed");
        ApiError::Unauthorized("invalid token".to_string())
    })
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| {
        error!(error = %e, "Password hashing failed");
        ApiError::InternalServer("Failed to hash password".to_string())
    })
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// SHA-256 hex digest; only digests of email-link tokens are stored
pub fn hash_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// `Set-Cookie` value carrying the session token
pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        token, max_age_secs
    )
}

pub fn clear_session_cookie() -> String {
    "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0".to_string()
}

pub const OAUTH_STATE_COOKIE: &str = "oauth_state";
const OAUTH_STATE_TTL_SECS: i64 = 600;

/// Fresh OAuth `state`: `{nonce}:{next}`, or just the nonce without a target
pub fn new_oauth_state(next: Option<&str>) -> (String, String) {
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    let state = match next {
        Some(next) => format!("{}:{}", nonce, next),
        None => nonce.clone(),
    };
    (nonce, state)
}

/// Split a returned `state` into its nonce and post-login target
pub fn parse_oauth_state(state: &str) -> (&str, Option<&str>) {
    match state.split_once(':') {
        Some((nonce, next)) => (nonce, Some(next)),
        None => (state, None),
    }
}

/// Binds the OAuth round trip to the browser that started it
pub fn oauth_state_cookie(nonce: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        OAUTH_STATE_COOKIE, nonce, OAUTH_STATE_TTL_SECS
    )
}

pub fn clear_oauth_state_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", OAUTH_STATE_COOKIE)
}
