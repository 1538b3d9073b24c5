// Shared fixtures for module tests: in-memory database and app state

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::common::config::AppConfig;
use crate::common::migrations::{apply_schema, seed_categories};
use crate::common::{generate_provider_id, generate_user_id, AppState};
use crate::services::{CepService, GoogleService, StorageService};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";
pub const TEST_ADMIN_EMAIL: &str = "admin@eufaco.com.br";

/// Single-connection in-memory pool with the production schema and categories
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    apply_schema(&pool).await.expect("schema");
    seed_categories(&pool).await.expect("seed");
    pool
}

pub fn test_config(uploads_dir: &Path) -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        port: 0,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        session_ttl_hours: 1,
        admin_emails: HashSet::from([TEST_ADMIN_EMAIL.to_string()]),
        uploads_dir: uploads_dir.to_path_buf(),
        signed_url_ttl_secs: 3600,
        site_url: "http://localhost:3000".to_string(),
        cors_origins: vec![],
        google_client_id: None,
        google_client_secret: None,
        google_redirect_uri: "http://localhost:8080/callback".to_string(),
    }
}

pub async fn test_state(uploads_dir: &Path) -> AppState {
    let config = test_config(uploads_dir);
    AppState {
        db: test_pool().await,
        storage: Arc::new(StorageService::new(uploads_dir, config.jwt_secret.clone())),
        google_service: Arc::new(GoogleService::new(
            None,
            None,
            config.google_redirect_uri.clone(),
        )),
        cep_service: Arc::new(CepService::new()),
        config,
    }
}

pub fn shared(state: AppState) -> Arc<RwLock<AppState>> {
    Arc::new(RwLock::new(state))
}

pub async fn insert_user(pool: &SqlitePool, email: &str, full_name: &str, role: &str) -> String {
    let id = generate_user_id();
    sqlx::query(
        "INSERT INTO users (id, email, full_name, role, auth_provider) VALUES (?, ?, ?, ?, 'email')",
    )
    .bind(&id)
    .bind(email)
    .bind(full_name)
    .bind(role)
    .execute(pool)
    .await
    .expect("insert user");
    id
}

pub async fn insert_provider(
    pool: &SqlitePool,
    user_id: &str,
    city: &str,
    neighborhood: &str,
    created_at: &str,
) -> String {
    let id = generate_provider_id();
    sqlx::query(
        r#"
        INSERT INTO provider_profiles (id, user_id, description, city, neighborhood, whatsapp, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, '11987654321', ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(format!("Serviços em {}", city))
    .bind(city)
    .bind(neighborhood)
    .bind(created_at)
    .bind(created_at)
    .execute(pool)
    .await
    .expect("insert provider");
    id
}

/// User with role PROVIDER plus a linked profile; returns (user_id, provider_id)
pub async fn insert_provider_user(
    pool: &SqlitePool,
    email: &str,
    full_name: &str,
    created_at: &str,
) -> (String, String) {
    let user_id = insert_user(pool, email, full_name, "PROVIDER").await;
    let provider_id = insert_provider(pool, &user_id, "São Paulo", "Pinheiros", created_at).await;
    (user_id, provider_id)
}

pub async fn category_id(pool: &SqlitePool, slug: &str) -> String {
    let (id,): (String,) = sqlx::query_as("SELECT id FROM categories WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await
        .expect("seeded category");
    id
}

pub async fn link_category(pool: &SqlitePool, provider_id: &str, slug: &str) {
    let category_id = category_id(pool, slug).await;
    sqlx::query("INSERT INTO provider_categories (provider_id, category_id) VALUES (?, ?)")
        .bind(provider_id)
        .bind(category_id)
        .execute(pool)
        .await
        .expect("link category");
}

pub async fn insert_review(pool: &SqlitePool, provider_id: &str, client_id: &str, rating: i64) {
    sqlx::query(
        "INSERT INTO reviews (id, provider_id, client_id, rating) VALUES (?, ?, ?, ?)",
    )
    .bind(crate::common::generate_review_id())
    .bind(provider_id)
    .bind(client_id)
    .bind(rating)
    .execute(pool)
    .await
    .expect("insert review");
}

/// Smallest byte string `infer` recognises as PNG
pub const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
