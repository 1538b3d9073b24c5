// src/common/migrations.rs
//! Database migration and schema management

use sqlx::SqlitePool;
use std::env;
use tracing::{info, warn};

use crate::categories::taxonomy::SEED_CATEGORIES;
use crate::common::helpers::now_rfc3339;
use crate::common::id_generator::generate_category_id;

/// Run all database migrations
///
/// Tables are created if missing. `RESET_DB=true` drops everything first.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let should_reset_db = env::var("RESET_DB").unwrap_or_else(|_| "false".to_string()) == "true";

    if should_reset_db {
        warn!("RESET_DB=true - dropping all tables and recreating schema");
        drop_all_tables(pool).await?;
        info!("Dropped old tables");
    } else {
        info!("Skipping table drop (RESET_DB not set). Tables will be created if they don't exist.");
    }

    apply_schema(pool).await?;
    seed_categories(pool).await?;

    info!("Database migration completed successfully");

    Ok(())
}

/// Create tables, views and indexes without touching existing data
///
/// Used directly by tests against an in-memory pool.
pub async fn apply_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    create_account_tables(pool).await?;
    create_provider_tables(pool).await?;
    create_interaction_tables(pool).await?;
    create_verification_tables(pool).await?;
    create_views(pool).await?;
    create_indexes(pool).await?;
    Ok(())
}

async fn drop_all_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let _ = sqlx::query("DROP VIEW IF EXISTS provider_ratings")
        .execute(pool)
        .await;

    // Reverse dependency order
    let tables = vec![
        "verification_documents",
        "favorites",
        "reviews",
        "portfolio_images",
        "provider_categories",
        "provider_profiles",
        "categories",
        "auth_tokens",
        "users",
    ];

    for table in tables {
        let _ = sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(pool)
            .await;
    }

    Ok(())
}

async fn create_account_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT UNIQUE NOT NULL,
            full_name TEXT NOT NULL DEFAULT '',
            avatar_url TEXT,
            role TEXT NOT NULL DEFAULT 'CLIENT' CHECK(role IN ('CLIENT', 'PROVIDER')),
            password_hash TEXT,
            auth_provider TEXT NOT NULL DEFAULT 'email',
            email_confirmed_at TEXT,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Email-link tokens (signup confirmation, password recovery)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS auth_tokens (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            kind TEXT NOT NULL CHECK(kind IN ('signup', 'recovery')),
            token_hash TEXT UNIQUE NOT NULL,
            expires_at TEXT NOT NULL,
            used_at TEXT,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_provider_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    // No foreign key on user_id; listings drop profiles whose user row is gone.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS provider_profiles (
            id TEXT PRIMARY KEY,
            user_id TEXT UNIQUE NOT NULL,
            description TEXT,
            neighborhood TEXT,
            city TEXT,
            whatsapp TEXT,
            is_active BOOLEAN NOT NULL DEFAULT 1,
            verification_status TEXT NOT NULL DEFAULT 'none'
                CHECK(verification_status IN ('none', 'pending', 'approved', 'rejected')),
            is_verified BOOLEAN NOT NULL DEFAULT 0,
            verified_at TEXT,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS provider_categories (
            provider_id TEXT NOT NULL,
            category_id TEXT NOT NULL,
            PRIMARY KEY(provider_id, category_id),
            FOREIGN KEY(provider_id) REFERENCES provider_profiles(id) ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS portfolio_images (
            id TEXT PRIMARY KEY,
            provider_id TEXT NOT NULL,
            image_url TEXT NOT NULL,
            storage_path TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            FOREIGN KEY(provider_id) REFERENCES provider_profiles(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_interaction_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id TEXT PRIMARY KEY,
            provider_id TEXT NOT NULL,
            client_id TEXT NOT NULL,
            rating INTEGER NOT NULL CHECK(rating BETWEEN 1 AND 5),
            comment TEXT,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            FOREIGN KEY(provider_id) REFERENCES provider_profiles(id) ON DELETE CASCADE,
            FOREIGN KEY(client_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS favorites (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            provider_id TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY(provider_id) REFERENCES provider_profiles(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_verification_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS verification_documents (
            id TEXT PRIMARY KEY,
            provider_id TEXT NOT NULL,
            document_type TEXT NOT NULL CHECK(document_type IN ('identity', 'selfie')),
            document_url TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK(status IN ('pending', 'approved', 'rejected')),
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            reviewed_at TEXT,
            FOREIGN KEY(provider_id) REFERENCES provider_profiles(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_views(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Rating aggregate, read by every provider listing
    sqlx::query(
        r#"
        CREATE VIEW IF NOT EXISTS provider_ratings AS
        SELECT
            provider_id,
            AVG(rating) AS average_rating,
            COUNT(*) AS review_count
        FROM reviews
        GROUP BY provider_id
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let indexes = vec![
        // Provider indexes
        "CREATE INDEX IF NOT EXISTS idx_provider_profiles_active ON provider_profiles(is_active, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_provider_profiles_verification ON provider_profiles(verification_status)",
        "CREATE INDEX IF NOT EXISTS idx_provider_categories_category ON provider_categories(category_id)",
        "CREATE INDEX IF NOT EXISTS idx_portfolio_images_provider ON portfolio_images(provider_id, created_at)",

        // One review per client per provider, one favorite row per pair
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_reviews_provider_client ON reviews(provider_id, client_id)",
        "CREATE INDEX IF NOT EXISTS idx_reviews_provider_created ON reviews(provider_id, created_at)",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_favorites_user_provider ON favorites(user_id, provider_id)",
        "CREATE INDEX IF NOT EXISTS idx_favorites_user_created ON favorites(user_id, created_at)",

        // Verification indexes
        "CREATE INDEX IF NOT EXISTS idx_verification_documents_provider ON verification_documents(provider_id, status)",
        "CREATE INDEX IF NOT EXISTS idx_verification_documents_created ON verification_documents(created_at)",

        // Token indexes
        "CREATE INDEX IF NOT EXISTS idx_auth_tokens_user ON auth_tokens(user_id, kind)",
    ];

    for index_sql in indexes {
        sqlx::query(index_sql).execute(pool).await?;
    }

    Ok(())
}

/// Insert the static category list; existing slugs are left untouched
pub async fn seed_categories(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let now = now_rfc3339();
    let mut inserted = 0u64;

    for (slug, name) in SEED_CATEGORIES {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO categories (id, name, slug, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(generate_category_id())
        .bind(name)
        .bind(slug)
        .bind(&now)
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }

    if inserted > 0 {
        info!(count = inserted, "Seeded service categories");
    }

    Ok(())
}
