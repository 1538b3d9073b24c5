//! Tests for portfolio module

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::common::test_support::*;
    use crate::common::ApiError;
    use crate::portfolio::services::{PortfolioService, MAX_PORTFOLIO_IMAGES};
    use crate::services::storage::{Bucket, StorageService};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Extension,
    };
    use sqlx::SqlitePool;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn fill_portfolio(pool: &SqlitePool, provider_id: &str, count: i64) {
        for i in 0..count {
            sqlx::query(
                "INSERT INTO portfolio_images (id, provider_id, image_url, storage_path) VALUES (?, ?, ?, ?)",
            )
            .bind(format!("G_FILL{:02}", i))
            .bind(provider_id)
            .bind(format!("/api/storage/portfolio/x/{}.png", i))
            .bind(format!("x/{}.png", i))
            .execute(pool)
            .await
            .unwrap();
        }
    }

    fn files_under(dir: &std::path::Path) -> usize {
        match std::fs::read_dir(dir) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    #[tokio::test]
    async fn test_upload_stores_file_and_row() {
        let dir = tempfile::tempdir().unwrap();
        let pool = test_pool().await;
        let storage = Arc::new(StorageService::new(dir.path(), TEST_JWT_SECRET));
        let (user_id, provider_id) =
            insert_provider_user(&pool, "joao@example.com", "João", "2024-01-01T00:00:00.000Z").await;

        let service = PortfolioService::new(pool.clone(), storage.clone());
        let image = service.upload(&user_id, &provider_id, PNG_BYTES).await.unwrap();

        assert!(image.storage_path.starts_with(&format!("{}/", user_id)));
        assert!(image.storage_path.ends_with(".png"));
        assert_eq!(
            image.image_url,
            format!("/api/storage/portfolio/{}", image.storage_path)
        );
        assert!(storage.exists(Bucket::Portfolio, &image.storage_path).await);

        let listed = service.list(&provider_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, image.id);
    }

    #[tokio::test]
    async fn test_upload_at_limit_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let pool = test_pool().await;
        let storage = Arc::new(StorageService::new(dir.path(), TEST_JWT_SECRET));
        let (user_id, provider_id) =
            insert_provider_user(&pool, "joao@example.com", "João", "2024-01-01T00:00:00.000Z").await;
        fill_portfolio(&pool, &provider_id, MAX_PORTFOLIO_IMAGES).await;

        let service = PortfolioService::new(pool.clone(), storage);
        let result = service.upload(&user_id, &provider_id, PNG_BYTES).await;

        match result {
            Err(ApiError::LimitReached(msg)) => assert_eq!(msg, "Limite de 10 imagens atingido."),
            other => panic!("expected limit error, got {:?}", other.map(|i| i.id)),
        }
        assert_eq!(files_under(&dir.path().join("portfolio").join(&user_id)), 0);
        assert_eq!(service.count(&provider_id).await.unwrap(), MAX_PORTFOLIO_IMAGES);
    }

    #[tokio::test]
    async fn test_upload_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let pool = test_pool().await;
        let storage = Arc::new(StorageService::new(dir.path(), TEST_JWT_SECRET));
        let (user_id, provider_id) =
            insert_provider_user(&pool, "joao@example.com", "João", "2024-01-01T00:00:00.000Z").await;

        let service = PortfolioService::new(pool, storage);
        let result = service.upload(&user_id, &provider_id, b"%PDF-1.7").await;
        assert!(matches!(result, Err(ApiError::ValidationError(_))));
        assert_eq!(files_under(&dir.path().join("portfolio").join(&user_id)), 0);
    }

    #[tokio::test]
    async fn test_back_to_back_uploads_keep_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let pool = test_pool().await;
        let storage = Arc::new(StorageService::new(dir.path(), TEST_JWT_SECRET));
        let (user_id, provider_id) =
            insert_provider_user(&pool, "joao@example.com", "João", "2024-01-01T00:00:00.000Z").await;

        let service = PortfolioService::new(pool, storage.clone());
        let mut images = Vec::new();
        for _ in 0..MAX_PORTFOLIO_IMAGES {
            images.push(service.upload(&user_id, &provider_id, PNG_BYTES).await.unwrap());
        }

        let mut paths: Vec<&str> = images.iter().map(|i| i.storage_path.as_str()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), images.len());
        assert_eq!(
            files_under(&dir.path().join("portfolio").join(&user_id)),
            images.len()
        );

        service.delete(&provider_id, &images[0].id).await.unwrap();
        for image in &images[1..] {
            assert!(storage.exists(Bucket::Portfolio, &image.storage_path).await);
        }
        assert_eq!(service.list(&provider_id).await.unwrap().len(), images.len() - 1);
    }

    #[tokio::test]
    async fn test_delete_only_own_image() {
        let dir = tempfile::tempdir().unwrap();
        let pool = test_pool().await;
        let storage = Arc::new(StorageService::new(dir.path(), TEST_JWT_SECRET));
        let (user_id, provider_id) =
            insert_provider_user(&pool, "joao@example.com", "João", "2024-01-01T00:00:00.000Z").await;
        let (_, other_provider) =
            insert_provider_user(&pool, "rita@example.com", "Rita", "2024-01-02T00:00:00.000Z").await;

        let service = PortfolioService::new(pool, storage.clone());
        let image = service.upload(&user_id, &provider_id, PNG_BYTES).await.unwrap();

        let refused = service.delete(&other_provider, &image.id).await;
        assert!(matches!(refused, Err(ApiError::NotFound(_))));
        assert!(storage.exists(Bucket::Portfolio, &image.storage_path).await);

        service.delete(&provider_id, &image.id).await.unwrap();
        assert!(!storage.exists(Bucket::Portfolio, &image.storage_path).await);
        assert!(service.list(&provider_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_public_file_is_served() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        state
            .storage
            .upload(Bucket::Portfolio, "U_1/1700000000000.png", PNG_BYTES)
            .await
            .unwrap();
        let app = portfolio_routes().layer(Extension(shared(state)));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/storage/portfolio/U_1/1700000000000.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

        let missing = app
            .oneshot(
                Request::builder()
                    .uri("/api/storage/portfolio/U_1/nope.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
