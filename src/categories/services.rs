use super::models::Category;
use crate::common::ApiError;
use sqlx::SqlitePool;

pub struct CategoryService {
    db: SqlitePool,
}

impl CategoryService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// All categories ordered by name, optionally narrowed by a name substring
    pub async fn list(&self, q: Option<&str>) -> Result<Vec<Category>, ApiError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug FROM categories ORDER BY name ASC",
        )
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        Ok(filter_by_name(categories, q))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, ApiError> {
        sqlx::query_as::<_, Category>("SELECT id, name, slug FROM categories WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::DatabaseError)
    }
}

/// Case-insensitive name filter; blank queries keep everything
pub fn filter_by_name(categories: Vec<Category>, q: Option<&str>) -> Vec<Category> {
    match q.map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => {
            let needle = q.to_lowercase();
            categories
                .into_iter()
                .filter(|c| c.name.to_lowercase().contains(&needle))
                .collect()
        }
        None => categories,
    }
}
