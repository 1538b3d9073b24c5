// src/providers/services.rs

use std::collections::HashMap;

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

use super::models::*;
use super::validators::normalize_category_ids;
use crate::auth::models::ROLE_PROVIDER;
use crate::categories::Category;
use crate::common::helpers::{digits_only, non_blank};
use crate::common::{generate_provider_id, now_rfc3339, ApiError};

/// Profile joined with user and rating; orphans come back with a NULL user
const LISTING_SELECT: &str = r#"
    SELECT p.id, p.user_id, p.description, p.neighborhood, p.city, p.whatsapp, p.is_active,
           p.verification_status, p.is_verified, p.verified_at, p.created_at,
           u.id AS joined_user_id, u.full_name AS user_full_name, u.avatar_url AS user_avatar_url,
           r.average_rating, r.review_count
    FROM provider_profiles p
    LEFT JOIN users u ON u.id = p.user_id
    LEFT JOIN provider_ratings r ON r.provider_id = p.id
"#;

/// SQLite's default bound-parameter limit is 999; stay well below it
const IN_CLAUSE_CHUNK: usize = 500;

pub struct ProviderService {
    db: SqlitePool,
}

impl ProviderService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    // ============================================================================
    // Listings
    // ============================================================================

    /// Active providers, newest first, with city/neighborhood narrowed in SQL
    ///
    /// Orphans are still present here; the search pipeline drops them.
    pub async fn fetch_active(
        &self,
        city: Option<&str>,
        neighborhood: Option<&str>,
    ) -> Result<Vec<ProviderWithDetails>, ApiError> {
        let mut sql = format!("{} WHERE p.is_active = 1", LISTING_SELECT);
        let mut binds: Vec<String> = Vec::new();

        if let Some(city) = city.map(str::trim).filter(|c| !c.is_empty()) {
            sql.push_str(r" AND p.city LIKE ? ESCAPE '\'");
            binds.push(like_pattern(city));
        }
        if let Some(neighborhood) = neighborhood.map(str::trim).filter(|n| !n.is_empty()) {
            sql.push_str(r" AND p.neighborhood LIKE ? ESCAPE '\'");
            binds.push(like_pattern(neighborhood));
        }
        sql.push_str(" ORDER BY p.created_at DESC");

        let mut query = sqlx::query_as::<_, ProviderListingRow>(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }
        let rows = query
            .fetch_all(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;

        self.attach_categories(rows).await
    }

    /// Providers by id, returned in the order of `ids`; unknown ids and orphans are skipped
    pub async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<ProviderWithDetails>, ApiError> {
        let mut rows = Vec::new();
        for chunk in ids.chunks(IN_CLAUSE_CHUNK) {
            let sql = format!(
                "{} WHERE p.id IN ({})",
                LISTING_SELECT,
                placeholders(chunk.len())
            );
            let mut query = sqlx::query_as::<_, ProviderListingRow>(&sql);
            for id in chunk {
                query = query.bind(id);
            }
            rows.extend(
                query
                    .fetch_all(&self.db)
                    .await
                    .map_err(ApiError::DatabaseError)?,
            );
        }

        let mut by_id: HashMap<String, ProviderWithDetails> = self
            .attach_categories(rows)
            .await?
            .into_iter()
            .filter(|p| p.user.is_some())
            .map(|p| (p.id.clone(), p))
            .collect();

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// One provider with user, categories and rating; orphans resolve to `None`
    pub async fn get_details(&self, provider_id: &str) -> Result<Option<ProviderWithDetails>, ApiError> {
        let sql = format!("{} WHERE p.id = ?", LISTING_SELECT);
        let row = sqlx::query_as::<_, ProviderListingRow>(&sql)
            .bind(provider_id)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;

        let row = match row {
            Some(r) => r,
            None => return Ok(None),
        };
        if row.joined_user_id.is_none() {
            warn!(provider_id = %provider_id, "Provider profile has no user; hiding it");
            return Ok(None);
        }

        Ok(self.attach_categories(vec![row]).await?.into_iter().next())
    }

    async fn attach_categories(
        &self,
        rows: Vec<ProviderListingRow>,
    ) -> Result<Vec<ProviderWithDetails>, ApiError> {
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let mut categories = self.categories_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let cats = categories.remove(&row.id).unwrap_or_default();
                ProviderWithDetails::from_row(row, cats)
            })
            .collect())
    }

    /// Category sets keyed by provider id, each ordered by name
    pub async fn categories_for(
        &self,
        provider_ids: &[String],
    ) -> Result<HashMap<String, Vec<Category>>, ApiError> {
        let mut grouped: HashMap<String, Vec<Category>> = HashMap::new();

        for chunk in provider_ids.chunks(IN_CLAUSE_CHUNK) {
            let sql = format!(
                r#"
                SELECT pc.provider_id, c.id, c.name, c.slug
                FROM provider_categories pc
                JOIN categories c ON c.id = pc.category_id
                WHERE pc.provider_id IN ({})
                ORDER BY c.name ASC
                "#,
                placeholders(chunk.len())
            );
            let mut query = sqlx::query_as::<_, ProviderCategoryRow>(&sql);
            for id in chunk {
                query = query.bind(id);
            }
            let rows = query
                .fetch_all(&self.db)
                .await
                .map_err(ApiError::DatabaseError)?;

            for row in rows {
                grouped.entry(row.provider_id).or_default().push(Category {
                    id: row.id,
                    name: row.name,
                    slug: row.slug,
                });
            }
        }

        Ok(grouped)
    }

    /// Distinct non-empty cities of visible providers, sorted
    pub async fn list_cities(&self) -> Result<Vec<String>, ApiError> {
        let cities: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT TRIM(p.city)
            FROM provider_profiles p
            JOIN users u ON u.id = p.user_id
            WHERE p.is_active = 1 AND p.city IS NOT NULL AND TRIM(p.city) != ''
            ORDER BY 1 ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        Ok(cities.into_iter().map(|(c,)| c).collect())
    }

    /// Distinct non-empty neighborhoods of visible providers, optionally within a city
    pub async fn list_neighborhoods(&self, city: Option<&str>) -> Result<Vec<String>, ApiError> {
        let city = city.map(str::trim).filter(|c| !c.is_empty());
        let mut sql = String::from(
            r#"
            SELECT DISTINCT TRIM(p.neighborhood)
            FROM provider_profiles p
            JOIN users u ON u.id = p.user_id
            WHERE p.is_active = 1 AND p.neighborhood IS NOT NULL AND TRIM(p.neighborhood) != ''
            "#,
        );
        if city.is_some() {
            sql.push_str(r" AND p.city LIKE ? ESCAPE '\'");
        }
        sql.push_str(" ORDER BY 1 ASC");

        let mut query = sqlx::query_as::<_, (String,)>(&sql);
        if let Some(city) = city {
            query = query.bind(like_pattern(city));
        }
        let rows = query
            .fetch_all(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;

        Ok(rows.into_iter().map(|(n,)| n).collect())
    }

    /// Number of visible providers per category slug
    pub async fn category_counts(&self) -> Result<HashMap<String, i64>, ApiError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT c.slug, COUNT(*)
            FROM provider_categories pc
            JOIN categories c ON c.id = pc.category_id
            JOIN provider_profiles p ON p.id = pc.provider_id
            JOIN users u ON u.id = p.user_id
            WHERE p.is_active = 1
            GROUP BY c.slug
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        Ok(rows.into_iter().collect())
    }

    // ============================================================================
    // Own profile
    // ============================================================================

    pub async fn get_profile(&self, provider_id: &str) -> Result<Option<ProviderProfile>, ApiError> {
        sqlx::query_as::<_, ProviderProfile>("SELECT * FROM provider_profiles WHERE id = ?")
            .bind(provider_id)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::DatabaseError)
    }

    pub async fn get_profile_by_user(&self, user_id: &str) -> Result<Option<ProviderProfile>, ApiError> {
        sqlx::query_as::<_, ProviderProfile>("SELECT * FROM provider_profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::DatabaseError)
    }

    /// The caller's profile or 404 when they have none
    pub async fn require_own_profile(&self, user_id: &str) -> Result<ProviderProfile, ApiError> {
        self.get_profile_by_user(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Perfil de prestador não encontrado.".to_string()))
    }

    /// Create the profile, set its categories and promote the user, in one transaction
    pub async fn become_provider(
        &self,
        user_id: &str,
        request: &BecomeProviderRequest,
    ) -> Result<ProviderProfile, ApiError> {
        if self.get_profile_by_user(user_id).await?.is_some() {
            return Err(ApiError::Conflict(
                "Você já possui um perfil de prestador.".to_string(),
            ));
        }

        let category_ids = normalize_category_ids(&request.category_ids);
        self.ensure_categories_exist(&category_ids).await?;

        let provider_id = generate_provider_id();
        let now = now_rfc3339();
        let whatsapp = normalize_whatsapp(request.whatsapp.as_deref());

        let mut tx = self.db.begin().await.map_err(ApiError::DatabaseError)?;

        sqlx::query(
            r#"
            INSERT INTO provider_profiles (
                id, user_id, description, neighborhood, city, whatsapp,
                is_active, verification_status, is_verified, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, 1, 'none', 0, ?, ?)
            "#,
        )
        .bind(&provider_id)
        .bind(user_id)
        .bind(non_blank(request.description.clone()))
        .bind(non_blank(request.neighborhood.clone()))
        .bind(request.city.trim())
        .bind(&whatsapp)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                ApiError::Conflict("Você já possui um perfil de prestador.".to_string())
            } else {
                ApiError::DatabaseError(e)
            }
        })?;

        replace_categories_in(&mut tx, &provider_id, &category_ids).await?;

        sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(ROLE_PROVIDER)
            .bind(&now)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::DatabaseError)?;

        tx.commit().await.map_err(ApiError::DatabaseError)?;

        info!(
            user_id = %user_id,
            provider_id = %provider_id,
            categories = category_ids.len(),
            "Provider profile created"
        );

        self.get_profile(&provider_id)
            .await?
            .ok_or_else(|| ApiError::InternalServer("profile vanished after insert".to_string()))
    }

    /// Patch profile fields; a category list, when present, is replaced in the same transaction
    pub async fn update_profile(
        &self,
        user_id: &str,
        request: &UpdateProviderRequest,
    ) -> Result<ProviderProfile, ApiError> {
        let profile = self.require_own_profile(user_id).await?;

        let category_ids = match &request.category_ids {
            Some(ids) => {
                let ids = normalize_category_ids(ids);
                self.ensure_categories_exist(&ids).await?;
                Some(ids)
            }
            None => None,
        };

        let mut tx = self.db.begin().await.map_err(ApiError::DatabaseError)?;

        sqlx::query(
            r#"
            UPDATE provider_profiles SET
                description = CASE WHEN ? THEN ? ELSE description END,
                neighborhood = CASE WHEN ? THEN ? ELSE neighborhood END,
                city = COALESCE(?, city),
                whatsapp = CASE WHEN ? THEN ? ELSE whatsapp END,
                is_active = COALESCE(?, is_active),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(request.description.is_some())
        .bind(non_blank(request.description.clone()))
        .bind(request.neighborhood.is_some())
        .bind(non_blank(request.neighborhood.clone()))
        .bind(request.city.as_ref().map(|c| c.trim().to_string()))
        .bind(request.whatsapp.is_some())
        .bind(normalize_whatsapp(request.whatsapp.as_deref()))
        .bind(request.is_active)
        .bind(now_rfc3339())
        .bind(&profile.id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::DatabaseError)?;

        if let Some(ids) = &category_ids {
            replace_categories_in(&mut tx, &profile.id, ids).await?;
        }

        tx.commit().await.map_err(ApiError::DatabaseError)?;

        info!(user_id = %user_id, provider_id = %profile.id, "Provider profile updated");

        self.get_profile(&profile.id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Perfil de prestador não encontrado.".to_string()))
    }

    /// Replace the provider's whole category set in one transaction
    pub async fn replace_categories(
        &self,
        provider_id: &str,
        category_ids: &[String],
    ) -> Result<Vec<Category>, ApiError> {
        let ids = normalize_category_ids(category_ids);
        self.ensure_categories_exist(&ids).await?;

        let mut tx = self.db.begin().await.map_err(ApiError::DatabaseError)?;
        replace_categories_in(&mut tx, provider_id, &ids).await?;
        tx.commit().await.map_err(ApiError::DatabaseError)?;

        info!(provider_id = %provider_id, categories = ids.len(), "Provider categories replaced");

        Ok(self
            .categories_for(&[provider_id.to_string()])
            .await?
            .remove(provider_id)
            .unwrap_or_default())
    }

    /// Refuse empty sets and ids that are not in the category table
    async fn ensure_categories_exist(&self, ids: &[String]) -> Result<(), ApiError> {
        if ids.is_empty() {
            return Err(ApiError::ValidationError(
                "category_ids: Selecione pelo menos uma categoria de serviço.".to_string(),
            ));
        }

        let mut found = 0i64;
        for chunk in ids.chunks(IN_CLAUSE_CHUNK) {
            let sql = format!(
                "SELECT COUNT(*) FROM categories WHERE id IN ({})",
                placeholders(chunk.len())
            );
            let mut query = sqlx::query_as::<_, (i64,)>(&sql);
            for id in chunk {
                query = query.bind(id);
            }
            let (count,) = query
                .fetch_one(&self.db)
                .await
                .map_err(ApiError::DatabaseError)?;
            found += count;
        }

        if found != ids.len() as i64 {
            return Err(ApiError::ValidationError(
                "category_ids: Categoria inválida.".to_string(),
            ));
        }
        Ok(())
    }
}

/// Delete-all then insert, on a connection already inside a transaction
pub async fn replace_categories_in(
    conn: &mut SqliteConnection,
    provider_id: &str,
    category_ids: &[String],
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM provider_categories WHERE provider_id = ?")
        .bind(provider_id)
        .execute(&mut *conn)
        .await
        .map_err(ApiError::DatabaseError)?;

    for category_id in category_ids {
        sqlx::query("INSERT INTO provider_categories (provider_id, category_id) VALUES (?, ?)")
            .bind(provider_id)
            .bind(category_id)
            .execute(&mut *conn)
            .await
            .map_err(ApiError::DatabaseError)?;
    }

    Ok(())
}

/// Digits only; empty input is stored as NULL
pub fn normalize_whatsapp(value: Option<&str>) -> Option<String> {
    value.map(digits_only).filter(|d| !d.is_empty())
}

/// `%value%` with LIKE wildcards in the input escaped
pub fn like_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', r"\\")
        .replace('%', r"\%")
        .replace('_', r"\_");
    format!("%{}%", escaped)
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
