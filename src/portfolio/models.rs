// src/portfolio/models.rs

use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PortfolioImage {
    pub id: String,
    pub provider_id: String,
    pub image_url: String,
    /// Object key inside the `portfolio` bucket
    #[serde(skip_serializing)]
    pub storage_path: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
