// src/reviews/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const MAX_COMMENT_LEN: usize = 1000;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Review {
    pub id: String,
    pub provider_id: String,
    pub client_id: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReviewClient {
    pub full_name: String,
    pub avatar_url: Option<String>,
}

/// Review with the reviewer's public name and avatar
#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithClient {
    pub id: String,
    pub provider_id: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
    pub client: Option<ReviewClient>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReviewListingRow {
    pub id: String,
    pub provider_id: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
    pub client_full_name: Option<String>,
    pub client_avatar_url: Option<String>,
}

impl From<ReviewListingRow> for ReviewWithClient {
    fn from(row: ReviewListingRow) -> Self {
        let client = row.client_full_name.map(|full_name| ReviewClient {
            full_name,
            avatar_url: row.client_avatar_url,
        });
        Self {
            id: row.id,
            provider_id: row.provider_id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
            client,
        }
    }
}

/// `rating` 0 means no star was chosen
#[derive(Debug, Deserialize)]
pub struct SubmitReviewRequest {
    #[serde(default)]
    pub rating: i64,
    pub comment: Option<String>,
}
