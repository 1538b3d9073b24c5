// src/favorites/models.rs

use serde::Serialize;

#[derive(Debug, Serialize, PartialEq)]
pub struct FavoriteStatus {
    pub provider_id: String,
    pub favorited: bool,
}
