// src/categories/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryGroup {
    pub slug: String,
    pub name: String,
    pub categories: Vec<Category>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CategoryQuery {
    #[serde(alias = "busca")]
    pub q: Option<String>,
}
