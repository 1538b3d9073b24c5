// src/providers/search.rs
//! In-memory search pipeline over the active-provider list
//!
//! drop orphans -> filter (category, free text) -> stable sort -> paginate.
//! City and neighborhood filters are applied by the SQL fetch beforehand.

use std::cmp::Ordering;

use super::models::{ProviderWithDetails, SearchQuery, SearchResponse};

pub const DEFAULT_PAGE_SIZE: u32 = 12;
pub const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// created_at descending
    #[default]
    Recent,
    /// average_rating descending, unrated providers count as 0
    Rating,
}

impl SortOrder {
    /// "avaliacao"/"rating" select rating order; anything else is recency
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("avaliacao") | Some("rating") => SortOrder::Rating,
            _ => SortOrder::Recent,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub category: Option<String>,
    pub text: Option<String>,
    pub sort: SortOrder,
}

impl SearchFilters {
    pub fn from_query(query: &SearchQuery) -> Self {
        Self {
            category: non_empty(query.category.as_deref()),
            text: non_empty(query.q.as_deref()),
            sort: SortOrder::parse(query.sort.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// Page below 1 clamps to 1; page size defaults to 12 and clamps to [1, 50]
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = page.unwrap_or(1).clamp(1, u32::MAX as i64) as u32;
        let page_size = page_size
            .unwrap_or(DEFAULT_PAGE_SIZE as i64)
            .clamp(1, MAX_PAGE_SIZE as i64) as u32;
        Self { page, page_size }
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.page_size as usize)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Providers without a resolvable user are never shown
pub fn drop_orphans(providers: Vec<ProviderWithDetails>) -> Vec<ProviderWithDetails> {
    providers.into_iter().filter(|p| p.user.is_some()).collect()
}

pub fn matches_category(provider: &ProviderWithDetails, slug: &str) -> bool {
    provider.categories.iter().any(|c| c.slug == slug)
}

/// Case-insensitive substring over name, description and category names
pub fn matches_text(provider: &ProviderWithDetails, needle_lower: &str) -> bool {
    let contains = |haystack: &str| haystack.to_lowercase().contains(needle_lower);

    contains(provider.display_name())
        || provider.description.as_deref().map_or(false, contains)
        || provider.categories.iter().any(|c| contains(&c.name))
}

pub fn apply_filters(
    providers: Vec<ProviderWithDetails>,
    filters: &SearchFilters,
) -> Vec<ProviderWithDetails> {
    let needle = filters.text.as_ref().map(|t| t.to_lowercase());

    providers
        .into_iter()
        .filter(|p| {
            filters
                .category
                .as_deref()
                .map_or(true, |slug| matches_category(p, slug))
        })
        .filter(|p| needle.as_deref().map_or(true, |n| matches_text(p, n)))
        .collect()
}

/// Stable sort; ties keep their incoming order
pub fn sort_providers(providers: &mut [ProviderWithDetails], order: SortOrder) {
    match order {
        SortOrder::Recent => providers.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::Rating => providers.sort_by(|a, b| {
            let a_rating = a.average_rating.unwrap_or(0.0);
            let b_rating = b.average_rating.unwrap_or(0.0);
            b_rating.partial_cmp(&a_rating).unwrap_or(Ordering::Equal)
        }),
    }
}

pub fn paginate(providers: Vec<ProviderWithDetails>, pagination: Pagination) -> SearchResponse {
    let total = providers.len();
    let page_size = pagination.page_size as usize;
    let total_pages = ((total + page_size - 1) / page_size) as u32;

    let page_items = providers
        .into_iter()
        .skip(pagination.offset())
        .take(page_size)
        .collect();

    SearchResponse {
        providers: page_items,
        total,
        page: pagination.page,
        page_size: pagination.page_size,
        total_pages,
    }
}

/// Full pipeline over an already-fetched active-provider list
pub fn search(
    providers: Vec<ProviderWithDetails>,
    filters: &SearchFilters,
    pagination: Pagination,
) -> SearchResponse {
    let mut matching = apply_filters(drop_orphans(providers), filters);
    sort_providers(&mut matching, filters.sort);
    paginate(matching, pagination)
}
