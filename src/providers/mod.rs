//! # Providers Module
//!
//! Provider profiles and the public directory:
//! - Search with category/city/neighborhood/text filters, sorting and pagination
//! - Provider detail with portfolio, reviews and WhatsApp link
//! - Becoming a provider and managing the own profile and categories
//! - CEP and geocoding lookups used by the profile form

pub mod handlers;
pub mod models;
pub mod routes;
pub mod search;
pub mod services;
pub mod validators;

#[cfg(test)]
mod tests;

pub use models::{ProviderProfile, ProviderWithDetails};
pub use routes::providers_routes;
