//! # Portfolio Module
//!
//! Work photos shown on a provider's public profile, stored in the public
//! `portfolio` bucket and capped at ten per provider.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

#[cfg(test)]
mod tests;

pub use models::PortfolioImage;
pub use routes::portfolio_routes;
