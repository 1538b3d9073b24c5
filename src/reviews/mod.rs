//! # Reviews Module
//!
//! Star ratings (1 to 5) with an optional comment, one per client per
//! provider. Averages come from the `provider_ratings` view.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod validators;


pub use models::ReviewWithClient;
pub use routes::reviews_routes;
