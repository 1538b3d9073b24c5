//! # Favorites Module
//!
//! Clients bookmark providers; one row per (user, provider) pair.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;


pub use routes::favorites_routes;
