// src/categories/mod.rs

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod taxonomy;


pub use models::Category;
pub use routes::categories_routes;
