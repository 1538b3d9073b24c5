// src/services/mod.rs
//
// Shared services used across domain modules: object storage,
// postal-code lookups and Google sign-in.

pub mod cep;
pub mod google;
pub mod storage;

// Re-export commonly used types for convenience
pub use cep::CepService;
pub use google::GoogleService;
pub use storage::{Bucket, StorageService};
