//! # Verification Module
//!
//! Identity verification for providers: the provider uploads an identity
//! document and a selfie, an admin approves or rejects them, and approval
//! sets the verified badge.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state_machine;


pub use routes::verification_routes;
