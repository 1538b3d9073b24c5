//! # Auth Module
//!
//! Accounts and sessions:
//! - Email/password sign-up and sign-in (bcrypt hashes)
//! - Google OAuth sign-in
//! - Email-link confirmation and password recovery tokens
//! - JWT sessions (bearer header or `session` cookie)
//! - `AuthedUser` / `MaybeAuthedUser` extractors for protected routes

pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod validators;

#[cfg(test)]
mod tests;

pub use extractors::{AuthedUser, MaybeAuthedUser};
pub use models::User;
pub use routes::auth_routes;
