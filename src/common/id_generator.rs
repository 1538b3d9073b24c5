// src/common/id_generator.rs
//! Crockford Base32 ID Generator
//!
//! Generates human-readable, prefixed IDs using Crockford Base32 encoding.
//! Format: PREFIX_XXXXXX (e.g., P_K7NP3X for provider profiles)

use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy)]
pub enum EntityPrefix {
    /// User account (U_)
    User,
    /// Provider profile (P_)
    Provider,
    /// Service category (C_)
    Category,
    /// Portfolio image (G_) - G for Gallery
    PortfolioImage,
    /// Review (R_)
    Review,
    /// Favorite (F_)
    Favorite,
    /// Verification document (D_)
    Document,
    /// Email-link token (K_) - K for Key
    Token,
}

impl EntityPrefix {
    /// Get the string prefix for this entity type
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::User => "U",
            EntityPrefix::Provider => "P",
            EntityPrefix::Category => "C",
            EntityPrefix::PortfolioImage => "G",
            EntityPrefix::Review => "R",
            EntityPrefix::Favorite => "F",
            EntityPrefix::Document => "D",
            EntityPrefix::Token => "K",
        }
    }
}

/// Generate a random Crockford Base32 string of specified length
fn generate_crockford_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..32);
            CROCKFORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Generate a prefixed ID ("PREFIX_XXXXXXXX")
pub fn generate_id(prefix: EntityPrefix) -> String {
    format!("{}_{}", prefix.as_str(), generate_crockford_string(8))
}

pub fn generate_user_id() -> String {
    generate_id(EntityPrefix::User)
}

pub fn generate_provider_id() -> String {
    generate_id(EntityPrefix::Provider)
}

pub fn generate_category_id() -> String {
    generate_id(EntityPrefix::Category)
}

pub fn generate_portfolio_image_id() -> String {
    generate_id(EntityPrefix::PortfolioImage)
}

pub fn generate_review_id() -> String {
    generate_id(EntityPrefix::Review)
}

pub fn generate_favorite_id() -> String {
    generate_id(EntityPrefix::Favorite)
}

pub fn generate_document_id() -> String {
    generate_id(EntityPrefix::Document)
}

pub fn generate_token_id() -> String {
    generate_id(EntityPrefix::Token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_id_format() {
        let provider_id = generate_provider_id();
        assert!(provider_id.starts_with("P_"));
        assert_eq!(provider_id.len(), 10);
    }

    #[test]
    fn test_crockford_alphabet_only() {
        let id = generate_review_id();
        for c in id[2..].chars() {
            assert!(
                CROCKFORD_ALPHABET.contains(&(c as u8)),
                "Character '{}' not in Crockford alphabet",
                c
            );
        }
    }

    #[test]
    fn test_uniqueness() {
        let mut ids = HashSet::new();
        for _ in 0..1000 {
            assert!(ids.insert(generate_favorite_id()), "Duplicate ID generated");
        }
    }

    #[test]
    fn test_all_prefixes() {
        assert!(generate_user_id().starts_with("U_"));
        assert!(generate_provider_id().starts_with("P_"));
        assert!(generate_category_id().starts_with("C_"));
        assert!(generate_portfolio_image_id().starts_with("G_"));
        assert!(generate_review_id().starts_with("R_"));
        assert!(generate_favorite_id().starts_with("F_"));
        assert!(generate_document_id().starts_with("D_"));
        assert!(generate_token_id().starts_with("K_"));
    }
}
