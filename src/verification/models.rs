// src/verification/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Identity,
    Selfie,
}

impl DocumentType {
    pub const ALL: [DocumentType; 2] = [DocumentType::Identity, DocumentType::Selfie];

    /// Column value and multipart field name
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Identity => "identity",
            DocumentType::Selfie => "selfie",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VerificationDocument {
    pub id: String,
    pub provider_id: String,
    pub document_type: String,
    /// Object key in the private `verifications` bucket
    #[serde(skip_serializing)]
    pub document_url: String,
    pub status: String,
    pub created_at: String,
    pub reviewed_at: Option<String>,
}

/// The caller's own verification state
#[derive(Debug, Serialize)]
pub struct VerificationStatusResponse {
    pub verification_status: String,
    pub is_verified: bool,
    pub verified_at: Option<String>,
    pub documents: Vec<VerificationDocument>,
}

/// Document row joined with its provider and user, for the admin queue
#[derive(Debug, Clone, FromRow)]
pub struct AdminDocumentRow {
    pub id: String,
    pub provider_id: String,
    pub document_type: String,
    pub document_url: String,
    pub status: String,
    pub created_at: String,
    pub reviewed_at: Option<String>,
    pub verification_status: String,
    pub full_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminDocument {
    pub id: String,
    pub document_type: String,
    pub status: String,
    pub created_at: String,
    pub reviewed_at: Option<String>,
    /// Time-limited link to the private file; `None` if signing failed
    pub signed_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminVerificationEntry {
    pub provider_id: String,
    pub full_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub verification_status: String,
    pub documents: Vec<AdminDocument>,
}

#[derive(Debug, Serialize)]
pub struct AdminVerificationList {
    pub providers: Vec<AdminVerificationEntry>,
    pub pending_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct ReviewDecisionRequest {
    #[serde(default)]
    pub document_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewDecisionResponse {
    pub provider_id: String,
    pub verification_status: String,
    pub documents_updated: u64,
}

#[derive(Debug, Deserialize)]
pub struct SignedFileQuery {
    pub token: Option<String>,
}
