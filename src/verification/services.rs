// src/verification/services.rs

use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::models::*;
use super::state_machine::{transition, VerificationAction, VerificationStatus};
use crate::common::{generate_document_id, now_rfc3339, ApiError};
use crate::providers::ProviderProfile;
use crate::services::storage::{validate_image_upload, Bucket, StorageService};

/// A document file already written to storage, waiting for its row
struct StoredDocument {
    id: String,
    document_type: DocumentType,
    path: String,
}

pub struct VerificationService {
    db: SqlitePool,
    storage: Arc<StorageService>,
    signed_url_ttl_secs: i64,
}

impl VerificationService {
    pub fn new(db: SqlitePool, storage: Arc<StorageService>, signed_url_ttl_secs: i64) -> Self {
        Self {
            db,
            storage,
            signed_url_ttl_secs,
        }
    }

    pub async fn documents_for(&self, provider_id: &str) -> Result<Vec<VerificationDocument>, ApiError> {
        sqlx::query_as::<_, VerificationDocument>(
            r#"
            SELECT id, provider_id, document_type, document_url, status, created_at, reviewed_at
            FROM verification_documents
            WHERE provider_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(provider_id)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::DatabaseError)
    }

    pub async fn status(&self, profile: &ProviderProfile) -> Result<VerificationStatusResponse, ApiError> {
        Ok(VerificationStatusResponse {
            verification_status: profile.verification_status.clone(),
            is_verified: profile.is_verified,
            verified_at: profile.verified_at.clone(),
            documents: self.documents_for(&profile.id).await?,
        })
    }

    /// Store identity and selfie, then record both documents and move the profile to pending
    ///
    /// Files are written first; if the transaction fails they are deleted again.
    pub async fn submit(
        &self,
        user_id: &str,
        profile: &ProviderProfile,
        identity: &[u8],
        selfie: &[u8],
    ) -> Result<Vec<VerificationDocument>, ApiError> {
        let current = VerificationStatus::parse(&profile.verification_status)?;
        transition(current, VerificationAction::Submit)?;

        let identity_kind = validate_image_upload(identity)?;
        let selfie_kind = validate_image_upload(selfie)?;

        let millis = Utc::now().timestamp_millis();
        let uploads = [
            (DocumentType::Identity, identity, identity_kind.extension),
            (DocumentType::Selfie, selfie, selfie_kind.extension),
        ];

        let mut stored: Vec<StoredDocument> = Vec::with_capacity(uploads.len());
        for (document_type, data, extension) in uploads {
            let id = generate_document_id();
            let path = format!(
                "{}/{}/{}-{}-{}.{}",
                user_id,
                profile.id,
                document_type.as_str(),
                millis,
                id,
                extension
            );
            if let Err(e) = self.storage.upload(Bucket::Verifications, &path, data).await {
                self.discard(&stored).await;
                return Err(e.into());
            }
            stored.push(StoredDocument {
                id,
                document_type,
                path,
            });
        }

        match self.record_submission(&profile.id, current, &stored).await {
            Ok(documents) => {
                info!(
                    user_id = %user_id,
                    provider_id = %profile.id,
                    "Verification submitted"
                );
                Ok(documents)
            }
            Err(e) => {
                self.discard(&stored).await;
                Err(e)
            }
        }
    }

    async fn record_submission(
        &self,
        provider_id: &str,
        current: VerificationStatus,
        stored: &[StoredDocument],
    ) -> Result<Vec<VerificationDocument>, ApiError> {
        let now = now_rfc3339();
        let mut tx = self.db.begin().await.map_err(ApiError::DatabaseError)?;

        let updated = sqlx::query(
            r#"
            UPDATE provider_profiles
            SET verification_status = ?, updated_at = ?
            WHERE id = ? AND verification_status = ?
            "#,
        )
        .bind(VerificationStatus::Pending.as_str())
        .bind(&now)
        .bind(provider_id)
        .bind(current.as_str())
        .execute(&mut *tx)
        .await
        .map_err(ApiError::DatabaseError)?;

        if updated.rows_affected() == 0 {
            return Err(ApiError::Conflict(
                "O status da verificação mudou. Recarregue a página.".to_string(),
            ));
        }

        let mut documents = Vec::with_capacity(stored.len());
        for file in stored {
            let document = VerificationDocument {
                id: file.id.clone(),
                provider_id: provider_id.to_string(),
                document_type: file.document_type.as_str().to_string(),
                document_url: file.path.clone(),
                status: VerificationStatus::Pending.as_str().to_string(),
                created_at: now.clone(),
                reviewed_at: None,
            };

            sqlx::query(
                r#"
                INSERT INTO verification_documents (id, provider_id, document_type, document_url, status, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&document.id)
            .bind(&document.provider_id)
            .bind(&document.document_type)
            .bind(&document.document_url)
            .bind(&document.status)
            .bind(&document.created_at)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::DatabaseError)?;

            documents.push(document);
        }

        tx.commit().await.map_err(ApiError::DatabaseError)?;
        Ok(documents)
    }

    async fn discard(&self, stored: &[StoredDocument]) {
        if stored.is_empty() {
            return;
        }
        let paths: Vec<String> = stored.iter().map(|f| f.path.clone()).collect();
        if let Err(e) = self.storage.remove(Bucket::Verifications, &paths).await {
            error!(error = %e, "Failed to remove verification files after failed submission");
        } else {
            warn!(files = paths.len(), "Verification files removed after failed submission");
        }
    }

    // ============================================================================
    // Admin
    // ============================================================================

    /// All documents newest first, grouped by provider, with signed file links
    pub async fn admin_list(&self) -> Result<AdminVerificationList, ApiError> {
        let rows = sqlx::query_as::<_, AdminDocumentRow>(
            r#"
            SELECT d.id, d.provider_id, d.document_type, d.document_url, d.status,
                   d.created_at, d.reviewed_at,
                   p.verification_status, u.full_name, u.email, u.avatar_url
            FROM verification_documents d
            JOIN provider_profiles p ON p.id = d.provider_id
            JOIN users u ON u.id = p.user_id
            ORDER BY d.created_at DESC, d.id DESC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        let mut providers: Vec<AdminVerificationEntry> = Vec::new();
        for row in rows {
            let signed_url = match self.storage.create_signed_url(
                Bucket::Verifications,
                &row.document_url,
                self.signed_url_ttl_secs,
            ) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(document_id = %row.id, error = %e, "Could not sign verification file");
                    None
                }
            };

            let document = AdminDocument {
                id: row.id,
                document_type: row.document_type,
                status: row.status,
                created_at: row.created_at,
                reviewed_at: row.reviewed_at,
                signed_url,
            };

            match providers.iter_mut().find(|p| p.provider_id == row.provider_id) {
                Some(entry) => entry.documents.push(document),
                None => providers.push(AdminVerificationEntry {
                    provider_id: row.provider_id,
                    full_name: row.full_name,
                    email: row.email,
                    avatar_url: row.avatar_url,
                    verification_status: row.verification_status,
                    documents: vec![document],
                }),
            }
        }

        let (pending_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM provider_profiles WHERE verification_status = 'pending'",
        )
        .fetch_one(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        Ok(AdminVerificationList {
            providers,
            pending_count,
        })
    }

    /// Approve or reject a pending verification in one transaction
    ///
    /// Only the provider's pending documents whose ids are listed are updated.
    pub async fn review(
        &self,
        admin_id: &str,
        provider_id: &str,
        action: VerificationAction,
        document_ids: &[String],
    ) -> Result<ReviewDecisionResponse, ApiError> {
        let mut ids: Vec<String> = document_ids
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        ids.sort();
        ids.dedup();
        if ids.is_empty() {
            return Err(ApiError::ValidationError(
                "Nenhum documento selecionado.".to_string(),
            ));
        }

        let profile: Option<(String,)> =
            sqlx::query_as("SELECT verification_status FROM provider_profiles WHERE id = ?")
                .bind(provider_id)
                .fetch_optional(&self.db)
                .await
                .map_err(ApiError::DatabaseError)?;
        let (status,) =
            profile.ok_or_else(|| ApiError::NotFound("Prestador não encontrado.".to_string()))?;

        let from = VerificationStatus::parse(&status)?;
        let next = transition(from, action)?;

        let now = now_rfc3339();
        let mut tx = self.db.begin().await.map_err(ApiError::DatabaseError)?;

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            r#"
            UPDATE verification_documents
            SET status = ?, reviewed_at = ?
            WHERE provider_id = ? AND status = 'pending' AND id IN ({})
            "#,
            placeholders
        );
        let mut query = sqlx::query(&sql)
            .bind(next.as_str())
            .bind(&now)
            .bind(provider_id);
        for id in &ids {
            query = query.bind(id);
        }
        let documents_updated = query
            .execute(&mut *tx)
            .await
            .map_err(ApiError::DatabaseError)?
            .rows_affected();

        if documents_updated == 0 {
            return Err(ApiError::ValidationError(
                "Nenhum documento pendente encontrado para este prestador.".to_string(),
            ));
        }

        let (is_verified, verified_at) = match next {
            VerificationStatus::Approved => (true, Some(now.clone())),
            _ => (false, None),
        };

        let updated = sqlx::query(
            r#"
            UPDATE provider_profiles
            SET verification_status = ?, is_verified = ?, verified_at = ?, updated_at = ?
            WHERE id = ? AND verification_status = ?
            "#,
        )
        .bind(next.as_str())
        .bind(is_verified)
        .bind(&verified_at)
        .bind(&now)
        .bind(provider_id)
        .bind(from.as_str())
        .execute(&mut *tx)
        .await
        .map_err(ApiError::DatabaseError)?;

        if updated.rows_affected() == 0 {
            return Err(ApiError::Conflict(
                "O status da verificação mudou. Recarregue a página.".to_string(),
            ));
        }

        tx.commit().await.map_err(ApiError::DatabaseError)?;

        info!(
            admin_id = %admin_id,
            provider_id = %provider_id,
            status = %next,
            documents = documents_updated,
            "Verification reviewed"
        );

        Ok(ReviewDecisionResponse {
            provider_id: provider_id.to_string(),
            verification_status: next.as_str().to_string(),
            documents_updated,
        })
    }
}
