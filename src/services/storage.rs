// src/services/storage.rs
//
// Local object storage with two buckets:
// - `portfolio`: public-read images served under /api/storage/portfolio/
// - `verifications`: private documents, readable only through signed URLs

use chrono::Utc;
use infer::Infer;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs as tokio_fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::common::ApiError;

/// Upload size limit for portfolio images and verification documents: 5MB
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Signed URL expired")]
    Expired,

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Portfolio,
    Verifications,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Portfolio => "portfolio",
            Bucket::Verifications => "verifications",
        }
    }
}

/// Image type detected from magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageKind {
    pub mime_type: &'static str,
    pub extension: &'static str,
}

/// Sniff the payload and accept JPEG, PNG, GIF and WebP only
pub fn detect_image(data: &[u8]) -> Option<ImageKind> {
    let infer = Infer::new();
    let info = infer.get(data)?;
    let extension = match info.mime_type() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => return None,
    };
    Some(ImageKind {
        mime_type: info.mime_type(),
        extension,
    })
}

/// Reject empty, oversized and non-image payloads before anything is stored
pub fn validate_image_upload(data: &[u8]) -> Result<ImageKind, ApiError> {
    if data.is_empty() {
        return Err(ApiError::ValidationError("Selecione uma imagem.".to_string()));
    }
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::ValidationError(
            "A imagem deve ter no máximo 5 MB.".to_string(),
        ));
    }
    detect_image(data).ok_or_else(|| {
        ApiError::ValidationError(
            "Formato não suportado. Envie uma imagem JPG, PNG, GIF ou WebP.".to_string(),
        )
    })
}

pub fn content_type_for(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SignedObjectClaims {
    bucket: String,
    path: String,
    exp: usize,
}

#[derive(Debug)]
pub struct StorageService {
    root: PathBuf,
    signing_secret: String,
}

impl StorageService {
    pub fn new(root: impl Into<PathBuf>, signing_secret: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            signing_secret: signing_secret.into(),
        }
    }

    /// Create the bucket directories
    pub async fn init(&self) -> Result<(), StorageError> {
        for bucket in [Bucket::Portfolio, Bucket::Verifications] {
            tokio_fs::create_dir_all(self.root.join(bucket.as_str())).await?;
        }
        info!(root = %self.root.display(), "Storage buckets ready");
        Ok(())
    }

    /// Map an object key to a file inside the bucket directory
    ///
    /// Keys are `/`-separated segments of `[A-Za-z0-9._-]`, never `.` or `..`.
    pub fn resolve(&self, bucket: Bucket, object_path: &str) -> Result<PathBuf, StorageError> {
        if object_path.is_empty() || object_path.len() > 512 {
            return Err(StorageError::InvalidPath(object_path.to_string()));
        }

        let mut resolved = self.root.join(bucket.as_str());
        for segment in object_path.split('/') {
            let valid = !segment.is_empty()
                && segment != "."
                && segment != ".."
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
            if !valid {
                return Err(StorageError::InvalidPath(object_path.to_string()));
            }
            resolved.push(segment);
        }

        Ok(resolved)
    }

    pub async fn upload(
        &self,
        bucket: Bucket,
        object_path: &str,
        data: &[u8],
    ) -> Result<(), StorageError> {
        let file_path = self.resolve(bucket, object_path)?;
        if let Some(parent) = file_path.parent() {
            tokio_fs::create_dir_all(parent).await?;
        }
        // Never overwrite: another row may already point at this object
        let mut file = match tokio_fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file_path)
            .await
        {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                warn!(bucket = bucket.as_str(), path = %object_path, "Refusing to overwrite object");
                return Err(StorageError::AlreadyExists(object_path.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(data).await?;
        file.flush().await?;

        debug!(
            bucket = bucket.as_str(),
            path = %object_path,
            size = data.len(),
            "Stored object"
        );
        Ok(())
    }

    pub async fn read(&self, bucket: Bucket, object_path: &str) -> Result<Vec<u8>, StorageError> {
        let file_path = self.resolve(bucket, object_path)?;
        match tokio_fs::read(&file_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(object_path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[cfg(test)]
    pub async fn exists(&self, bucket: Bucket, object_path: &str) -> bool {
        match self.resolve(bucket, object_path) {
            Ok(path) => tokio_fs::metadata(&path).await.is_ok(),
            Err(_) => false,
        }
    }

    /// Delete objects; missing ones are skipped
    pub async fn remove(&self, bucket: Bucket, object_paths: &[String]) -> Result<(), StorageError> {
        for object_path in object_paths {
            let file_path = self.resolve(bucket, object_path)?;
            match tokio_fs::remove_file(&file_path).await {
                Ok(()) => debug!(bucket = bucket.as_str(), path = %object_path, "Removed object"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(bucket = bucket.as_str(), path = %object_path, "Object already missing");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    pub fn public_url(&self, object_path: &str) -> String {
        format!("/api/storage/{}/{}", Bucket::Portfolio.as_str(), object_path)
    }

    /// Time-limited URL for a private object
    pub fn create_signed_url(
        &self,
        bucket: Bucket,
        object_path: &str,
        ttl_secs: i64,
    ) -> Result<String, StorageError> {
        self.resolve(bucket, object_path)?;

        let exp = (Utc::now().timestamp() + ttl_secs).max(0) as usize;
        let claims = SignedObjectClaims {
            bucket: bucket.as_str().to_string(),
            path: object_path.to_string(),
            exp,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.signing_secret.as_bytes()),
        )
        .map_err(|e| StorageError::Signing(e.to_string()))?;

        Ok(format!(
            "/api/storage/{}/{}?token={}",
            bucket.as_str(),
            object_path,
            token
        ))
    }

    /// Check that `token` was issued for exactly this bucket and path
    pub fn verify_signed_token(
        &self,
        bucket: Bucket,
        object_path: &str,
        token: &str,
    ) -> Result<(), StorageError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let decoded = decode::<SignedObjectClaims>(
            token,
            &DecodingKey::from_secret(self.signing_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => StorageError::Expired,
            _ => StorageError::InvalidSignature,
        })?;

        if decoded.claims.bucket != bucket.as_str() || decoded.claims.path != object_path {
            return Err(StorageError::InvalidSignature);
        }

        Ok(())
    }
}
