// Multipart form reading shared by the image upload handlers

use axum::extract::Multipart;
use axum::http::StatusCode;
use std::collections::HashMap;

use super::ApiError;

/// Request body limit for a single-image form (5 MB image plus form overhead)
pub const SINGLE_IMAGE_BODY_LIMIT: usize = 6 * 1024 * 1024;
/// Request body limit for the two-image verification form
pub const DOUBLE_IMAGE_BODY_LIMIT: usize = 11 * 1024 * 1024;

/// Collect the named file fields; other fields are read and discarded
pub async fn read_file_fields(
    multipart: &mut Multipart,
    wanted: &[&str],
) -> Result<HashMap<String, Vec<u8>>, ApiError> {
    let mut files = HashMap::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_error(e.status(), &e.body_text())),
        };

        let name = field.name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e.status(), &e.body_text()))?;

        if wanted.contains(&name.as_str()) {
            files.insert(name, data.to_vec());
        }
    }

    Ok(files)
}

fn multipart_error(status: StatusCode, detail: &str) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::ValidationError("A imagem deve ter no máximo 5 MB.".to_string())
    } else {
        ApiError::BadRequest(format!("Formulário inválido: {}", detail))
    }
}
