// src/logging_middleware.rs
//! Debug-level logging of JSON request and response bodies
//!
//! Only `application/json` bodies are buffered and logged. Multipart uploads
//! and file downloads pass through untouched. Credential fields are redacted.

use axum::body::to_bytes;
use axum::{
    body::Body,
    extract::Request,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use tracing::debug;

/// JSON bodies above this size are passed through without logging
const MAX_LOGGED_BODY: usize = 64 * 1024;

const REDACTED_KEYS: &[&str] = &["password", "token", "access_token", "token_hash"];

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |ct| ct.starts_with("application/json"))
}

/// Replace credential values anywhere in the document
pub fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map.iter_mut() {
                if REDACTED_KEYS.contains(&key.to_lowercase().as_str()) {
                    *inner = Value::String("[redacted]".to_string());
                } else {
                    redact(inner);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}

fn render(bytes: &[u8]) -> Option<String> {
    let mut json: Value = serde_json::from_slice(bytes).ok()?;
    redact(&mut json);
    serde_json::to_string(&json).ok()
}

pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return Ok(next.run(request).await);
    }

    let request = if is_json(request.headers()) {
        let (parts, body) = request.into_parts();
        let bytes = to_bytes(body, usize::MAX)
            .await
            .map_err(|_| StatusCode::BAD_REQUEST)?;

        if bytes.len() <= MAX_LOGGED_BODY {
            if let Some(rendered) = render(&bytes) {
                debug!(
                    method = %parts.method,
                    uri = %parts.uri.path(),
                    request_body = %rendered,
                    "Request"
                );
            }
        }
        Request::from_parts(parts, Body::from(bytes))
    } else {
        request
    };

    let response = next.run(request).await;
    if !is_json(response.headers()) {
        return Ok(response);
    }

    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if bytes.len() <= MAX_LOGGED_BODY {
        if let Some(rendered) = render(&bytes) {
            debug!(status = %parts.status, response_body = %rendered, "Response");
        }
    }

    Ok(Response::from_parts(parts, Body::from(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redact_nested_credentials() {
        let mut body = json!({
            "email": "ana@example.com",
            "password": "segredo123",
            "session": { "token": "abc.def.ghi", "user": { "id": "U_1" } },
            "items": [{ "Password": "x" }]
        });
        redact(&mut body);

        assert_eq!(body["email"], "ana@example.com");
        assert_eq!(body["password"], "[redacted]");
        assert_eq!(body["session"]["token"], "[redacted]");
        assert_eq!(body["session"]["user"]["id"], "U_1");
        assert_eq!(body["items"][0]["Password"], "[redacted]");
    }

    #[test]
    fn test_only_json_content_type_is_logged() {
        let mut headers = HeaderMap::new();
        assert!(!is_json(&headers));
        headers.insert(CONTENT_TYPE, "multipart/form-data; boundary=x".parse().unwrap());
        assert!(!is_json(&headers));
        headers.insert(CONTENT_TYPE, "application/json; charset=utf-8".parse().unwrap());
        assert!(is_json(&headers));
        assert!(render(b"not json").is_none());
    }
}
