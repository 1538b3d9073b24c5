// Helper functions for safe logging and input normalisation

use chrono::{SecondsFormat, Utc};

/// Default text pre-filled in WhatsApp conversations opened from a profile
pub const WHATSAPP_DEFAULT_MESSAGE: &str =
    "Olá! Encontrei seu perfil no eufaço! e gostaria de um orçamento.";

/// Masks email addresses for safe logging
///
/// # Example
/// ```
/// let masked = safe_email_log("user@example.com");
/// // Returns: "u***@example.com"
/// ```
pub fn safe_email_log(email: &str) -> String {
    if email.len() > 3 {
        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() == 2 && !parts[0].is_empty() {
            let first: String = parts[0].chars().take(1).collect();
            format!("{}***@{}", first, parts[1])
        } else {
            "***@***.***".to_string()
        }
    } else {
        "***@***.***".to_string()
    }
}

/// Keeps only ASCII digits ("(11) 98765-4321" -> "11987654321")
pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Builds a wa.me deep link for a Brazilian phone number
pub fn whatsapp_url(phone: &str, message: Option<&str>) -> String {
    let clean_phone = digits_only(phone);
    let text = message
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(WHATSAPP_DEFAULT_MESSAGE);
    format!(
        "https://wa.me/55{}?text={}",
        clean_phone,
        urlencoding::encode(text)
    )
}

/// Trims a text field and maps blank input to `None`
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Current UTC time as an RFC 3339 string with millisecond precision
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Accepts only site-relative redirect targets ("/home", not "//evil.com")
pub fn safe_redirect_path(next: Option<&str>) -> Option<String> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
        .map(str::to_string)
}
