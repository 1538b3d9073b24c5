// src/auth/validators.rs

use super::models::*;
use crate::common::{ValidationResult, Validator};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_FULL_NAME_LEN: usize = 3;

pub struct AccountValidator;

impl Validator<SignUpRequest> for AccountValidator {
    fn validate(&self, data: &SignUpRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.full_name.trim().chars().count() < MIN_FULL_NAME_LEN {
            result.add_error(
                "full_name",
                "Informe seu nome completo (mínimo 3 caracteres).",
            );
        }

        if !is_valid_email(&data.email) {
            result.add_error("email", "Informe um email válido.");
        }

        if data.password.chars().count() < MIN_PASSWORD_LEN {
            result.add_error("password", "A senha deve ter no mínimo 6 caracteres.");
        }

        if let Some(role) = &data.role {
            if role != ROLE_CLIENT && role != ROLE_PROVIDER {
                result.add_error("role", "Tipo de conta inválido.");
            }
        }

        result
    }
}

impl Validator<SignInRequest> for AccountValidator {
    fn validate(&self, data: &SignInRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.email.trim().is_empty() {
            result.add_error("email", "Informe seu email.");
        }
        if data.password.is_empty() {
            result.add_error("password", "Informe sua senha.");
        }

        result
    }
}

impl Validator<ResetPasswordRequest> for AccountValidator {
    fn validate(&self, data: &ResetPasswordRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        if data.password.chars().count() < MIN_PASSWORD_LEN {
            result.add_error("password", "A senha deve ter no mínimo 6 caracteres.");
        }
        result
    }
}

impl Validator<UpdateMeRequest> for AccountValidator {
    fn validate(&self, data: &UpdateMeRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.full_name.is_none() && data.avatar_url.is_none() {
            result.add_error("body", "Nenhum campo para atualizar.");
        }

        if let Some(name) = &data.full_name {
            if name.trim().is_empty() {
                result.add_error("full_name", "O nome é obrigatório.");
            } else if name.len() > 120 {
                result.add_error("full_name", "Nome muito longo.");
            }
        }

        if let Some(url) = &data.avatar_url {
            if url.len() > 2048 {
                result.add_error("avatar_url", "URL do avatar muito longa.");
            }
        }

        result
    }
}

/// Minimal shape check: one `@`, non-empty local part, dotted domain
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.len() > 254 || email.contains(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
