// src/providers/validators.rs

use super::models::*;
use crate::common::helpers::digits_only;
use crate::common::{ValidationResult, Validator};

pub const MAX_DESCRIPTION_LEN: usize = 2000;
pub const MAX_LOCATION_LEN: usize = 120;

const WHATSAPP_MESSAGE: &str = "WhatsApp inválido. Informe DDD + número (10 ou 11 dígitos).";
const CATEGORY_MESSAGE: &str = "Selecione pelo menos uma categoria de serviço.";

pub struct ProviderValidator;

impl Validator<BecomeProviderRequest> for ProviderValidator {
    fn validate(&self, data: &BecomeProviderRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.city.trim().is_empty() {
            result.add_error("city", "Informe sua cidade.");
        }
        validate_location(&mut result, "city", Some(&data.city));
        validate_location(&mut result, "neighborhood", data.neighborhood.as_deref());
        validate_description(&mut result, data.description.as_deref());
        validate_whatsapp(&mut result, data.whatsapp.as_deref());

        if data.category_ids.iter().all(|id| id.trim().is_empty()) {
            result.add_error("category_ids", CATEGORY_MESSAGE);
        }

        result
    }
}

impl Validator<UpdateProviderRequest> for ProviderValidator {
    fn validate(&self, data: &UpdateProviderRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        let nothing_to_update = data.description.is_none()
            && data.neighborhood.is_none()
            && data.city.is_none()
            && data.whatsapp.is_none()
            && data.is_active.is_none()
            && data.category_ids.is_none();
        if nothing_to_update {
            result.add_error("body", "Nenhum campo para atualizar.");
        }

        if let Some(city) = &data.city {
            if city.trim().is_empty() {
                result.add_error("city", "Informe sua cidade.");
            }
        }
        validate_location(&mut result, "city", data.city.as_deref());
        validate_location(&mut result, "neighborhood", data.neighborhood.as_deref());
        validate_description(&mut result, data.description.as_deref());
        validate_whatsapp(&mut result, data.whatsapp.as_deref());

        if let Some(ids) = &data.category_ids {
            if ids.iter().all(|id| id.trim().is_empty()) {
                result.add_error("category_ids", CATEGORY_MESSAGE);
            }
        }

        result
    }
}

impl Validator<ReplaceCategoriesRequest> for ProviderValidator {
    fn validate(&self, data: &ReplaceCategoriesRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        if data.category_ids.iter().all(|id| id.trim().is_empty()) {
            result.add_error("category_ids", CATEGORY_MESSAGE);
        }
        result
    }
}

/// Empty is allowed; otherwise 10 or 11 digits once formatting is stripped
pub fn is_valid_whatsapp(value: &str) -> bool {
    let digits = digits_only(value);
    digits.is_empty() || (10..=11).contains(&digits.len())
}

fn validate_whatsapp(result: &mut ValidationResult, value: Option<&str>) {
    if let Some(value) = value {
        if !is_valid_whatsapp(value) {
            result.add_error("whatsapp", WHATSAPP_MESSAGE);
        }
    }
}

fn validate_description(result: &mut ValidationResult, value: Option<&str>) {
    if let Some(value) = value {
        if value.chars().count() > MAX_DESCRIPTION_LEN {
            result.add_error(
                "description",
                "A descrição deve ter no máximo 2000 caracteres.",
            );
        }
    }
}

fn validate_location(result: &mut ValidationResult, field: &str, value: Option<&str>) {
    if let Some(value) = value {
        if value.chars().count() > MAX_LOCATION_LEN {
            result.add_error(field, "Texto muito longo.");
        }
    }
}

/// Trimmed, de-duplicated category ids in first-seen order
pub fn normalize_category_ids(ids: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.to_string()))
        .map(str::to_string)
        .collect()
}
