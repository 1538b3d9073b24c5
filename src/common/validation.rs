// Common validation types and traits

use super::error::ApiError;

#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.is_valid = false;
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Converts into `Err(ApiError::ValidationError)` when any error was recorded
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_valid {
            Ok(())
        } else {
            Err(self.into())
        }
    }
}

pub trait Validator<T> {
    fn validate(&self, data: &T) -> ValidationResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_is_ok() {
        assert!(ValidationResult::new().into_result().is_ok());
    }

    #[test]
    fn test_errors_join_into_message() {
        let mut result = ValidationResult::new();
        result.add_error("city", "Informe sua cidade.");
        result.add_error("rating", "Selecione uma nota.");
        assert!(result.has_error("city"));
        assert!(!result.has_error("whatsapp"));

        match result.into_result() {
            Err(ApiError::ValidationError(msg)) => {
                assert_eq!(msg, "city: Informe sua cidade., rating: Selecione uma nota.");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
