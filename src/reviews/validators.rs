// src/reviews/validators.rs

use super::models::{SubmitReviewRequest, MAX_COMMENT_LEN};
use crate::common::{ValidationResult, Validator};

pub struct ReviewValidator;

impl Validator<SubmitReviewRequest> for ReviewValidator {
    fn validate(&self, data: &SubmitReviewRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if !(1..=5).contains(&data.rating) {
            result.add_error("rating", "Selecione uma nota.");
        }

        if let Some(comment) = &data.comment {
            if comment.trim().chars().count() > MAX_COMMENT_LEN {
                result.add_error(
                    "comment",
                    "O comentário deve ter no máximo 1000 caracteres.",
                );
            }
        }

        result
    }
}
