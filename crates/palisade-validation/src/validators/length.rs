//! String length bounds validator

use crate::error::{ValidationError, ValidationResult};
use crate::validators::ValidationRule;
use async_trait::async_trait;
use serde_json::Value;

/// Validator that bounds the character length of a string field.
///
/// Non-string scalars are measured by their display form, matching how form
/// payloads arrive as strings anyway. Null values pass; pair with
/// [`RequiredValidator`](crate::RequiredValidator) to also demand presence.
#[derive(Debug, Clone, Default)]
pub struct LengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
    /// Custom error message
    pub message: Option<String>,
}

impl LengthValidator {
    pub fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Self {
            min,
            max,
            message: None,
        }
    }

    pub fn min(min: usize) -> Self {
        Self::new(Some(min), None)
    }

    pub fn max(max: usize) -> Self {
        Self::new(None, Some(max))
    }

    pub fn between(min: usize, max: usize) -> Self {
        Self::new(Some(min), Some(max))
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn measured_length(value: &Value) -> Option<usize> {
        match value {
            Value::String(s) => Some(s.chars().count()),
            Value::Number(n) => Some(n.to_string().chars().count()),
            Value::Bool(b) => Some(b.to_string().len()),
            _ => None,
        }
    }
}

#[async_trait]
impl ValidationRule for LengthValidator {
    async fn validate(&self, value: &Value, field: &str) -> ValidationResult<()> {
        if value.is_null() {
            return Ok(());
        }

        let length = match Self::measured_length(value) {
            Some(length) => length,
            None => {
                return Err(ValidationError::with_code(
                    field,
                    format!("{} must be a string for length validation", field),
                    "invalid_type",
                )
                .into());
            }
        };

        if let Some(min) = self.min {
            if length < min {
                let message = self.message.clone().unwrap_or_else(|| {
                    format!("{} must be at least {} characters", field, min)
                });
                return Err(ValidationError::with_code(field, message, "too_short").into());
            }
        }

        if let Some(max) = self.max {
            if length > max {
                let message = self.message.clone().unwrap_or_else(|| {
                    format!("{} must be no more than {} characters", field, max)
                });
                return Err(ValidationError::with_code(field, message, "too_long").into());
            }
        }

        Ok(())
    }

    fn rule_name(&self) -> &'static str {
        "length"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_length_bounds() {
        let validator = LengthValidator::between(2, 5);

        assert!(validator
            .validate(&Value::String("abc".into()), "name")
            .await
            .is_ok());
        assert!(validator
            .validate(&Value::String("a".into()), "name")
            .await
            .is_err());
        assert!(validator
            .validate(&Value::String("abcdef".into()), "name")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_length_skips_null() {
        let validator = LengthValidator::min(3);
        assert!(validator.validate(&Value::Null, "name").await.is_ok());
    }

    #[tokio::test]
    async fn test_length_counts_characters_not_bytes() {
        let validator = LengthValidator::max(4);
        assert!(validator
            .validate(&Value::String("日本語".into()), "title")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_length_error_codes() {
        let validator = LengthValidator::between(2, 3);

        let errors = validator
            .validate(&Value::String("a".into()), "sku")
            .await
            .unwrap_err();
        assert_eq!(errors.get_field_errors("sku").unwrap()[0].code, "too_short");

        let errors = validator
            .validate(&Value::String("abcd".into()), "sku")
            .await
            .unwrap_err();
        assert_eq!(errors.get_field_errors("sku").unwrap()[0].code, "too_long");
    }
}
