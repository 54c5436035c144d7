//! Pattern-based validators using regular expressions
//!
//! Covers the declared field types accepted by the API (email, phone, url,
//! alphanumeric, numeric, free text) plus arbitrary custom patterns.

use crate::error::{ValidationError, ValidationResult};
use crate::validators::ValidationRule;
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

/// Validator that matches a string field against a regular expression
#[derive(Debug, Clone)]
pub struct PatternValidator {
    pattern: Regex,
    /// Custom error message
    pub message: Option<String>,
}

impl PatternValidator {
    /// Create a new pattern validator from a regex pattern
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            message: None,
        })
    }

    pub fn from_regex(regex: Regex) -> Self {
        Self {
            pattern: regex,
            message: None,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn pattern_string(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Declared-type constructors for the field types the API accepts
impl PatternValidator {
    pub fn email() -> Self {
        Self::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
            .unwrap()
            .message("Must be a valid email address")
    }

    /// International phone numbers: optional `+`, no leading zero, up to 16 digits
    pub fn phone() -> Self {
        Self::new(r"^\+?[1-9]\d{0,15}$")
            .unwrap()
            .message("Must be a valid phone number")
    }

    pub fn url() -> Self {
        Self::new(r"^https?://.+")
            .unwrap()
            .message("Must be an http or https URL")
    }

    pub fn alphanumeric() -> Self {
        Self::new(r"^[a-zA-Z0-9]+$")
            .unwrap()
            .message("Must contain only letters and numbers")
    }

    pub fn numeric() -> Self {
        Self::new(r"^\d+$")
            .unwrap()
            .message("Must contain only digits")
    }

    /// Free-form text: letters and whitespace
    pub fn text() -> Self {
        Self::new(r"^[a-zA-Z\s]+$")
            .unwrap()
            .message("Must contain only letters and spaces")
    }
}

#[async_trait]
impl ValidationRule for PatternValidator {
    async fn validate(&self, value: &Value, field: &str) -> ValidationResult<()> {
        // Presence is the required validator's concern
        if value.is_null() {
            return Ok(());
        }

        let text = match value.as_str() {
            Some(text) => text,
            None => {
                return Err(ValidationError::with_code(
                    field,
                    format!("{} must be a string for pattern validation", field),
                    "invalid_type",
                )
                .into());
            }
        };

        if !self.pattern.is_match(text) {
            let message = self
                .message
                .clone()
                .unwrap_or_else(|| format!("{} has invalid format", field));
            return Err(ValidationError::with_code(field, message, "pattern_mismatch").into());
        }

        Ok(())
    }

    fn rule_name(&self) -> &'static str {
        "pattern"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn check(validator: &PatternValidator, input: &str) -> bool {
        validator
            .validate(&Value::String(input.to_string()), "field")
            .await
            .is_ok()
    }

    #[tokio::test]
    async fn test_email_pattern() {
        let v = PatternValidator::email();
        assert!(check(&v, "sales@example.com").await);
        assert!(check(&v, "a.b+c@sub.domain.io").await);
        assert!(!check(&v, "not-an-email").await);
        assert!(!check(&v, "spaces in@example.com").await);
    }

    #[tokio::test]
    async fn test_phone_pattern() {
        let v = PatternValidator::phone();
        assert!(check(&v, "+8613912345678").await);
        assert!(check(&v, "15551234567").await);
        assert!(!check(&v, "0123").await);
        assert!(!check(&v, "call me").await);
    }

    #[tokio::test]
    async fn test_url_pattern() {
        let v = PatternValidator::url();
        assert!(check(&v, "https://example.com/page").await);
        assert!(check(&v, "http://example.com").await);
        assert!(!check(&v, "ftp://example.com").await);
    }

    #[tokio::test]
    async fn test_numeric_and_alphanumeric() {
        assert!(check(&PatternValidator::numeric(), "12345").await);
        assert!(!check(&PatternValidator::numeric(), "12a45").await);
        assert!(check(&PatternValidator::alphanumeric(), "SKU42").await);
        assert!(!check(&PatternValidator::alphanumeric(), "SKU-42").await);
    }

    #[tokio::test]
    async fn test_non_string_rejected() {
        let v = PatternValidator::numeric();
        let result = v.validate(&Value::Bool(true), "count").await;
        assert!(result.is_err());
        let errors = result.unwrap_err();
        assert_eq!(
            errors.get_field_errors("count").unwrap()[0].code,
            "invalid_type"
        );
    }

    #[tokio::test]
    async fn test_null_passes() {
        let v = PatternValidator::email();
        assert!(v.validate(&Value::Null, "email").await.is_ok());
    }
}
