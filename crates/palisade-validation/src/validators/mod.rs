//! Field validators and the rule trait they implement

use crate::error::ValidationResult;
use async_trait::async_trait;
use serde_json::Value;

pub mod length;
pub mod pattern;
pub mod required;

pub use length::LengthValidator;
pub use pattern::PatternValidator;
pub use required::RequiredValidator;

/// A single constraint on one field's value.
///
/// Validators receive the raw (unsanitized) value so rejection messages
/// describe what the client actually sent. A missing field is presented to
/// validators as `Value::Null`.
#[async_trait]
pub trait ValidationRule: Send + Sync {
    /// Validate a single value for the named field
    async fn validate(&self, value: &Value, field: &str) -> ValidationResult<()>;

    /// Rule name, used in logs and rule introspection
    fn rule_name(&self) -> &'static str;
}
