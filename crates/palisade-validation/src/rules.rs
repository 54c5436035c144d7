//! Per-endpoint rule sets

use crate::error::{ValidationErrors, ValidationResult};
use crate::validators::ValidationRule;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Validation rules for one endpoint's payload: a mapping from field name to
/// an ordered list of constraints.
///
/// Rule sets are declared once at startup and are read-only at request time.
/// Validation visits every declared field, including fields absent from the
/// payload (presented to validators as `Value::Null`), and accumulates all
/// violations rather than stopping at the first.
#[derive(Clone, Default)]
pub struct RuleSet {
    field_rules: HashMap<String, Vec<Arc<dyn ValidationRule>>>,
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("field_count", &self.field_rules.len())
            .field("fields", &self.validated_fields())
            .finish()
    }
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validation rule for a field
    pub fn field<R>(mut self, field: impl Into<String>, rule: R) -> Self
    where
        R: ValidationRule + 'static,
    {
        self.field_rules
            .entry(field.into())
            .or_default()
            .push(Arc::new(rule));
        self
    }

    /// Validate a payload against this rule set, accumulating every violation
    pub async fn validate(&self, data: &HashMap<String, Value>) -> ValidationResult<()> {
        let mut errors = ValidationErrors::new();

        for (field, rules) in &self.field_rules {
            let value = data.get(field).cloned().unwrap_or(Value::Null);
            for rule in rules {
                if let Err(rule_errors) = rule.validate(&value, field).await {
                    errors.merge(rule_errors);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate a JSON object payload
    pub async fn validate_value(&self, data: &Value) -> ValidationResult<()> {
        let map: HashMap<String, Value> = match data.as_object() {
            Some(obj) => obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            None => HashMap::new(),
        };
        self.validate(&map).await
    }

    pub fn is_empty(&self) -> bool {
        self.field_rules.is_empty()
    }

    pub fn validated_fields(&self) -> Vec<&String> {
        self.field_rules.keys().collect()
    }
}
