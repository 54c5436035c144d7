//! # palisade-validation
//!
//! Rule-based input validation for request payloads. A [`RuleSet`] maps field
//! names to ordered validators (required, typed pattern, length bounds) and
//! accumulates every violation instead of failing fast, so API responses can
//! itemize all field errors at once.

pub mod error;
pub mod rules;
pub mod validators;

pub use error::{ValidationError, ValidationErrors, ValidationResult};
pub use rules::RuleSet;
pub use validators::{LengthValidator, PatternValidator, RequiredValidator};
