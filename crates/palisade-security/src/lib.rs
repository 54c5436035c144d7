//! # palisade-security
//!
//! Request-security middleware for axum services: CSRF protection, sliding
//! window rate limiting, input sanitization, suspicious-request detection,
//! and security response headers, composed as an explicit ordered pipeline
//! built once at startup.

pub mod config;
pub mod integration;
pub mod middleware;
pub mod pipeline;
pub mod store;

pub use config::{
    CsrfConfig, RateLimitConfig, SanitizationConfig, SecurityConfig, SecurityHeadersConfig,
};
pub use integration::{build_security_stack, csrf_token_routes, SecurityStack};
pub use middleware::csrf::CsrfMiddleware;
pub use middleware::rate_limit::RateLimitMiddleware;
pub use middleware::sanitization::{SanitizationMiddleware, Sanitizer};
pub use middleware::security_headers::SecurityHeadersMiddleware;
pub use middleware::suspicion::SuspicionDetector;
pub use pipeline::{pipeline_middleware, Middleware, Next, NextFuture, SecurityPipeline};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use palisade_validation::ValidationErrors;

/// Common result type for security operations
pub type SecurityResult<T> = Result<T, SecurityError>;

/// Security-related errors
#[derive(thiserror::Error, Debug)]
pub enum SecurityError {
    #[error("CSRF token validation failed")]
    CsrfValidationFailed,

    #[error("Rate limit exceeded: {limit} requests per {window_seconds} seconds")]
    RateLimitExceeded { limit: u32, window_seconds: u64 },

    #[error("Request payload of {size} bytes exceeds maximum of {max_size}")]
    PayloadTooLarge { size: usize, max_size: usize },

    #[error("Security store error: {0}")]
    StoreError(String),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

/// Map security failures onto client responses.
///
/// CSRF and store failures deliberately leak no detail to the client; the
/// specifics go to the server log at the rejection site.
impl IntoResponse for SecurityError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            SecurityError::CsrfValidationFailed => {
                (StatusCode::FORBIDDEN, "CSRF token validation failed")
            }
            SecurityError::RateLimitExceeded { .. } => {
                (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded")
            }
            SecurityError::PayloadTooLarge { .. } => {
                (StatusCode::BAD_REQUEST, "Request payload too large")
            }
            SecurityError::StoreError(_) | SecurityError::ConfigError { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Build the 400 response carrying itemized field errors
pub fn validation_failure_response(errors: &ValidationErrors) -> Response {
    (StatusCode::BAD_REQUEST, Json(errors.to_json())).into_response()
}
