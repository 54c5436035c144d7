//! Security middleware implementations
//!
//! Each gate implements the [`Middleware`](crate::pipeline::Middleware)
//! contract and is composed by [`build_security_stack`](crate::integration).

pub mod csrf;
pub mod rate_limit;
pub mod sanitization;
pub mod security_headers;
pub mod suspicion;

pub use csrf::CsrfMiddleware;
pub use rate_limit::RateLimitMiddleware;
pub use sanitization::SanitizationMiddleware;
pub use security_headers::SecurityHeadersMiddleware;
pub use suspicion::SuspicionDetector;
