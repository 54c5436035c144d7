//! Composing the security stack into an axum application
//!
//! [`build_security_stack`] turns a [`SecurityConfig`] into the ordered
//! pipeline plus the CSRF middleware handle the token endpoint shares state
//! with. Gate order is fixed: headers wrap everything (so even rejections
//! carry them), rate limiting runs before any body work, the sanitization
//! gate buffers and inspects, and CSRF checks last.

use crate::config::SecurityConfig;
use crate::middleware::csrf::{csrf_token_handler, CsrfMiddleware};
use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::middleware::sanitization::SanitizationMiddleware;
use crate::middleware::security_headers::SecurityHeadersMiddleware;
use crate::pipeline::{pipeline_middleware, SecurityPipeline};
use axum::routing::get;
use axum::Router;

/// The composed pipeline plus handles to the stateful gates
#[derive(Debug, Clone)]
pub struct SecurityStack {
    /// Ordered middleware chain, built once
    pub pipeline: SecurityPipeline,

    /// CSRF handle, present when the CSRF gate is enabled. The token
    /// endpoint and the pipeline gate share the same token store through it.
    pub csrf: Option<CsrfMiddleware>,

    /// Sanitization handle for handlers that scrub validated payloads
    pub sanitization: Option<SanitizationMiddleware>,
}

impl SecurityStack {
    /// Install the pipeline on a router
    pub fn apply(&self, router: Router) -> Router {
        router.layer(axum::middleware::from_fn_with_state(
            self.pipeline.clone(),
            pipeline_middleware,
        ))
    }
}

/// Build the security stack from configuration. Disabled sections are
/// simply absent from the chain.
pub fn build_security_stack(config: SecurityConfig) -> SecurityStack {
    let mut pipeline = SecurityPipeline::new();

    if let Some(headers_config) = config.security_headers {
        pipeline = pipeline.add(SecurityHeadersMiddleware::new(headers_config));
    }

    if let Some(rate_limit_config) = config.rate_limit {
        pipeline = pipeline.add(RateLimitMiddleware::new(rate_limit_config));
    }

    let sanitization = config.sanitization.map(SanitizationMiddleware::new);
    if let Some(gate) = &sanitization {
        pipeline = pipeline.add(gate.clone());
    }

    let csrf = config.csrf.map(CsrfMiddleware::new);
    if let Some(gate) = &csrf {
        pipeline = pipeline.add(gate.clone());
    }

    log::info!("security pipeline: [{}]", pipeline.names().join(", "));

    SecurityStack {
        pipeline,
        csrf,
        sanitization,
    }
}

/// Router serving `GET /api/csrf-token`, sharing the middleware's store
pub fn csrf_token_routes(csrf: CsrfMiddleware) -> Router {
    Router::new().route(
        "/api/csrf-token",
        get(csrf_token_handler).with_state(csrf),
    )
}
