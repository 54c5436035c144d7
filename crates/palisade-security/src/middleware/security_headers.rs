//! Security response headers
//!
//! Applied on the way out for every response, including error responses
//! produced by earlier gates when this middleware is registered first.
//! HSTS is the one conditional header: sent only when the request arrived
//! over a secure transport, since caching it from plain HTTP could lock
//! clients out of a development deployment.

use crate::config::SecurityHeadersConfig;
use crate::pipeline::{Middleware, Next, NextFuture};
use axum::extract::Request;
use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Security headers middleware
#[derive(Debug, Clone)]
pub struct SecurityHeadersMiddleware {
    config: SecurityHeadersConfig,
}

impl SecurityHeadersMiddleware {
    pub fn new(config: SecurityHeadersConfig) -> Self {
        Self { config }
    }

    fn request_is_secure(request: &Request) -> bool {
        if request.uri().scheme_str() == Some("https") {
            return true;
        }
        request
            .headers()
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|proto| proto.eq_ignore_ascii_case("https"))
    }

    fn set_header(headers: &mut HeaderMap, name: &str, value: &str) {
        let name = match HeaderName::from_bytes(name.as_bytes()) {
            Ok(name) => name,
            Err(_) => {
                log::warn!("skipping invalid header name {:?}", name);
                return;
            }
        };
        match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.insert(name, value);
            }
            Err(_) => log::warn!("skipping invalid value for header {}", name),
        }
    }

    fn apply(&self, headers: &mut HeaderMap, secure_transport: bool) {
        let config = &self.config;

        if let Some(csp) = &config.content_security_policy {
            Self::set_header(headers, "content-security-policy", csp);
        }
        if secure_transport {
            if let Some(hsts) = &config.strict_transport_security {
                Self::set_header(headers, "strict-transport-security", hsts);
            }
        }
        if let Some(value) = &config.x_frame_options {
            Self::set_header(headers, "x-frame-options", value);
        }
        if let Some(value) = &config.x_content_type_options {
            Self::set_header(headers, "x-content-type-options", value);
        }
        if let Some(value) = &config.x_xss_protection {
            Self::set_header(headers, "x-xss-protection", value);
        }
        if let Some(value) = &config.referrer_policy {
            Self::set_header(headers, "referrer-policy", value);
        }
        if let Some(value) = &config.permissions_policy {
            Self::set_header(headers, "permissions-policy", value);
        }
        for (name, value) in &config.custom_headers {
            Self::set_header(headers, name, value);
        }

        if config.remove_server_header {
            headers.remove("server");
        }
        if config.remove_x_powered_by {
            headers.remove("x-powered-by");
        }
    }
}

impl Middleware for SecurityHeadersMiddleware {
    fn handle(&self, request: Request, next: Next) -> NextFuture<'static> {
        let this = self.clone();
        Box::pin(async move {
            let secure_transport = Self::request_is_secure(&request);
            let mut response = next.run(request).await;
            this.apply(response.headers_mut(), secure_transport);
            response
        })
    }

    fn name(&self) -> &'static str {
        "SecurityHeadersMiddleware"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SecurityPipeline;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    fn middleware() -> SecurityHeadersMiddleware {
        SecurityHeadersMiddleware::new(SecurityHeadersConfig::default())
    }

    async fn run(request: Request) -> axum::response::Response {
        SecurityPipeline::new()
            .add(middleware())
            .execute(request, |_req| async {
                ([("x-powered-by", "test-harness")], StatusCode::OK).into_response()
            })
            .await
    }

    #[tokio::test]
    async fn test_standard_headers_applied() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = run(request).await;
        let headers = response.headers();

        assert!(headers["content-security-policy"]
            .to_str()
            .unwrap()
            .contains("default-src 'self'"));
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-xss-protection"], "1; mode=block");
        assert_eq!(headers["referrer-policy"], "strict-origin-when-cross-origin");
        assert!(headers["permissions-policy"]
            .to_str()
            .unwrap()
            .contains("geolocation=()"));
    }

    #[tokio::test]
    async fn test_hsts_absent_on_plain_http() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = run(request).await;
        assert!(!response.headers().contains_key("strict-transport-security"));
    }

    #[tokio::test]
    async fn test_hsts_present_behind_tls_proxy() {
        let request = Request::builder()
            .uri("/")
            .header("X-Forwarded-Proto", "https")
            .body(Body::empty())
            .unwrap();
        let response = run(request).await;
        assert_eq!(
            response.headers()["strict-transport-security"],
            "max-age=31536000; includeSubDomains"
        );
    }

    #[tokio::test]
    async fn test_x_powered_by_removed() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = run(request).await;
        assert!(!response.headers().contains_key("x-powered-by"));
    }

    #[tokio::test]
    async fn test_custom_headers_and_disabled_defaults() {
        let mut config = SecurityHeadersConfig::default();
        config.x_frame_options = None;
        config
            .custom_headers
            .insert("x-robots-tag".to_string(), "noindex".to_string());

        let pipeline = SecurityPipeline::new().add(SecurityHeadersMiddleware::new(config));
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = pipeline
            .execute(request, |_req| async { StatusCode::OK.into_response() })
            .await;

        assert!(!response.headers().contains_key("x-frame-options"));
        assert_eq!(response.headers()["x-robots-tag"], "noindex");
    }
}
