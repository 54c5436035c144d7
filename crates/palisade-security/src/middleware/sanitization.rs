//! Request sanitization
//!
//! Two halves live here. [`SanitizationMiddleware`] sits in the pipeline,
//! enforces the request size cap and logs suspicious payloads. [`Sanitizer`]
//! is the value-level XSS scrubber handlers run over payloads after
//! validation, so validation always sees what the client actually sent.

use crate::config::SanitizationConfig;
use crate::middleware::suspicion::SuspicionDetector;
use crate::pipeline::{Middleware, Next, NextFuture};
use crate::SecurityError;
use axum::body::Body;
use axum::extract::Request;
use axum::http::header;
use axum::response::IntoResponse;
use regex::Regex;
use serde_json::Value;

/// Value-level XSS scrubber: strips script tags, `javascript:` URLs and
/// inline event handlers, then entity-encodes what remains.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    script_re: Regex,
    js_url_re: Regex,
    event_handler_re: Regex,
    enabled: bool,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Sanitizer {
    pub fn new(enabled: bool) -> Self {
        Self {
            // static patterns, known valid
            script_re: Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap(),
            js_url_re: Regex::new(r"(?i)javascript:").unwrap(),
            event_handler_re: Regex::new(r#"(?i)\s*on\w+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#)
                .unwrap(),
            enabled,
        }
    }

    /// Sanitize one text value. Strip order matters: removing script blocks
    /// first keeps their contents out of the encoded output entirely.
    pub fn sanitize_text(&self, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }

        let stripped = self.script_re.replace_all(text, "");
        let stripped = self.js_url_re.replace_all(&stripped, "");
        let stripped = self.event_handler_re.replace_all(&stripped, "");
        html_escape::encode_quoted_attribute(stripped.as_ref()).into_owned()
    }

    /// Sanitize every string in a JSON value, recursing through arrays and
    /// objects. Numbers, booleans and nulls pass through untouched.
    pub fn sanitize_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.sanitize_text(s)),
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| self.sanitize_value(item)).collect())
            }
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, item)| (key.clone(), self.sanitize_value(item)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

/// Pipeline gate: request size cap plus suspicious-payload logging
#[derive(Debug, Clone)]
pub struct SanitizationMiddleware {
    config: SanitizationConfig,
    sanitizer: Sanitizer,
    detector: SuspicionDetector,
}

impl SanitizationMiddleware {
    pub fn new(config: SanitizationConfig) -> Self {
        let sanitizer = Sanitizer::new(config.xss_protection);
        Self {
            config,
            sanitizer,
            detector: SuspicionDetector::new(),
        }
    }

    /// The scrubber handlers should run over validated payloads
    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }
}

impl Middleware for SanitizationMiddleware {
    fn handle(&self, request: Request, next: Next) -> NextFuture<'static> {
        let gate = self.clone();
        Box::pin(async move {
            let max_size = gate.config.max_request_size;

            // Reject on the declared length before reading anything
            if let Some(max) = max_size {
                let declared = request
                    .headers()
                    .get(header::CONTENT_LENGTH)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<usize>().ok());
                if let Some(size) = declared {
                    if size > max {
                        log::warn!("request of {} bytes exceeds cap of {}", size, max);
                        return SecurityError::PayloadTooLarge {
                            size,
                            max_size: max,
                        }
                        .into_response();
                    }
                }
            }

            let query = request.uri().query().map(|q| q.to_string());
            let content_type = request
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string());
            let path = request.uri().path().to_string();

            let (parts, body) = request.into_parts();

            // Buffer no more than the cap plus one byte: a chunked body with
            // no declared length stops reading at the limit instead of
            // landing fully in memory first
            let read_limit = max_size.map_or(usize::MAX, |max| max.saturating_add(1));
            let bytes = match axum::body::to_bytes(body, read_limit).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    if let Some(max) = max_size {
                        log::warn!("request exceeded cap of {} bytes mid-read", max);
                        return SecurityError::PayloadTooLarge {
                            size: read_limit,
                            max_size: max,
                        }
                        .into_response();
                    }
                    log::error!("failed to buffer request body: {}", err);
                    return SecurityError::StoreError(err.to_string()).into_response();
                }
            };

            // The declared length can lie; check what actually arrived
            if let Some(max) = max_size {
                if bytes.len() > max {
                    log::warn!("request of {} bytes exceeds cap of {}", bytes.len(), max);
                    return SecurityError::PayloadTooLarge {
                        size: bytes.len(),
                        max_size: max,
                    }
                    .into_response();
                }
            }

            // Heuristic only: log and continue, false positives must not
            // block real users
            if gate
                .detector
                .is_suspicious(query.as_deref(), content_type.as_deref(), &bytes)
            {
                log::warn!("suspicious request detected on {}", path);
            }

            let request = Request::from_parts(parts, Body::from(bytes));
            next.run(request).await
        })
    }

    fn name(&self) -> &'static str {
        "SanitizationMiddleware"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SecurityPipeline;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[test]
    fn test_script_tags_removed_entirely() {
        let sanitizer = Sanitizer::default();
        assert_eq!(
            sanitizer.sanitize_text("<script>alert(1)</script>Hello"),
            "Hello"
        );
        assert_eq!(
            sanitizer.sanitize_text("a<SCRIPT src=x>\nbad()\n</SCRIPT>b"),
            "ab"
        );
    }

    #[test]
    fn test_javascript_urls_stripped() {
        let sanitizer = Sanitizer::default();
        assert_eq!(
            sanitizer.sanitize_text("Click JAVASCRIPT:alert(1)"),
            "Click alert(1)"
        );
    }

    #[test]
    fn test_event_handlers_stripped_then_encoded() {
        let sanitizer = Sanitizer::default();
        assert_eq!(
            sanitizer.sanitize_text(r#"<img src=x onerror="alert(1)">"#),
            "&lt;img src=x&gt;"
        );
    }

    #[test]
    fn test_plain_text_entity_encoded() {
        let sanitizer = Sanitizer::default();
        assert_eq!(
            sanitizer.sanitize_text("Tom & Jerry <3"),
            "Tom &amp; Jerry &lt;3"
        );
        assert_eq!(sanitizer.sanitize_text("plain message"), "plain message");
    }

    #[test]
    fn test_disabled_sanitizer_passes_through() {
        let sanitizer = Sanitizer::new(false);
        let raw = "<script>alert(1)</script>";
        assert_eq!(sanitizer.sanitize_text(raw), raw);
    }

    #[test]
    fn test_sanitize_value_recurses() {
        let sanitizer = Sanitizer::default();
        let payload = json!({
            "name": "<script>x</script>Sam",
            "count": 7,
            "notes": ["fine", "javascript:run()"]
        });

        let clean = sanitizer.sanitize_value(&payload);
        assert_eq!(clean["name"], "Sam");
        assert_eq!(clean["count"], 7);
        assert_eq!(clean["notes"][0], "fine");
        assert_eq!(clean["notes"][1], "run()");
    }

    async fn run(middleware: &SanitizationMiddleware, request: Request) -> axum::response::Response {
        SecurityPipeline::new()
            .add(middleware.clone())
            .execute(request, |_req| async {
                StatusCode::OK.into_response()
            })
            .await
    }

    #[tokio::test]
    async fn test_oversize_body_rejected() {
        let middleware = SanitizationMiddleware::new(SanitizationConfig {
            xss_protection: true,
            max_request_size: Some(16),
        });

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/contact")
            .body(Body::from(vec![b'x'; 64]))
            .unwrap();

        let response = run(&middleware, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chunked_body_read_stops_at_cap() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let middleware = SanitizationMiddleware::new(SanitizationConfig {
            xss_protection: true,
            max_request_size: Some(128),
        });

        let sent = Arc::new(AtomicUsize::new(0));
        let counter = sent.clone();
        // 1MiB in 1KiB chunks, no Content-Length header
        let stream = futures::stream::iter((0..1024).map(move |_| {
            counter.fetch_add(1024, Ordering::SeqCst);
            Ok::<_, std::io::Error>(axum::body::Bytes::from(vec![b'x'; 1024]))
        }));

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/contact")
            .body(Body::from_stream(stream))
            .unwrap();

        let response = run(&middleware, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        // reading stopped at the cap instead of draining the whole stream
        assert!(sent.load(Ordering::SeqCst) < 64 * 1024);
    }

    #[tokio::test]
    async fn test_declared_content_length_checked_first() {
        let middleware = SanitizationMiddleware::new(SanitizationConfig {
            xss_protection: true,
            max_request_size: Some(16),
        });

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/contact")
            .header("Content-Length", "1048576")
            .body(Body::empty())
            .unwrap();

        let response = run(&middleware, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_suspicious_body_still_passes() {
        let middleware = SanitizationMiddleware::new(SanitizationConfig::default());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/contact?q=%3Cscript%3Ealert(1)%3C/script%3E")
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"note":"javascript:x()"}"#))
            .unwrap();

        // detection is log-only
        let response = run(&middleware, request).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_body_still_readable_downstream() {
        let middleware = SanitizationMiddleware::new(SanitizationConfig::default());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/contact")
            .body(Body::from("hello"))
            .unwrap();

        let response = SecurityPipeline::new()
            .add(middleware)
            .execute(request, |req| async {
                let bytes = axum::body::to_bytes(req.into_body(), usize::MAX)
                    .await
                    .unwrap();
                assert_eq!(&bytes[..], b"hello");
                StatusCode::OK.into_response()
            })
            .await;

        assert_eq!(response.status(), StatusCode::OK);
    }
}
