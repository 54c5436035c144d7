//! CSRF (Cross-Site Request Forgery) protection middleware
//!
//! One opaque token per session, stored server-side and compared in constant
//! time against the value the client echoes back on state-changing requests.
//! Tokens are never rotated; they disappear when the session's store entry
//! does.

use crate::config::{path_matches, CsrfConfig};
use crate::pipeline::{Middleware, Next, NextFuture};
use crate::store::{InMemoryTokenStore, TokenStore};
use crate::{SecurityError, SecurityResult};
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, Method};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{thread_rng, Rng};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Ceiling on how much of a form body is buffered while looking for the
/// fallback token field. Matches the default request size cap; anything
/// larger fails the check closed.
const MAX_FORM_BYTES: usize = 10 * 1024 * 1024;

/// CSRF protection middleware
#[derive(Debug, Clone)]
pub struct CsrfMiddleware {
    config: CsrfConfig,
    store: Arc<dyn TokenStore>,
}

impl CsrfMiddleware {
    /// Create CSRF middleware backed by an in-memory token store
    pub fn new(config: CsrfConfig) -> Self {
        Self::with_store(config, Arc::new(InMemoryTokenStore::new()))
    }

    /// Create CSRF middleware with an injected token store
    pub fn with_store(config: CsrfConfig, store: Arc<dyn TokenStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &CsrfConfig {
        &self.config
    }

    /// Return the session's token, creating one on first use.
    ///
    /// Issuance is idempotent: repeated calls for the same session return
    /// the same token.
    pub async fn issue_token(&self, session_id: &str) -> SecurityResult<String> {
        if let Some(existing) = self.store.get(session_id).await? {
            return Ok(existing);
        }

        let token_bytes: [u8; 32] = thread_rng().gen();
        let token = URL_SAFE_NO_PAD.encode(token_bytes);
        self.store.set_if_absent(session_id, token).await
    }

    /// Validate a client-supplied token against the session's stored token
    pub async fn validate_token(&self, session_id: &str, supplied: &str) -> SecurityResult<bool> {
        match self.store.get(session_id).await? {
            Some(stored) => Ok(constant_time_eq(&stored, supplied)),
            None => Ok(false),
        }
    }

    fn is_exempt_path(&self, path: &str) -> bool {
        self.config
            .exempt_paths
            .iter()
            .any(|pattern| path_matches(pattern, path))
    }

    /// Session identifier from the session cookie, if any
    pub fn session_id(&self, headers: &HeaderMap) -> Option<String> {
        let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
        for cookie in cookies.split(';') {
            if let Some((name, value)) = cookie.trim().split_once('=') {
                if name == self.config.session_cookie {
                    return Some(value.to_string());
                }
            }
        }
        None
    }

    fn header_token(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get(self.config.token_header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    }

    fn form_token(&self, content_type: Option<&str>, body: &[u8]) -> Option<String> {
        if !content_type?.starts_with("application/x-www-form-urlencoded") {
            return None;
        }
        url::form_urlencoded::parse(body)
            .find(|(name, _)| name == self.config.form_field.as_str())
            .map(|(_, value)| value.into_owned())
    }
}

impl Middleware for CsrfMiddleware {
    fn handle(&self, request: Request, next: Next) -> NextFuture<'static> {
        let guard = self.clone();
        Box::pin(async move {
            // Read methods bypass the check
            if matches!(
                *request.method(),
                Method::GET | Method::HEAD | Method::OPTIONS
            ) {
                return next.run(request).await;
            }

            let path = request.uri().path().to_string();
            if guard.is_exempt_path(&path) {
                return next.run(request).await;
            }

            let session_id = guard.session_id(request.headers());
            let mut token = guard.header_token(request.headers());

            // Fall back to the form field, which requires buffering the body
            let request = if token.is_none() {
                let content_type = request
                    .headers()
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.to_string());

                let (parts, body) = request.into_parts();
                let bytes = match axum::body::to_bytes(body, MAX_FORM_BYTES).await {
                    Ok(bytes) => bytes,
                    // A body we cannot read cannot carry a token: fail closed
                    Err(err) => {
                        log::warn!("could not read request body for CSRF check: {}", err);
                        return SecurityError::CsrfValidationFailed.into_response();
                    }
                };
                token = guard.form_token(content_type.as_deref(), &bytes);
                Request::from_parts(parts, Body::from(bytes))
            } else {
                request
            };

            if let (Some(session_id), Some(token)) = (&session_id, &token) {
                match guard.validate_token(session_id, token).await {
                    Ok(true) => return next.run(request).await,
                    Ok(false) => {}
                    Err(err) => {
                        log::error!("CSRF token lookup failed: {}", err);
                        return err.into_response();
                    }
                }
            }

            log::warn!("CSRF token validation failed for {}", path);
            SecurityError::CsrfValidationFailed.into_response()
        })
    }

    fn name(&self) -> &'static str {
        "CsrfMiddleware"
    }
}

/// Constant-time token equality. `subtle` carries the optimizer barrier a
/// hand-written comparison loop would not; mismatched lengths compare
/// unequal without an early exit on content.
fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// `GET /api/csrf-token` handler: returns the session's token, minting a
/// session cookie when the client has none yet.
pub async fn csrf_token_handler(
    State(middleware): State<CsrfMiddleware>,
    headers: HeaderMap,
) -> Response {
    let existing = middleware.session_id(&headers);
    let session_id = existing
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let token = match middleware.issue_token(&session_id).await {
        Ok(token) => token,
        Err(err) => {
            log::error!("CSRF token issuance failed: {}", err);
            return err.into_response();
        }
    };

    let mut response = Json(serde_json::json!({ "csrf_token": token })).into_response();

    if existing.is_none() {
        let config = middleware.config();
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            config.session_cookie, session_id
        );
        if config.secure_cookie {
            cookie.push_str("; Secure");
        }
        match cookie.parse() {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(_) => log::warn!("could not encode session cookie header"),
        }
    }

    response
}
