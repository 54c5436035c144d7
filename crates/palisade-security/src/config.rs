//! Security configuration types
//!
//! Each gate has its own config section; a section set to `None` disables
//! that gate entirely. [`SecurityConfig::from_env`] recognizes the flat
//! environment toggles the deployment scripts export.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Global security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// CSRF protection configuration
    pub csrf: Option<CsrfConfig>,

    /// Rate limiting configuration
    pub rate_limit: Option<RateLimitConfig>,

    /// Request sanitization configuration
    pub sanitization: Option<SanitizationConfig>,

    /// Security headers configuration
    pub security_headers: Option<SecurityHeadersConfig>,

    /// Whether applications should run their declared rule sets against
    /// incoming payloads. Consulted by handlers, not by the pipeline.
    pub input_validation: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            csrf: Some(CsrfConfig::default()),
            rate_limit: Some(RateLimitConfig::default()),
            sanitization: Some(SanitizationConfig::default()),
            security_headers: Some(SecurityHeadersConfig::default()),
            input_validation: true,
        }
    }
}

impl SecurityConfig {
    /// Load configuration from environment toggles, falling back to defaults.
    ///
    /// Recognized variables: `CSRF_ENABLED`, `RATE_LIMIT_ENABLED`,
    /// `RATE_LIMIT_REQUESTS`, `RATE_LIMIT_WINDOW`, `XSS_PROTECTION_ENABLED`,
    /// `SECURITY_HEADERS_ENABLED`, `INPUT_VALIDATION_ENABLED`,
    /// `MAX_REQUEST_SIZE`.
    pub fn from_env() -> Self {
        let csrf = env_flag("CSRF_ENABLED", true).then(CsrfConfig::default);

        let rate_limit = env_flag("RATE_LIMIT_ENABLED", true).then(|| RateLimitConfig {
            max_requests: env_parse("RATE_LIMIT_REQUESTS", 100),
            window_seconds: env_parse("RATE_LIMIT_WINDOW", 3600),
            ..RateLimitConfig::default()
        });

        let sanitization = Some(SanitizationConfig {
            xss_protection: env_flag("XSS_PROTECTION_ENABLED", true),
            max_request_size: Some(env_parse("MAX_REQUEST_SIZE", 10 * 1024 * 1024)),
        });

        let security_headers =
            env_flag("SECURITY_HEADERS_ENABLED", true).then(SecurityHeadersConfig::default);

        Self {
            csrf,
            rate_limit,
            sanitization,
            security_headers,
            input_validation: env_flag("INPUT_VALIDATION_ENABLED", true),
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => matches!(
            value.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// CSRF (Cross-Site Request Forgery) protection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrfConfig {
    /// Token header name
    pub token_header: String,

    /// Form field carrying the token when the header is absent
    pub form_field: String,

    /// Cookie carrying the session identifier the token is keyed by
    pub session_cookie: String,

    /// Whether to mark the session cookie Secure (HTTPS only)
    pub secure_cookie: bool,

    /// Paths exempt from CSRF protection (trailing `*` matches a prefix)
    pub exempt_paths: HashSet<String>,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            token_header: "X-CSRF-Token".to_string(),
            form_field: "_csrf_token".to_string(),
            session_cookie: "sid".to_string(),
            secure_cookie: true,
            exempt_paths: HashSet::new(),
        }
    }
}

/// Per-path rate limit quota
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitQuota {
    pub max_requests: u32,
    pub window_seconds: u64,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Default maximum requests per window
    pub max_requests: u32,

    /// Default window duration in seconds
    pub window_seconds: u64,

    /// Per-path overrides of the default quota (trailing `*` matches a prefix)
    pub overrides: HashMap<String, RateLimitQuota>,

    /// Paths exempt from rate limiting
    pub exempt_paths: HashSet<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_seconds: 3600, // 1 hour
            overrides: HashMap::new(),
            exempt_paths: HashSet::new(),
        }
    }
}

impl RateLimitConfig {
    /// Override the quota for one path
    pub fn with_override(
        mut self,
        path: impl Into<String>,
        max_requests: u32,
        window_seconds: u64,
    ) -> Self {
        self.overrides.insert(
            path.into(),
            RateLimitQuota {
                max_requests,
                window_seconds,
            },
        );
        self
    }
}

/// Request sanitization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizationConfig {
    /// Strip XSS vectors and entity-encode when sanitizing values
    pub xss_protection: bool,

    /// Maximum request body size in bytes
    pub max_request_size: Option<usize>,
}

impl Default for SanitizationConfig {
    fn default() -> Self {
        Self {
            xss_protection: true,
            max_request_size: Some(10 * 1024 * 1024), // 10MB
        }
    }
}

/// Security headers configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityHeadersConfig {
    /// Content Security Policy header
    pub content_security_policy: Option<String>,

    /// HTTP Strict Transport Security header, applied only on secure requests
    pub strict_transport_security: Option<String>,

    /// X-Frame-Options header
    pub x_frame_options: Option<String>,

    /// X-Content-Type-Options header
    pub x_content_type_options: Option<String>,

    /// X-XSS-Protection header
    pub x_xss_protection: Option<String>,

    /// Referrer-Policy header
    pub referrer_policy: Option<String>,

    /// Permissions-Policy header
    pub permissions_policy: Option<String>,

    /// Custom headers to add
    pub custom_headers: HashMap<String, String>,

    /// Remove Server header from responses
    pub remove_server_header: bool,

    /// Remove X-Powered-By header from responses
    pub remove_x_powered_by: bool,
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self {
            content_security_policy: Some(
                "default-src 'self'; \
                 script-src 'self' 'unsafe-inline' https://cdn.jsdelivr.net https://cdnjs.cloudflare.com; \
                 style-src 'self' 'unsafe-inline' https://fonts.googleapis.com https://cdn.jsdelivr.net https://cdnjs.cloudflare.com; \
                 font-src 'self' https://fonts.gstatic.com; \
                 img-src 'self' data: https: blob:; \
                 connect-src 'self'; \
                 frame-ancestors 'none'"
                    .to_string(),
            ),
            strict_transport_security: Some("max-age=31536000; includeSubDomains".to_string()),
            x_frame_options: Some("DENY".to_string()),
            x_content_type_options: Some("nosniff".to_string()),
            x_xss_protection: Some("1; mode=block".to_string()),
            referrer_policy: Some("strict-origin-when-cross-origin".to_string()),
            permissions_policy: Some("geolocation=(), microphone=(), camera=()".to_string()),
            custom_headers: HashMap::new(),
            remove_server_header: false,
            remove_x_powered_by: true,
        }
    }
}

/// Glob-style path matching shared by exempt lists and overrides: a trailing
/// `*` matches any suffix, everything else is an exact match.
pub(crate) fn path_matches(pattern: &str, path: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix('*') {
        path.starts_with(prefix)
    } else {
        path == pattern
    }
}
