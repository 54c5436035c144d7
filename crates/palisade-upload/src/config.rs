//! Upload policy configuration

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Policy applied to every incoming upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Allowed file extensions, lowercase, without the leading dot
    pub allowed_extensions: HashSet<String>,

    /// Allowed declared MIME types
    pub allowed_mime_types: HashSet<String>,

    /// Maximum file size in bytes
    pub max_size: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: ["png", "jpg", "jpeg", "gif", "webp"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_mime_types: [
                "image/png",
                "image/jpeg",
                "image/jpg",
                "image/gif",
                "image/webp",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            max_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl UploadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the upload policy from environment variables, falling back to
    /// defaults. Recognized: `UPLOAD_MAX_SIZE` (bytes) and
    /// `UPLOAD_ALLOWED_MIME_TYPES` (comma-separated).
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(size) = std::env::var("UPLOAD_MAX_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.max_size = size;
        }

        if let Ok(types) = std::env::var("UPLOAD_ALLOWED_MIME_TYPES") {
            let parsed: HashSet<String> = types
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            if !parsed.is_empty() {
                config.allowed_mime_types = parsed;
            }
        }

        config
    }

    pub fn max_size(mut self, size: u64) -> Self {
        self.max_size = size;
        self
    }

    pub fn allow_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_extensions = extensions.into_iter().map(|e| e.into()).collect();
        self
    }

    pub fn allow_mime_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_mime_types = types.into_iter().map(|t| t.into()).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_covers_site_images() {
        let config = UploadConfig::default();
        assert!(config.allowed_extensions.contains("webp"));
        assert!(config.allowed_mime_types.contains("image/png"));
        assert_eq!(config.max_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_from_env_overrides() {
        std::env::set_var("UPLOAD_MAX_SIZE", "2048");
        std::env::set_var("UPLOAD_ALLOWED_MIME_TYPES", "image/png, image/webp");

        let config = UploadConfig::from_env();
        assert_eq!(config.max_size, 2048);
        assert_eq!(config.allowed_mime_types.len(), 2);
        assert!(config.allowed_mime_types.contains("image/webp"));
        // extensions keep their defaults
        assert!(config.allowed_extensions.contains("jpg"));

        std::env::remove_var("UPLOAD_MAX_SIZE");
        std::env::remove_var("UPLOAD_ALLOWED_MIME_TYPES");
    }

    #[test]
    fn test_builder_overrides() {
        let config = UploadConfig::new()
            .max_size(1024)
            .allow_extensions(["png"])
            .allow_mime_types(["image/png"]);

        assert_eq!(config.max_size, 1024);
        assert_eq!(config.allowed_extensions.len(), 1);
        assert_eq!(config.allowed_mime_types.len(), 1);
    }
}
