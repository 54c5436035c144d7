//! Upload validation checks

use crate::{UploadConfig, UploadError, UploadResult};

/// Gate applied to an upload before it is persisted.
///
/// Checks run in order and the first failure is returned; all must pass.
#[derive(Debug, Clone, Default)]
pub struct UploadValidator {
    config: UploadConfig,
}

impl UploadValidator {
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    /// Validate a complete upload: filename, extension, size, declared MIME
    /// type, and leading-byte signature.
    pub fn validate(
        &self,
        filename: &str,
        declared_mime: &str,
        content: &[u8],
    ) -> UploadResult<()> {
        self.validate_filename(filename)?;
        self.validate_extension(filename)?;
        self.validate_size(content.len() as u64)?;
        self.validate_mime_type(declared_mime)?;
        self.validate_signature(content, declared_mime)?;
        Ok(())
    }

    fn validate_filename(&self, filename: &str) -> UploadResult<()> {
        if filename.trim().is_empty() {
            return Err(UploadError::MissingFilename);
        }
        Ok(())
    }

    fn validate_extension(&self, filename: &str) -> UploadResult<()> {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !self.config.allowed_extensions.contains(&extension) {
            return Err(UploadError::ExtensionNotAllowed);
        }
        Ok(())
    }

    fn validate_size(&self, size: u64) -> UploadResult<()> {
        if size > self.config.max_size {
            // Round up so caps under 1MB never read "Maximum size is 0MB"
            return Err(UploadError::TooLarge(
                self.config.max_size.div_ceil(1024 * 1024),
            ));
        }
        Ok(())
    }

    fn validate_mime_type(&self, mime_type: &str) -> UploadResult<()> {
        if !self.config.allowed_mime_types.contains(mime_type) {
            return Err(UploadError::MimeNotAllowed);
        }
        Ok(())
    }

    /// Check the file's magic bytes against the declared MIME type.
    ///
    /// Types without an entry in the signature table pass, since the
    /// extension and MIME allow-lists have already constrained them.
    fn validate_signature(&self, content: &[u8], mime_type: &str) -> UploadResult<()> {
        let signatures: &[&[u8]] = match mime_type {
            "image/jpeg" | "image/jpg" => &[b"\xff\xd8\xff"],
            "image/png" => &[b"\x89PNG\r\n\x1a\n"],
            "image/gif" => &[b"GIF87a", b"GIF89a"],
            "image/webp" => &[b"RIFF"],
            _ => return Ok(()),
        };

        if signatures.iter().any(|sig| content.starts_with(sig)) {
            Ok(())
        } else {
            log::warn!(
                "upload signature mismatch: declared {} but leading bytes differ",
                mime_type
            );
            Err(UploadError::SignatureMismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR";
    const JPEG_HEADER: &[u8] = b"\xff\xd8\xff\xe0\x00\x10JFIF";

    fn validator() -> UploadValidator {
        UploadValidator::new(UploadConfig::default())
    }

    #[test]
    fn test_valid_png_accepted() {
        assert!(validator()
            .validate("banner.png", "image/png", PNG_HEADER)
            .is_ok());
    }

    #[test]
    fn test_valid_jpeg_accepted() {
        assert!(validator()
            .validate("hero.jpg", "image/jpeg", JPEG_HEADER)
            .is_ok());
    }

    #[test]
    fn test_missing_filename_rejected() {
        let result = validator().validate("", "image/png", PNG_HEADER);
        assert_eq!(result.unwrap_err(), UploadError::MissingFilename);
    }

    #[test]
    fn test_disallowed_extension_rejected() {
        let result = validator().validate("payload.svg", "image/png", PNG_HEADER);
        assert_eq!(result.unwrap_err(), UploadError::ExtensionNotAllowed);

        // Extension check is case-insensitive
        assert!(validator()
            .validate("BANNER.PNG", "image/png", PNG_HEADER)
            .is_ok());
    }

    #[test]
    fn test_oversized_file_rejected() {
        let config = UploadConfig::new().max_size(8);
        let result = UploadValidator::new(config).validate("x.png", "image/png", PNG_HEADER);
        assert!(matches!(result.unwrap_err(), UploadError::TooLarge(_)));
    }

    #[test]
    fn test_size_message_rounds_up_to_whole_megabytes() {
        let config = UploadConfig::new().max_size(8);
        let err = UploadValidator::new(config)
            .validate("x.png", "image/png", PNG_HEADER)
            .unwrap_err();

        assert_eq!(err, UploadError::TooLarge(1));
        assert_eq!(err.to_string(), "File too large. Maximum size is 1MB");

        let config = UploadConfig::new().max_size(5 * 1024 * 1024);
        let err = UploadValidator::new(config)
            .validate("x.png", "image/png", &vec![0xff; 6 * 1024 * 1024])
            .unwrap_err();
        assert_eq!(err, UploadError::TooLarge(5));
    }

    #[test]
    fn test_disallowed_mime_rejected() {
        let result = validator().validate("x.png", "application/pdf", PNG_HEADER);
        assert_eq!(result.unwrap_err(), UploadError::MimeNotAllowed);
    }

    #[test]
    fn test_signature_mismatch_rejected() {
        // Well-formed name and MIME, but the bytes are not a PNG
        let result = validator().validate("x.png", "image/png", b"GIF89a fake");
        assert_eq!(result.unwrap_err(), UploadError::SignatureMismatch);
    }

    #[test]
    fn test_gif_both_signatures_accepted() {
        assert!(validator()
            .validate("anim.gif", "image/gif", b"GIF87a......")
            .is_ok());
        assert!(validator()
            .validate("anim.gif", "image/gif", b"GIF89a......")
            .is_ok());
    }

    #[test]
    fn test_webp_riff_signature() {
        assert!(validator()
            .validate("photo.webp", "image/webp", b"RIFF\x24\x00\x00\x00WEBP")
            .is_ok());
        assert_eq!(
            validator()
                .validate("photo.webp", "image/webp", b"not riff")
                .unwrap_err(),
            UploadError::SignatureMismatch
        );
    }

    #[test]
    fn test_first_failure_wins() {
        // Bad extension and bad signature: extension check runs first
        let result = validator().validate("x.txt", "image/png", b"plain text");
        assert_eq!(result.unwrap_err(), UploadError::ExtensionNotAllowed);
    }
}
