//! # palisade-upload
//!
//! Defense-in-depth gate for multipart file uploads. Checks run in a fixed
//! order and the first failing check's reason is returned: filename present,
//! extension allow-list, size ceiling, declared MIME allow-list, and a
//! magic-byte signature match for the common image formats. No content
//! parsing or malware scanning is attempted.

pub mod config;
pub mod validation;

pub use config::UploadConfig;
pub use validation::UploadValidator;

pub type UploadResult<T> = Result<T, UploadError>;

/// Upload rejection reasons, surfaced to clients as a single human-readable
/// message on a 400 response.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    #[error("No file selected")]
    MissingFilename,

    #[error("File type not allowed")]
    ExtensionNotAllowed,

    #[error("File too large. Maximum size is {0}MB")]
    TooLarge(u64),

    #[error("Invalid file type")]
    MimeNotAllowed,

    #[error("File signature validation failed")]
    SignatureMismatch,
}
