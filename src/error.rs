//! use certauthority::error::CaError;

use thiserror::Error;

/// Represents errors that can occur in the certificate authority engine.
///
/// Verification never produces one of these at its boundary; it reports booleans.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaError {
    /// The submitted certificate signing request could not be used.
    #[error("Invalid CSR: {0}")]
    InvalidCsr(String),

    /// Building or signing a certificate failed.
    ///
    /// The payload is the internal cause. It is kept for logs and diagnostics and is
    /// deliberately left out of the `Display` output.
    #[error("Certificate issuance failed")]
    Issuance(String),

    /// No certificate record matches the requested serial number.
    #[error("Certificate not found: {0}")]
    NotFound(String),

    /// A record with the same serial number is already stored.
    #[error("Duplicate certificate serial number: {0}")]
    DuplicateSerial(String),

    /// Configuration or CA material could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The certificate store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error from key generation, import or signing.
    #[error("Key error: {0}")]
    KeyError(String),
}

impl CaError {
    /// Returns `true` when the error was caused by caller input rather than by the engine.
    pub fn is_client_error(&self) -> bool {
        matches!(self, CaError::InvalidCsr(_) | CaError::NotFound(_))
    }

    /// The internal cause of an issuance failure, for logging.
    pub fn cause(&self) -> Option<&str> {
        match self {
            CaError::Issuance(cause) => Some(cause),
            _ => None,
        }
    }

    /// Wraps any lower-level failure as an opaque issuance error.
    pub(crate) fn issuance(err: impl std::fmt::Display) -> Self {
        CaError::Issuance(err.to_string())
    }
}

impl From<der::Error> for CaError {
    /// Converts a `der::Error` into a `CaError`.
    fn from(err: der::Error) -> Self {
        CaError::DecodingError(err.to_string())
    }
}

impl From<rsa::Error> for CaError {
    fn from(err: rsa::Error) -> Self {
        CaError::KeyError(err.to_string())
    }
}

impl From<pkcs8::Error> for CaError {
    fn from(err: pkcs8::Error) -> Self {
        CaError::KeyError(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for CaError {
    fn from(err: pkcs8::spki::Error) -> Self {
        CaError::KeyError(err.to_string())
    }
}

impl From<pem::PemError> for CaError {
    fn from(err: pem::PemError) -> Self {
        CaError::DecodingError(err.to_string())
    }
}

impl From<std::io::Error> for CaError {
    fn from(err: std::io::Error) -> Self {
        CaError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for CaError {
    fn from(err: toml::de::Error) -> Self {
        CaError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CaError>;
