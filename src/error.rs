//! use certsmith::error::CertError;

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CertError>;

/// Represents errors that can occur while generating, signing or serializing
/// certificates and keys.
///
/// Every failure is returned to the immediate caller; nothing is retried.
#[derive(Debug, Error, Clone)]
pub enum CertError {
    /// The keypair could not be generated (bad parameter or no entropy).
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// The serial number is not a non-negative decimal integer that fits
    /// in an X.509 serial.
    #[error("Invalid serial number: {0}")]
    InvalidSerialNumberError(String),

    /// The algorithm hint or curve name is not recognized.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithmError(String),

    /// The issuer key cannot sign for the given issuer certificate.
    #[error("Unsupported issuer key: {0}")]
    UnsupportedIssuerKeyError(String),

    /// The private key type cannot be serialized or parsed.
    #[error("Unsupported key type: {0}")]
    UnsupportedKeyTypeError(String),

    /// Refused to overwrite an existing path.
    #[error("Path already exists: {}", .0.display())]
    PathExistsError(PathBuf),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// The signature primitive failed.
    #[error("Signing error: {0}")]
    SigningError(String),

    /// A signature did not verify under the given public key.
    #[error("Signature verification failed: {0}")]
    VerificationError(String),

    /// A certificate must be valid for at least one year.
    #[error("Invalid validity: {0}")]
    InvalidValidityError(String),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<der::Error> for CertError {
    fn from(err: der::Error) -> Self {
        CertError::EncodingError(err.to_string())
    }
}

impl From<rsa::Error> for CertError {
    fn from(err: rsa::Error) -> Self {
        CertError::KeyGenerationError(err.to_string())
    }
}

impl From<rsa::pkcs1::Error> for CertError {
    fn from(err: rsa::pkcs1::Error) -> Self {
        CertError::DecodingError(err.to_string())
    }
}

impl From<pkcs8::Error> for CertError {
    fn from(err: pkcs8::Error) -> Self {
        CertError::DecodingError(err.to_string())
    }
}

impl From<pem::PemError> for CertError {
    fn from(err: pem::PemError) -> Self {
        CertError::DecodingError(err.to_string())
    }
}

impl From<std::io::Error> for CertError {
    fn from(err: std::io::Error) -> Self {
        CertError::IoError(err.to_string())
    }
}
