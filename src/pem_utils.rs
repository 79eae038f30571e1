//! PEM encoding of certificates and private keys.
//!
//! Keys are written in their family's traditional format: PKCS#1 for RSA
//! and SEC1 for EC. Reading also accepts PKCS#8.

use std::path::Path;

use rsa::RsaPrivateKey;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use tracing::debug;

use crate::cert::Certificate;
use crate::error::{CertError, Result};
use crate::files::{FileStore, LocalFiles};
use crate::key::{EcPrivateKey, PrivateKey};

pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";
pub const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";
pub const EC_PRIVATE_KEY_LABEL: &str = "EC PRIVATE KEY";
pub const PKCS8_PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Parses the first PEM block in `data`, returning its label and contents.
pub fn pem_to_der(data: &[u8]) -> Result<(String, Vec<u8>)> {
    let pem = pem::parse(data)?;
    Ok((pem.tag().to_string(), pem.into_contents()))
}

pub fn certificate_to_pem(cert: &Certificate) -> String {
    cert.to_pem()
}

/// Encodes a private key under its family's PEM label.
pub fn key_to_pem(key: &PrivateKey) -> Result<String> {
    match key {
        PrivateKey::Rsa(private) => {
            let der = private
                .to_pkcs1_der()
                .map_err(|e| CertError::EncodingError(e.to_string()))?;
            Ok(der_to_pem(der.as_bytes(), RSA_PRIVATE_KEY_LABEL))
        }
        PrivateKey::Ec(ec_key) => Ok(der_to_pem(&ec_key.to_sec1_der()?, EC_PRIVATE_KEY_LABEL)),
    }
}

pub fn certificate_from_pem(data: &[u8]) -> Result<Certificate> {
    let (label, der) = pem_to_der(data)?;
    if label != CERTIFICATE_LABEL {
        return Err(CertError::DecodingError(format!(
            "expected a {CERTIFICATE_LABEL} block, found {label}"
        )));
    }
    Certificate::from_der(&der)
}

pub fn key_from_pem(data: &[u8]) -> Result<PrivateKey> {
    let (label, der) = pem_to_der(data)?;
    match label.as_str() {
        RSA_PRIVATE_KEY_LABEL => Ok(PrivateKey::Rsa(Box::new(
            RsaPrivateKey::from_pkcs1_der(&der)?,
        ))),
        EC_PRIVATE_KEY_LABEL => Ok(PrivateKey::Ec(EcPrivateKey::from_sec1_der(&der)?)),
        PKCS8_PRIVATE_KEY_LABEL => PrivateKey::from_pkcs8_der(&der),
        other => Err(CertError::UnsupportedKeyTypeError(format!(
            "unsupported private key block {other}"
        ))),
    }
}

/// Writes the certificate's PEM to `path`. Fails with
/// [`CertError::PathExistsError`] if the path exists and `overwrite` is false.
pub fn certificate_to_pem_file(
    cert: &Certificate,
    path: &Path,
    store: &impl FileStore,
    overwrite: bool,
) -> Result<()> {
    debug!(path = %path.display(), overwrite, "writing certificate");
    store.write(certificate_to_pem(cert).as_bytes(), path, overwrite)
}

/// Writes the key's PEM to `path`, with the same overwrite rule as
/// [`certificate_to_pem_file`].
pub fn key_to_pem_file(
    key: &PrivateKey,
    path: &Path,
    store: &impl FileStore,
    overwrite: bool,
) -> Result<()> {
    let pem = key_to_pem(key)?;
    debug!(path = %path.display(), overwrite, "writing private key");
    store.write(pem.as_bytes(), path, overwrite)
}

/// Writes the certificate's PEM to a local file that must not exist yet.
pub fn save_certificate(cert: &Certificate, path: &Path) -> Result<()> {
    certificate_to_pem_file(cert, path, &LocalFiles, false)
}

/// Writes the key's PEM to a local file that must not exist yet.
pub fn save_key(key: &PrivateKey, path: &Path) -> Result<()> {
    key_to_pem_file(key, path, &LocalFiles, false)
}

pub fn certificate_from_pem_file(path: &Path, store: &impl FileStore) -> Result<Certificate> {
    certificate_from_pem(&store.read(path)?)
}

pub fn key_from_pem_file(path: &Path, store: &impl FileStore) -> Result<PrivateKey> {
    key_from_pem(&store.read(path)?)
}
