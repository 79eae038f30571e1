//! Defaults for generated certificates.
//!
//! Passed around explicitly so tests can vary them independently.

use bon::Builder;

use crate::cert::extensions::KeyUsage;
use crate::key::Curve;

/// RSA modulus size used when a template doesn't say otherwise.
pub const DEFAULT_RSA_BITS: usize = 2048;

/// Curve used when a template doesn't say otherwise.
pub const DEFAULT_CURVE: Curve = Curve::P256;

/// Defaults applied by [`crate::generator::CertGenerator`].
///
/// # Fields
/// * `validity_years` - Certificate lifetime in whole years.
/// * `max_path_len` - Path length for CAs; zero means leaf-signing only.
/// * `ca_key_usage` - Key usage for CA certificates.
/// * `leaf_key_usage` - Key usage for leaf certificates.
/// * `rsa_bits` - RSA modulus size for templates built without one.
/// * `curve` - EC curve for templates built without one.
#[derive(Clone, Debug, Builder, PartialEq, Eq)]
pub struct CertConfig {
    #[builder(default = 1)]
    pub validity_years: u32,
    #[builder(default = 0)]
    pub max_path_len: u8,
    #[builder(default = KeyUsage::ca_default())]
    pub ca_key_usage: KeyUsage,
    #[builder(default = KeyUsage::leaf_default())]
    pub leaf_key_usage: KeyUsage,
    #[builder(default = DEFAULT_RSA_BITS)]
    pub rsa_bits: usize,
    #[builder(default = DEFAULT_CURVE)]
    pub curve: Curve,
}

impl Default for CertConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
