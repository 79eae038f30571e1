//! One-call helpers for root CAs and leaf certificates.
//!
//! ```rust,no_run
//! use certsmith::cert::params::Identity;
//! use certsmith::generator::CertGenerator;
//!
//! # fn main() -> certsmith::error::Result<()> {
//! let generator = CertGenerator::default();
//! let (root, root_key) =
//!     generator.ec_root_ca(Identity::new("root1", "org1", "1", "US"), "P256")?;
//! let (leaf, _leaf_key) = generator.rsa_leaf_cert(
//!     Identity::new("leaf1", "org1", "2", "US"),
//!     2048,
//!     &root,
//!     &root_key,
//! )?;
//! leaf.verify_signed_by(&root)?;
//! # Ok(())
//! # }
//! ```

use crate::cert::Certificate;
use crate::cert::extensions::KeyUsage;
use crate::cert::params::Identity;
use crate::config::CertConfig;
use crate::error::Result;
use crate::issuer::{self_sign, sign};
use crate::key::{Curve, KeyAlgorithm, KeyParams, PrivateKey};
use crate::template::{CertificateTemplate, build_ca_template, build_leaf_template};

/// Generates certificates using the defaults in a [`CertConfig`].
#[derive(Clone, Debug, Default)]
pub struct CertGenerator {
    config: CertConfig,
}

impl CertGenerator {
    pub fn new(config: CertConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CertConfig {
        &self.config
    }

    /// CA template with the configured validity, path length, key usage and
    /// key parameters for `algorithm_hint`.
    pub fn ca_template(
        &self,
        identity: Identity,
        algorithm_hint: &str,
    ) -> Result<CertificateTemplate> {
        let template = build_ca_template(
            identity,
            algorithm_hint,
            self.config.validity_years,
            self.config.max_path_len,
            self.config.ca_key_usage,
        )?;
        self.with_default_params(template)
    }

    /// Leaf template with the configured validity, key usage and key
    /// parameters for `algorithm_hint`.
    pub fn leaf_template(
        &self,
        identity: Identity,
        algorithm_hint: &str,
    ) -> Result<CertificateTemplate> {
        let template = build_leaf_template(
            identity,
            algorithm_hint,
            self.config.validity_years,
            self.config.leaf_key_usage,
        )?;
        self.with_default_params(template)
    }

    pub fn rsa_root_ca(&self, identity: Identity, bits: usize) -> Result<(Certificate, PrivateKey)> {
        self.custom_rsa_root_ca(
            identity,
            bits,
            self.config.validity_years,
            self.config.max_path_len,
            self.config.ca_key_usage,
        )
    }

    pub fn custom_rsa_root_ca(
        &self,
        identity: Identity,
        bits: usize,
        validity_years: u32,
        max_path_len: u8,
        key_usage: KeyUsage,
    ) -> Result<(Certificate, PrivateKey)> {
        let template = build_ca_template(identity, "RSA", validity_years, max_path_len, key_usage)?
            .with_key_params(KeyParams::Rsa { bits })?;
        self_sign(&template)
    }

    /// Self-signed EC root. Unknown curve names fall back to P224.
    pub fn ec_root_ca(&self, identity: Identity, curve: &str) -> Result<(Certificate, PrivateKey)> {
        self.custom_ec_root_ca(
            identity,
            curve,
            self.config.validity_years,
            self.config.max_path_len,
            self.config.ca_key_usage,
        )
    }

    pub fn custom_ec_root_ca(
        &self,
        identity: Identity,
        curve: &str,
        validity_years: u32,
        max_path_len: u8,
        key_usage: KeyUsage,
    ) -> Result<(Certificate, PrivateKey)> {
        let template = build_ca_template(identity, "EC", validity_years, max_path_len, key_usage)?
            .with_key_params(KeyParams::Ec(Curve::from_name(curve)))?;
        self_sign(&template)
    }

    /// RSA leaf signed by `issuer_cert`, whose key may be of either family.
    pub fn rsa_leaf_cert(
        &self,
        identity: Identity,
        bits: usize,
        issuer_cert: &Certificate,
        issuer_key: &PrivateKey,
    ) -> Result<(Certificate, PrivateKey)> {
        self.custom_rsa_leaf_cert(
            identity,
            self.config.validity_years,
            bits,
            issuer_cert,
            issuer_key,
        )
    }

    pub fn custom_rsa_leaf_cert(
        &self,
        identity: Identity,
        validity_years: u32,
        bits: usize,
        issuer_cert: &Certificate,
        issuer_key: &PrivateKey,
    ) -> Result<(Certificate, PrivateKey)> {
        let template =
            build_leaf_template(identity, "RSA", validity_years, self.config.leaf_key_usage)?
                .with_key_params(KeyParams::Rsa { bits })?;
        sign(&template, issuer_cert, issuer_key)
    }

    /// EC leaf signed by `issuer_cert`. Unknown curve names fall back to P224.
    pub fn ec_leaf_cert(
        &self,
        identity: Identity,
        curve: &str,
        issuer_cert: &Certificate,
        issuer_key: &PrivateKey,
    ) -> Result<(Certificate, PrivateKey)> {
        self.custom_ec_leaf_cert(
            identity,
            curve,
            self.config.validity_years,
            issuer_cert,
            issuer_key,
        )
    }

    pub fn custom_ec_leaf_cert(
        &self,
        identity: Identity,
        curve: &str,
        validity_years: u32,
        issuer_cert: &Certificate,
        issuer_key: &PrivateKey,
    ) -> Result<(Certificate, PrivateKey)> {
        let template =
            build_leaf_template(identity, "EC", validity_years, self.config.leaf_key_usage)?
                .with_key_params(KeyParams::Ec(Curve::from_name(curve)))?;
        sign(&template, issuer_cert, issuer_key)
    }

    fn with_default_params(&self, template: CertificateTemplate) -> Result<CertificateTemplate> {
        let params = match template.algorithm() {
            KeyAlgorithm::Rsa => KeyParams::Rsa {
                bits: self.config.rsa_bits,
            },
            KeyAlgorithm::Ec => KeyParams::Ec(self.config.curve),
        };
        template.with_key_params(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::extensions::KeyUsages;

    fn identity(cn: &str, serial: &str) -> Identity {
        Identity::new(cn, "orgunit1", serial, "US")
    }

    #[test]
    fn test_templates_follow_config() {
        let config = CertConfig::builder()
            .validity_years(5)
            .max_path_len(2)
            .rsa_bits(3072)
            .curve(Curve::P384)
            .build();
        let generator = CertGenerator::new(config);

        let ca = generator.ca_template(identity("ca", "1"), "rsa").unwrap();
        assert_eq!(ca.constraints.max_path_len, Some(2));
        assert_eq!(ca.key_params(), KeyParams::Rsa { bits: 3072 });

        let leaf = generator.leaf_template(identity("leaf", "2"), "ec").unwrap();
        assert_eq!(leaf.key_params(), KeyParams::Ec(Curve::P384));
        assert!(leaf.key_usage.contains(KeyUsages::KeyEncipherment));
        assert_eq!(
            leaf.validity.not_after.year() - leaf.validity.not_before.year(),
            5
        );
    }

    #[test]
    fn test_ec_root_with_unknown_curve_uses_p224() {
        let (root, key) = CertGenerator::default()
            .ec_root_ca(identity("root1", "1"), "P512")
            .unwrap();
        assert_eq!(key.params(), KeyParams::Ec(Curve::P224));
        assert!(root.is_ca());
    }

    #[test]
    fn test_custom_rsa_root() {
        let (root, key) = CertGenerator::default()
            .custom_rsa_root_ca(
                identity("root1", "7"),
                1024,
                2,
                3,
                KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign),
            )
            .unwrap();
        assert_eq!(key.params(), KeyParams::Rsa { bits: 1024 });
        assert_eq!(root.max_path_len(), Some(3));
        assert!(root.key_usage().unwrap().contains(KeyUsages::CRLSign));
    }

    #[test]
    fn test_ec_leaf_under_rsa_root() {
        let generator = CertGenerator::default();
        let (root, root_key) = generator.rsa_root_ca(identity("root1", "1"), 1024).unwrap();
        let (leaf, leaf_key) = generator
            .ec_leaf_cert(identity("leaf1", "2"), "p521", &root, &root_key)
            .unwrap();
        assert_eq!(leaf_key.params(), KeyParams::Ec(Curve::P521));
        assert!(!leaf.is_ca());
        leaf.verify_signed_by(&root).unwrap();
    }
}
