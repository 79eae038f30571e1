//! Unsigned certificate templates for CA and leaf certificates.

use rsa::BigUint;
use tracing::debug;

use crate::cert::SignatureAlgorithm;
use crate::cert::extensions::{ExtendedKeyUsage, KeyUsage};
use crate::cert::params::{Constraints, Identity, Validity};
use crate::config::{DEFAULT_CURVE, DEFAULT_RSA_BITS};
use crate::error::{CertError, Result};
use crate::key::{KeyAlgorithm, KeyParams};

/// RFC 5280 limits serial numbers to 20 octets of a positive INTEGER.
const MAX_SERIAL_BITS: usize = 20 * 8 - 1;

/// Everything that goes into a certificate before it is signed.
///
/// # Fields
/// * `identity` - Subject identity, copied verbatim.
/// * `serial_number` - Certificate serial, parsed from the identity's serial.
/// * `validity` - Starts when the template is built.
/// * `constraints` - CA flag, basic-constraints presence and path length.
/// * `key_usage` - Key usage bits.
/// * `extended_key_usage` - Always `anyExtendedKeyUsage`.
/// * `signature_algorithm` - Derived from the subject key family.
#[derive(Clone, Debug)]
pub struct CertificateTemplate {
    pub identity: Identity,
    pub serial_number: BigUint,
    pub validity: Validity,
    pub constraints: Constraints,
    pub key_usage: KeyUsage,
    pub extended_key_usage: ExtendedKeyUsage,
    pub signature_algorithm: SignatureAlgorithm,
    key_params: KeyParams,
}

impl CertificateTemplate {
    /// Family of the subject key this template will be issued for.
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.signature_algorithm.key_algorithm()
    }

    /// Parameters used to generate the subject key when signing.
    pub fn key_params(&self) -> KeyParams {
        self.key_params
    }

    /// Overrides the subject key size or curve. The family must match the
    /// algorithm the template was built for.
    pub fn with_key_params(mut self, params: KeyParams) -> Result<Self> {
        if params.algorithm() != self.algorithm() {
            return Err(CertError::UnsupportedAlgorithmError(format!(
                "{} key parameters for a {} template",
                params.algorithm(),
                self.algorithm()
            )));
        }
        self.key_params = params;
        Ok(self)
    }

    fn new(
        identity: Identity,
        algorithm_hint: &str,
        validity_years: u32,
        constraints: Constraints,
        key_usage: KeyUsage,
    ) -> Result<Self> {
        let algorithm: KeyAlgorithm = algorithm_hint.parse()?;
        let serial_number = parse_serial_number(&identity.serial_number)?;
        let validity = Validity::for_years(validity_years)?;
        let key_params = match algorithm {
            KeyAlgorithm::Rsa => KeyParams::Rsa {
                bits: DEFAULT_RSA_BITS,
            },
            KeyAlgorithm::Ec => KeyParams::Ec(DEFAULT_CURVE),
        };
        debug!(
            common_name = %identity.common_name,
            %algorithm,
            is_ca = constraints.is_ca,
            "built certificate template"
        );
        Ok(Self {
            identity,
            serial_number,
            validity,
            constraints,
            key_usage,
            extended_key_usage: ExtendedKeyUsage::any(),
            signature_algorithm: SignatureAlgorithm::for_key_algorithm(algorithm),
            key_params,
        })
    }
}

/// Builds a CA template.
///
/// `algorithm_hint` is `"RSA"` or `"EC"` (case-insensitive) and only picks
/// the signature algorithm. A `max_path_len` of zero means the CA may sign
/// leaf certificates only.
pub fn build_ca_template(
    identity: Identity,
    algorithm_hint: &str,
    validity_years: u32,
    max_path_len: u8,
    key_usage: KeyUsage,
) -> Result<CertificateTemplate> {
    CertificateTemplate::new(
        identity,
        algorithm_hint,
        validity_years,
        Constraints::ca(max_path_len),
        key_usage,
    )
}

/// Builds a leaf template: not a CA and no basic constraints extension.
pub fn build_leaf_template(
    identity: Identity,
    algorithm_hint: &str,
    validity_years: u32,
    key_usage: KeyUsage,
) -> Result<CertificateTemplate> {
    CertificateTemplate::new(
        identity,
        algorithm_hint,
        validity_years,
        Constraints::leaf(),
        key_usage,
    )
}

/// Parses a decimal serial number into an arbitrary-precision integer.
pub fn parse_serial_number(serial: &str) -> Result<BigUint> {
    if serial.is_empty() || !serial.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CertError::InvalidSerialNumberError(format!(
            "{serial:?} is not a decimal integer"
        )));
    }
    let value = BigUint::parse_bytes(serial.as_bytes(), 10).ok_or_else(|| {
        CertError::InvalidSerialNumberError(format!("{serial:?} is not a decimal integer"))
    })?;
    if value.bits() > MAX_SERIAL_BITS {
        return Err(CertError::InvalidSerialNumberError(format!(
            "{serial} does not fit in 20 octets"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::extensions::KeyUsages;
    use proptest::prelude::*;

    fn identity(serial: &str) -> Identity {
        Identity::new("cname1", "orgunit1", serial, "US")
    }

    #[test]
    fn test_ca_template_fields() {
        let template =
            build_ca_template(identity("42"), "ec", 2, 0, KeyUsage::ca_default()).unwrap();
        assert!(template.constraints.is_ca);
        assert!(template.constraints.basic_constraints_valid);
        assert!(template.constraints.max_path_len_zero());
        assert_eq!(template.serial_number, BigUint::from(42u32));
        assert_eq!(template.signature_algorithm, SignatureAlgorithm::EcdsaWithSha256);
        assert_eq!(template.key_params(), KeyParams::Ec(DEFAULT_CURVE));
        assert_eq!(template.extended_key_usage, ExtendedKeyUsage::any());
        assert!(template.validity.not_after > template.validity.not_before);
    }

    #[test]
    fn test_leaf_template_fields() {
        let template =
            build_leaf_template(identity("1"), "RSA", 1, KeyUsage::leaf_default()).unwrap();
        assert!(!template.constraints.is_ca);
        assert!(!template.constraints.basic_constraints_valid);
        assert_eq!(template.signature_algorithm, SignatureAlgorithm::Sha256WithRSA);
        assert!(template.key_usage.contains(KeyUsages::DigitalSignature));
    }

    #[test]
    fn test_unknown_algorithm() {
        let err = build_leaf_template(identity("1"), "DSA", 1, KeyUsage::leaf_default())
            .unwrap_err();
        assert!(matches!(err, CertError::UnsupportedAlgorithmError(_)));
    }

    #[test]
    fn test_non_numeric_serial() {
        for serial in ["", "abc", "-5", "1.5", "12 3"] {
            let err = build_ca_template(identity(serial), "RSA", 1, 0, KeyUsage::ca_default())
                .unwrap_err();
            assert!(matches!(err, CertError::InvalidSerialNumberError(_)));
        }
    }

    #[test]
    fn test_serial_larger_than_u64() {
        let serial = "123456789012345678901234567890";
        let value = parse_serial_number(serial).unwrap();
        assert_eq!(value.to_str_radix(10), serial);
    }

    #[test]
    fn test_serial_over_twenty_octets() {
        let serial = "9".repeat(60);
        assert!(matches!(
            parse_serial_number(&serial),
            Err(CertError::InvalidSerialNumberError(_))
        ));
    }

    #[test]
    fn test_key_params_family_must_match() {
        let template =
            build_leaf_template(identity("1"), "EC", 1, KeyUsage::leaf_default()).unwrap();
        let err = template
            .clone()
            .with_key_params(KeyParams::Rsa { bits: 2048 })
            .unwrap_err();
        assert!(matches!(err, CertError::UnsupportedAlgorithmError(_)));
        let template = template
            .with_key_params(KeyParams::Ec(crate::key::Curve::P384))
            .unwrap();
        assert_eq!(template.key_params(), KeyParams::Ec(crate::key::Curve::P384));
    }

    proptest! {
        #[test]
        fn serial_decimal_round_trip(value in any::<u128>()) {
            let parsed = parse_serial_number(&value.to_string()).unwrap();
            prop_assert_eq!(parsed.to_str_radix(10), value.to_string());
        }
    }
}
