pub mod extensions;
pub mod params;

use der::{Decode, Encode};
use extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectKeyIdentifier,
    ToAndFromX509Extension,
};
use params::{Constraints, Identity, Validity};
use rsa::BigUint;
use time::OffsetDateTime;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::error::{CertError, Result};
use crate::key::KeyAlgorithm;

/// Represents the supported signature algorithms for certificates.
///
/// Both hash with SHA-256; the family decides the primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption (PKCS#1 v1.5).
    Sha256WithRSA,
    /// ECDSA with SHA-256.
    EcdsaWithSha256,
}

impl SignatureAlgorithm {
    /// The signature algorithm used for keys of the given family.
    pub fn for_key_algorithm(algorithm: KeyAlgorithm) -> Self {
        match algorithm {
            KeyAlgorithm::Rsa => SignatureAlgorithm::Sha256WithRSA,
            KeyAlgorithm::Ec => SignatureAlgorithm::EcdsaWithSha256,
        }
    }

    pub fn key_algorithm(&self) -> KeyAlgorithm {
        match self {
            SignatureAlgorithm::Sha256WithRSA => KeyAlgorithm::Rsa,
            SignatureAlgorithm::EcdsaWithSha256 => KeyAlgorithm::Ec,
        }
    }

    pub fn from_algorithm_identifier(algorithm: &AlgorithmIdentifierOwned) -> Result<Self> {
        match algorithm.oid {
            const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION => {
                Ok(SignatureAlgorithm::Sha256WithRSA)
            }
            const_oid::db::rfc5912::ECDSA_WITH_SHA_256 => Ok(SignatureAlgorithm::EcdsaWithSha256),
            other => Err(CertError::DecodingError(format!(
                "unsupported signature algorithm {other}"
            ))),
        }
    }
}

impl From<SignatureAlgorithm> for AlgorithmIdentifierOwned {
    /// RSA carries explicit NULL parameters (RFC 4055); ECDSA carries none
    /// (RFC 5758).
    fn from(value: SignatureAlgorithm) -> Self {
        match value {
            SignatureAlgorithm::Sha256WithRSA => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                parameters: Some(der::Any::null()),
            },
            SignatureAlgorithm::EcdsaWithSha256 => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
                parameters: None,
            },
        }
    }
}

/// A signed X.509 certificate together with its parsed fields.
///
/// Created once from DER and never mutated. It is only useful as an issuer
/// for further signing or as input to serialization.
#[derive(Debug, Clone)]
pub struct Certificate {
    der: Vec<u8>,
    inner: x509_cert::Certificate,
    subject: Identity,
    issuer: Identity,
    serial_number: BigUint,
    validity: Validity,
    constraints: Constraints,
    key_usage: Option<KeyUsage>,
    extended_key_usage: Option<ExtendedKeyUsage>,
    subject_key_id: Option<Vec<u8>>,
    authority_key_id: Option<Vec<u8>>,
    signature_algorithm: Option<SignatureAlgorithm>,
}

impl Certificate {
    /// Parses a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = x509_cert::Certificate::from_der(der)
            .map_err(|e| CertError::DecodingError(e.to_string()))?;
        let tbs = &inner.tbs_certificate;

        let mut constraints = Constraints::default();
        let mut key_usage = None;
        let mut extended_key_usage = None;
        let mut subject_key_id = None;
        let mut authority_key_id = None;

        for ext in tbs.extensions.iter().flatten() {
            let value = ext.extn_value.as_bytes();
            let oid = ext.extn_id;
            if oid == BasicConstraints::OID {
                let bc = BasicConstraints::from_x509_extension_value(value)?;
                constraints = Constraints {
                    is_ca: bc.is_ca,
                    basic_constraints_valid: true,
                    max_path_len: bc.max_path_length,
                };
            } else if oid == KeyUsage::OID {
                key_usage = Some(KeyUsage::from_x509_extension_value(value)?);
            } else if oid == ExtendedKeyUsage::OID {
                extended_key_usage = Some(ExtendedKeyUsage::from_x509_extension_value(value)?);
            } else if oid == SubjectKeyIdentifier::OID {
                subject_key_id = Some(SubjectKeyIdentifier::from_x509_extension_value(value)?.0);
            } else if oid == AuthorityKeyIdentifier::OID {
                authority_key_id =
                    Some(AuthorityKeyIdentifier::from_x509_extension_value(value)?.key_identifier);
            }
        }

        Ok(Self {
            der: der.to_vec(),
            subject: Identity::from_x509_name(&tbs.subject)?,
            issuer: Identity::from_x509_name(&tbs.issuer)?,
            serial_number: BigUint::from_bytes_be(tbs.serial_number.as_bytes()),
            validity: Validity::from_x509(&tbs.validity)?,
            signature_algorithm: SignatureAlgorithm::from_algorithm_identifier(
                &inner.signature_algorithm,
            )
            .ok(),
            constraints,
            key_usage,
            extended_key_usage,
            subject_key_id,
            authority_key_id,
            inner,
        })
    }

    /// Parses a PEM-encoded certificate.
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        crate::pem_utils::certificate_from_pem(pem)
    }

    /// The DER bytes exactly as signed.
    pub fn to_der(&self) -> &[u8] {
        &self.der
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> String {
        crate::pem_utils::der_to_pem(&self.der, crate::pem_utils::CERTIFICATE_LABEL)
    }

    /// The underlying `x509-cert` structure.
    pub fn inner(&self) -> &x509_cert::Certificate {
        &self.inner
    }

    pub fn subject(&self) -> &Identity {
        &self.subject
    }

    pub fn issuer(&self) -> &Identity {
        &self.issuer
    }

    /// Raw subject name, byte-identical to what was signed.
    pub fn subject_name(&self) -> &x509_cert::name::Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn issuer_name(&self) -> &x509_cert::name::Name {
        &self.inner.tbs_certificate.issuer
    }

    pub fn serial_number(&self) -> &BigUint {
        &self.serial_number
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }

    pub fn not_before(&self) -> OffsetDateTime {
        self.validity.not_before
    }

    pub fn not_after(&self) -> OffsetDateTime {
        self.validity.not_after
    }

    pub fn constraints(&self) -> Constraints {
        self.constraints
    }

    pub fn is_ca(&self) -> bool {
        self.constraints.is_ca
    }

    pub fn max_path_len(&self) -> Option<u8> {
        self.constraints.max_path_len
    }

    pub fn key_usage(&self) -> Option<KeyUsage> {
        self.key_usage
    }

    pub fn extended_key_usage(&self) -> Option<&ExtendedKeyUsage> {
        self.extended_key_usage.as_ref()
    }

    pub fn subject_key_id(&self) -> Option<&[u8]> {
        self.subject_key_id.as_deref()
    }

    pub fn authority_key_id(&self) -> Option<&[u8]> {
        self.authority_key_id.as_deref()
    }

    /// Algorithm of the signature over this certificate (chosen by the
    /// issuer's key). `None` for algorithms this crate does not sign with,
    /// such as ecdsa-with-SHA384 on externally made CAs; those certificates
    /// can still act as issuers.
    pub fn signature_algorithm(&self) -> Option<SignatureAlgorithm> {
        self.signature_algorithm
    }

    /// Raw signature algorithm identifier, whatever the algorithm.
    pub fn signature_algorithm_identifier(&self) -> &AlgorithmIdentifierOwned {
        &self.inner.signature_algorithm
    }

    pub fn public_key_info(&self) -> &SubjectPublicKeyInfoOwned {
        &self.inner.tbs_certificate.subject_public_key_info
    }

    /// Family of the subject public key.
    pub fn public_key_algorithm(&self) -> Result<KeyAlgorithm> {
        match self.public_key_info().algorithm.oid {
            const_oid::db::rfc5912::RSA_ENCRYPTION => Ok(KeyAlgorithm::Rsa),
            const_oid::db::rfc5912::ID_EC_PUBLIC_KEY => Ok(KeyAlgorithm::Ec),
            other => Err(CertError::UnsupportedKeyTypeError(format!(
                "unsupported public key algorithm {other}"
            ))),
        }
    }

    /// Checks this certificate's signature against `issuer`'s public key.
    ///
    /// This checks a single link only; it does not validate a chain.
    pub fn verify_signed_by(&self, issuer: &Certificate) -> Result<()> {
        if self.signature_algorithm.is_none() {
            return Err(CertError::UnsupportedAlgorithmError(format!(
                "cannot verify signature algorithm {}",
                self.inner.signature_algorithm.oid
            )));
        }
        let tbs = self.inner.tbs_certificate.to_der()?;
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            CertError::DecodingError("signature has unused bits".to_string())
        })?;
        crate::issuer::verify_signature(issuer.public_key_info(), &tbs, signature)
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}
