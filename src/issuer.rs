use der::Encode;
use ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::RsaPublicKey;
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::{Certificate, SignatureAlgorithm};
use crate::error::{CertError, Result};
use crate::key::{Curve, EcPrivateKey, PrivateKey};
use crate::tbs_certificate::TbsCertificate;
use crate::template::CertificateTemplate;

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    /// Returns the name placed in the issued certificate's issuer field.
    fn issuer_name(&self) -> Result<Name>;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &PrivateKey;

    /// Returns the issuer's subject key identifier, if it has one.
    fn key_identifier(&self) -> Option<Vec<u8>>;

    /// Issues a certificate for `subject_key` based on `template`.
    ///
    /// The signature algorithm follows this issuer's key family, whatever
    /// the subject's family is.
    fn issue(
        &self,
        template: &CertificateTemplate,
        subject_key: &PrivateKey,
    ) -> Result<Certificate> {
        let signing_key = self.signing_key();
        let signature_algo = SignatureAlgorithm::for_key_algorithm(signing_key.algorithm());
        if signature_algo != template.signature_algorithm {
            debug!(
                requested = ?template.signature_algorithm,
                used = ?signature_algo,
                "issuer key family differs from subject family"
            );
        }

        let tbs_cert = TbsCertificate::from_template(
            template,
            subject_key.public_key_info()?,
            self.issuer_name()?,
            self.key_identifier(),
            signature_algo,
        )?;
        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;

        let signature = sign_data(&tbs_cert_inner.to_der()?, signing_key)?;

        let cert_inner = CertificateInner {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm: signature_algo.into(),
            signature: der::asn1::BitString::from_bytes(&signature)?,
        };

        Certificate::from_der(&cert_inner.to_der()?)
    }
}

// Helper struct for self-signed certificates
struct SelfIssuer<'a> {
    name: Name,
    key: &'a PrivateKey,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> Result<Name> {
        Ok(self.name.clone())
    }

    fn signing_key(&self) -> &PrivateKey {
        self.key
    }

    /// Self-signed certificates carry no authority key identifier.
    fn key_identifier(&self) -> Option<Vec<u8>> {
        None
    }
}

/// A borrowed issuer certificate and its private key.
#[derive(Debug, Clone, Copy)]
pub struct IssuerRef<'a> {
    pub cert: &'a Certificate,
    pub key: &'a PrivateKey,
}

impl<'a> IssuerRef<'a> {
    /// Pairs a certificate with its key, checking that the key's public half
    /// is the certificate's public key.
    pub fn new(cert: &'a Certificate, key: &'a PrivateKey) -> Result<Self> {
        if key.public_key_der()? != cert.public_key_info().to_der()? {
            return Err(CertError::UnsupportedIssuerKeyError(format!(
                "{} key does not belong to issuer {:?}",
                key.algorithm(),
                cert.subject().common_name
            )));
        }
        Ok(Self { cert, key })
    }
}

impl Issuer for IssuerRef<'_> {
    fn issuer_name(&self) -> Result<Name> {
        // The name of the issuer is the subject of the certificate
        Ok(self.cert.subject_name().clone())
    }

    fn signing_key(&self) -> &PrivateKey {
        self.key
    }

    fn key_identifier(&self) -> Option<Vec<u8>> {
        self.cert.subject_key_id().map(<[u8]>::to_vec)
    }
}

/// A signed certificate bundled with its private key.
#[derive(Debug, Clone)]
pub struct CertifiedKey {
    pub cert: Certificate,
    pub key: PrivateKey,
}

impl From<(Certificate, PrivateKey)> for CertifiedKey {
    fn from((cert, key): (Certificate, PrivateKey)) -> Self {
        Self { cert, key }
    }
}

impl Issuer for CertifiedKey {
    fn issuer_name(&self) -> Result<Name> {
        Ok(self.cert.subject_name().clone())
    }

    fn signing_key(&self) -> &PrivateKey {
        &self.key
    }

    fn key_identifier(&self) -> Option<Vec<u8>> {
        self.cert.subject_key_id().map(<[u8]>::to_vec)
    }
}

/// Generates a subject key for `template` and self-signs the certificate
/// with it.
pub fn self_sign(template: &CertificateTemplate) -> Result<(Certificate, PrivateKey)> {
    let subject_key = PrivateKey::generate(&template.key_params())?;
    let self_issuer = SelfIssuer {
        name: template.identity.to_x509_name()?,
        key: &subject_key,
    };
    let cert = self_issuer.issue(template, &subject_key)?;
    info!(
        common_name = %cert.subject().common_name,
        serial = %cert.serial_number(),
        "issued self-signed certificate"
    );
    Ok((cert, subject_key))
}

/// Generates a subject key for `template` and signs the certificate with
/// `issuer_key`, naming `issuer_cert` as issuer.
///
/// Any combination of RSA and EC issuer and subject keys is accepted.
pub fn sign(
    template: &CertificateTemplate,
    issuer_cert: &Certificate,
    issuer_key: &PrivateKey,
) -> Result<(Certificate, PrivateKey)> {
    let issuer = IssuerRef::new(issuer_cert, issuer_key)?;
    let subject_key = PrivateKey::generate(&template.key_params())?;
    let cert = issuer.issue(template, &subject_key)?;
    info!(
        common_name = %cert.subject().common_name,
        issuer = %issuer_cert.subject().common_name,
        serial = %cert.serial_number(),
        "issued certificate"
    );
    Ok((cert, subject_key))
}

/// Signs `data` with `key`: PKCS#1 v1.5 for RSA, ECDSA for EC, both over
/// SHA-256. Returns the signature as it goes into the certificate.
pub fn sign_data(data: &[u8], key: &PrivateKey) -> Result<Vec<u8>> {
    match key {
        PrivateKey::Rsa(private) => {
            debug!("signing with RSA issuer key");
            let signing_key =
                rsa::pkcs1v15::SigningKey::<Sha256>::new(private.as_ref().clone());
            let signature = signing_key
                .try_sign(data)
                .map_err(|e| CertError::SigningError(e.to_string()))?;
            Ok(signature.to_vec())
        }
        PrivateKey::Ec(ec_key) => {
            debug!(curve = %ec_key.curve(), "signing with EC issuer key");
            let prehash = ecdsa_prehash(data, ec_key.curve());
            sign_ecdsa_prehash(&prehash, ec_key).map_err(|e| CertError::SigningError(e.to_string()))
        }
    }
}

fn sign_ecdsa_prehash(
    prehash: &[u8],
    key: &EcPrivateKey,
) -> std::result::Result<Vec<u8>, ecdsa::Error> {
    let der = match key {
        EcPrivateKey::P224(secret) => {
            let signature: p224::ecdsa::Signature =
                p224::ecdsa::SigningKey::from(secret).sign_prehash(prehash)?;
            signature.to_der().as_bytes().to_vec()
        }
        EcPrivateKey::P256(secret) => {
            let signature: p256::ecdsa::Signature =
                p256::ecdsa::SigningKey::from(secret).sign_prehash(prehash)?;
            signature.to_der().as_bytes().to_vec()
        }
        EcPrivateKey::P384(secret) => {
            let signature: p384::ecdsa::Signature =
                p384::ecdsa::SigningKey::from(secret).sign_prehash(prehash)?;
            signature.to_der().as_bytes().to_vec()
        }
        EcPrivateKey::P521(secret) => {
            let signing_key = p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes())?;
            let signature: p521::ecdsa::Signature = signing_key.sign_prehash(prehash)?;
            signature.to_der().as_bytes().to_vec()
        }
    };
    Ok(der)
}

/// SHA-256 digest of `data`, sized for ECDSA on `curve`.
///
/// ECDSA needs at least half the field size; P-521 gets the digest
/// left-padded with zeros, which leaves its integer value unchanged.
fn ecdsa_prehash(data: &[u8], curve: Curve) -> Vec<u8> {
    let digest = Sha256::digest(data);
    let field_size = curve.field_size();
    if digest.len() >= field_size / 2 {
        return digest.to_vec();
    }
    let mut padded = vec![0u8; field_size - digest.len()];
    padded.extend_from_slice(&digest);
    padded
}

/// Verifies `signature` over `data` with the public key in `spki`.
pub fn verify_signature(
    spki: &SubjectPublicKeyInfoOwned,
    data: &[u8],
    signature: &[u8],
) -> Result<()> {
    let verification = |e: ecdsa::Error| CertError::VerificationError(e.to_string());
    match spki.algorithm.oid {
        const_oid::db::rfc5912::RSA_ENCRYPTION => {
            let public = RsaPublicKey::from_public_key_der(&spki.to_der()?)
                .map_err(|e| CertError::DecodingError(e.to_string()))?;
            let verifying_key = rsa::pkcs1v15::VerifyingKey::<Sha256>::new(public);
            let signature = rsa::pkcs1v15::Signature::try_from(signature).map_err(verification)?;
            verifying_key.verify(data, &signature).map_err(verification)
        }
        const_oid::db::rfc5912::ID_EC_PUBLIC_KEY => {
            let curve = spki
                .algorithm
                .parameters
                .as_ref()
                .and_then(|params| params.decode_as::<const_oid::ObjectIdentifier>().ok())
                .and_then(|oid| Curve::from_oid(&oid))
                .ok_or_else(|| {
                    CertError::UnsupportedKeyTypeError("unsupported EC curve".to_string())
                })?;
            let point = spki.subject_public_key.raw_bytes();
            let prehash = ecdsa_prehash(data, curve);
            match curve {
                Curve::P224 => {
                    let key = p224::ecdsa::VerifyingKey::from_sec1_bytes(point).map_err(verification)?;
                    let sig = p224::ecdsa::Signature::from_der(signature).map_err(verification)?;
                    key.verify_prehash(&prehash, &sig).map_err(verification)
                }
                Curve::P256 => {
                    let key = p256::ecdsa::VerifyingKey::from_sec1_bytes(point).map_err(verification)?;
                    let sig = p256::ecdsa::Signature::from_der(signature).map_err(verification)?;
                    key.verify_prehash(&prehash, &sig).map_err(verification)
                }
                Curve::P384 => {
                    let key = p384::ecdsa::VerifyingKey::from_sec1_bytes(point).map_err(verification)?;
                    let sig = p384::ecdsa::Signature::from_der(signature).map_err(verification)?;
                    key.verify_prehash(&prehash, &sig).map_err(verification)
                }
                Curve::P521 => {
                    let key = p521::ecdsa::VerifyingKey::from_sec1_bytes(point).map_err(verification)?;
                    let sig = p521::ecdsa::Signature::from_der(signature).map_err(verification)?;
                    key.verify_prehash(&prehash, &sig).map_err(verification)
                }
            }
        }
        other => Err(CertError::UnsupportedKeyTypeError(format!(
            "unsupported public key algorithm {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::extensions::KeyUsage;
    use crate::cert::params::Identity;
    use crate::key::KeyParams;
    use crate::template::{build_ca_template, build_leaf_template};

    fn root(algo: &str, params: KeyParams) -> (Certificate, PrivateKey) {
        let template = build_ca_template(
            Identity::new("root1", "org1", "1234", "US"),
            algo,
            1,
            0,
            KeyUsage::ca_default(),
        )
        .unwrap()
        .with_key_params(params)
        .unwrap();
        self_sign(&template).unwrap()
    }

    #[test]
    fn test_prehash_padding() {
        assert_eq!(ecdsa_prehash(b"abc", Curve::P256).len(), 32);
        assert_eq!(ecdsa_prehash(b"abc", Curve::P224).len(), 32);
        let padded = ecdsa_prehash(b"abc", Curve::P521);
        assert_eq!(padded.len(), 66);
        assert!(padded[..34].iter().all(|b| *b == 0));
        assert_eq!(&padded[34..], Sha256::digest(b"abc").as_slice());
    }

    #[test]
    fn test_sign_and_verify_every_curve() {
        for curve in Curve::ALL {
            let key = PrivateKey::generate_ec_on(curve);
            let spki = key.public_key_info().unwrap();
            let signature = sign_data(b"payload", &key).unwrap();
            verify_signature(&spki, b"payload", &signature).unwrap();
            assert!(matches!(
                verify_signature(&spki, b"tampered", &signature),
                Err(CertError::VerificationError(_))
            ));
        }
    }

    #[test]
    fn test_self_signed_root_verifies_under_itself() {
        let (cert, _) = root("EC", KeyParams::Ec(Curve::P256));
        cert.verify_signed_by(&cert).unwrap();
        assert_eq!(cert.issuer_name(), cert.subject_name());
        assert!(cert.subject_key_id().is_some());
        assert!(cert.authority_key_id().is_none());
    }

    #[test]
    fn test_issuer_key_must_match_certificate() {
        let (root_cert, _) = root("EC", KeyParams::Ec(Curve::P256));
        let stranger = PrivateKey::generate_ec_on(Curve::P256);
        let template = build_leaf_template(
            Identity::new("leaf1", "org1", "2", "US"),
            "EC",
            1,
            KeyUsage::leaf_default(),
        )
        .unwrap();
        let err = sign(&template, &root_cert, &stranger).unwrap_err();
        assert!(matches!(err, CertError::UnsupportedIssuerKeyError(_)));
    }

    #[test]
    fn test_leaf_gets_authority_key_id_of_root() {
        let (root_cert, root_key) = root("EC", KeyParams::Ec(Curve::P384));
        let template = build_leaf_template(
            Identity::new("leaf1", "org1", "2", "US"),
            "EC",
            1,
            KeyUsage::leaf_default(),
        )
        .unwrap();
        let (leaf, _) = sign(&template, &root_cert, &root_key).unwrap();
        assert_eq!(leaf.authority_key_id(), root_cert.subject_key_id());
        assert!(leaf.subject_key_id().is_none());
    }

    #[test]
    fn test_certified_key_issues() {
        let issuer: CertifiedKey = root("RSA", KeyParams::Rsa { bits: 1024 }).into();
        let template = build_leaf_template(
            Identity::new("leaf1", "", "3", ""),
            "EC",
            1,
            KeyUsage::leaf_default(),
        )
        .unwrap();
        let subject_key = PrivateKey::generate(&template.key_params()).unwrap();
        let leaf = issuer.issue(&template, &subject_key).unwrap();
        assert_eq!(leaf.signature_algorithm(), Some(SignatureAlgorithm::Sha256WithRSA));
        leaf.verify_signed_by(&issuer.cert).unwrap();
    }
}
