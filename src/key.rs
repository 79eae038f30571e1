use core::fmt;
use core::str::FromStr;

use const_oid::{AssociatedOid, ObjectIdentifier};
use der::Encode;
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::{debug, warn};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::error::{CertError, Result};

/// Smallest RSA modulus accepted by [`PrivateKey::generate_rsa`].
pub const MIN_RSA_BITS: usize = 512;

/// The two key families a certificate key can belong to.
///
/// Parsed case-insensitively from `"RSA"` or `"EC"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    Rsa,
    Ec,
}

impl FromStr for KeyAlgorithm {
    type Err = CertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "RSA" => Ok(KeyAlgorithm::Rsa),
            "EC" => Ok(KeyAlgorithm::Ec),
            _ => Err(CertError::UnsupportedAlgorithmError(format!(
                "algorithm must be EC or RSA, got {s:?}"
            ))),
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAlgorithm::Rsa => f.write_str("RSA"),
            KeyAlgorithm::Ec => f.write_str("EC"),
        }
    }
}

/// NIST prime curves supported for EC keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Curve {
    /// The fallback curve for unrecognized names.
    #[default]
    P224,
    P256,
    P384,
    P521,
}

impl Curve {
    pub const ALL: [Curve; 4] = [Curve::P224, Curve::P256, Curve::P384, Curve::P521];

    /// Looks a curve up by name, case-insensitively.
    ///
    /// Unknown or empty names fall back to [`Curve::P224`] instead of failing.
    /// Use the [`FromStr`] implementation for a lookup that rejects them.
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            warn!(curve = name, "unrecognized curve name, falling back to P224");
            Curve::P224
        })
    }

    /// Canonical name, e.g. `"P256"`.
    pub fn name(&self) -> &'static str {
        match self {
            Curve::P224 => "P224",
            Curve::P256 => "P256",
            Curve::P384 => "P384",
            Curve::P521 => "P521",
        }
    }

    /// The named-curve OID carried in SPKI and SEC1 parameters.
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            Curve::P224 => p224::NistP224::OID,
            Curve::P256 => p256::NistP256::OID,
            Curve::P384 => p384::NistP384::OID,
            Curve::P521 => p521::NistP521::OID,
        }
    }

    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        Curve::ALL.into_iter().find(|curve| curve.oid() == *oid)
    }

    /// Size of a scalar for this curve, in bytes.
    pub fn field_size(&self) -> usize {
        match self {
            Curve::P224 => 28,
            Curve::P256 => 32,
            Curve::P384 => 48,
            Curve::P521 => 66,
        }
    }
}

impl FromStr for Curve {
    type Err = CertError;

    /// Strict lookup: unknown names are an error.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "P224" => Ok(Curve::P224),
            "P256" => Ok(Curve::P256),
            "P384" => Ok(Curve::P384),
            "P521" => Ok(Curve::P521),
            _ => Err(CertError::UnsupportedAlgorithmError(format!(
                "unknown curve {s:?}"
            ))),
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters for generating a keypair: the family plus its size or curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyParams {
    Rsa { bits: usize },
    Ec(Curve),
}

impl KeyParams {
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            KeyParams::Rsa { .. } => KeyAlgorithm::Rsa,
            KeyParams::Ec(_) => KeyAlgorithm::Ec,
        }
    }
}

/// An EC private key on one of the supported curves.
#[derive(Clone)]
pub enum EcPrivateKey {
    P224(p224::SecretKey),
    P256(p256::SecretKey),
    P384(p384::SecretKey),
    P521(p521::SecretKey),
}

impl EcPrivateKey {
    pub fn curve(&self) -> Curve {
        match self {
            EcPrivateKey::P224(_) => Curve::P224,
            EcPrivateKey::P256(_) => Curve::P256,
            EcPrivateKey::P384(_) => Curve::P384,
            EcPrivateKey::P521(_) => Curve::P521,
        }
    }

    /// SEC1 `ECPrivateKey` DER encoding, including the curve parameters.
    pub fn to_sec1_der(&self) -> Result<Vec<u8>> {
        let der = match self {
            EcPrivateKey::P224(key) => key.to_sec1_der(),
            EcPrivateKey::P256(key) => key.to_sec1_der(),
            EcPrivateKey::P384(key) => key.to_sec1_der(),
            EcPrivateKey::P521(key) => key.to_sec1_der(),
        }
        .map_err(|e| CertError::EncodingError(e.to_string()))?;
        Ok(der.to_vec())
    }

    /// Decodes a SEC1 `ECPrivateKey`, trying each supported curve in turn.
    pub fn from_sec1_der(der: &[u8]) -> Result<Self> {
        if let Ok(key) = p224::SecretKey::from_sec1_der(der) {
            return Ok(EcPrivateKey::P224(key));
        }
        if let Ok(key) = p256::SecretKey::from_sec1_der(der) {
            return Ok(EcPrivateKey::P256(key));
        }
        if let Ok(key) = p384::SecretKey::from_sec1_der(der) {
            return Ok(EcPrivateKey::P384(key));
        }
        if let Ok(key) = p521::SecretKey::from_sec1_der(der) {
            return Ok(EcPrivateKey::P521(key));
        }
        Err(CertError::UnsupportedKeyTypeError(
            "EC private key is not on P224, P256, P384 or P521".to_string(),
        ))
    }

    fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        use pkcs8::DecodePrivateKey;

        if let Ok(key) = p224::SecretKey::from_pkcs8_der(der) {
            return Ok(EcPrivateKey::P224(key));
        }
        if let Ok(key) = p256::SecretKey::from_pkcs8_der(der) {
            return Ok(EcPrivateKey::P256(key));
        }
        if let Ok(key) = p384::SecretKey::from_pkcs8_der(der) {
            return Ok(EcPrivateKey::P384(key));
        }
        if let Ok(key) = p521::SecretKey::from_pkcs8_der(der) {
            return Ok(EcPrivateKey::P521(key));
        }
        Err(CertError::UnsupportedKeyTypeError(
            "PKCS#8 EC key is not on P224, P256, P384 or P521".to_string(),
        ))
    }

    fn public_key_info(&self) -> std::result::Result<SubjectPublicKeyInfoOwned, x509_cert::spki::Error> {
        match self {
            EcPrivateKey::P224(key) => SubjectPublicKeyInfoOwned::from_key(key.public_key()),
            EcPrivateKey::P256(key) => SubjectPublicKeyInfoOwned::from_key(key.public_key()),
            EcPrivateKey::P384(key) => SubjectPublicKeyInfoOwned::from_key(key.public_key()),
            EcPrivateKey::P521(key) => SubjectPublicKeyInfoOwned::from_key(key.public_key()),
        }
    }
}

impl fmt::Debug for EcPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcPrivateKey")
            .field("curve", &self.curve())
            .finish_non_exhaustive()
    }
}

/// A private key of either supported family. The public half is derived.
///
/// Returned to the caller that requested it; nothing else keeps a reference.
#[derive(Clone)]
pub enum PrivateKey {
    Rsa(Box<RsaPrivateKey>),
    Ec(EcPrivateKey),
}

impl PrivateKey {
    /// Generates a fresh keypair from the platform's secure random source.
    pub fn generate(params: &KeyParams) -> Result<Self> {
        match params {
            KeyParams::Rsa { bits } => Self::generate_rsa(*bits),
            KeyParams::Ec(curve) => Ok(Self::generate_ec_on(*curve)),
        }
    }

    /// Generate an RSA key pair with the specified modulus size.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        if bits < MIN_RSA_BITS {
            return Err(CertError::KeyGenerationError(format!(
                "RSA key size {bits} is below the minimum of {MIN_RSA_BITS} bits"
            )));
        }
        debug!(bits, "generating RSA key");
        let mut rng = rand_core::OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits)?;
        Ok(PrivateKey::Rsa(Box::new(private)))
    }

    /// Generate an EC key pair on the named curve, falling back to P224 for
    /// unknown names (see [`Curve::from_name`]).
    pub fn generate_ec(curve_name: &str) -> Self {
        Self::generate_ec_on(Curve::from_name(curve_name))
    }

    pub fn generate_ec_on(curve: Curve) -> Self {
        debug!(%curve, "generating EC key");
        let mut rng = rand_core::OsRng;
        let key = match curve {
            Curve::P224 => EcPrivateKey::P224(p224::SecretKey::random(&mut rng)),
            Curve::P256 => EcPrivateKey::P256(p256::SecretKey::random(&mut rng)),
            Curve::P384 => EcPrivateKey::P384(p384::SecretKey::random(&mut rng)),
            Curve::P521 => EcPrivateKey::P521(p521::SecretKey::random(&mut rng)),
        };
        PrivateKey::Ec(key)
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PrivateKey::Rsa(_) => KeyAlgorithm::Rsa,
            PrivateKey::Ec(_) => KeyAlgorithm::Ec,
        }
    }

    /// The parameters this key was generated with.
    pub fn params(&self) -> KeyParams {
        match self {
            PrivateKey::Rsa(key) => KeyParams::Rsa {
                bits: rsa::traits::PublicKeyParts::n(key.as_ref()).bits(),
            },
            PrivateKey::Ec(key) => KeyParams::Ec(key.curve()),
        }
    }

    /// Derives the SubjectPublicKeyInfo for the public half of this key.
    pub fn public_key_info(&self) -> Result<SubjectPublicKeyInfoOwned> {
        match self {
            PrivateKey::Rsa(key) => {
                SubjectPublicKeyInfoOwned::from_key(RsaPublicKey::from(key.as_ref()))
            }
            PrivateKey::Ec(key) => key.public_key_info(),
        }
        .map_err(|e| CertError::EncodingError(e.to_string()))
    }

    /// DER of the public half as a SubjectPublicKeyInfo.
    pub fn public_key_der(&self) -> Result<Vec<u8>> {
        Ok(self.public_key_info()?.to_der()?)
    }

    /// Parses an `RSA PRIVATE KEY`, `EC PRIVATE KEY` or PKCS#8 `PRIVATE KEY`
    /// block.
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        crate::pem_utils::key_from_pem(pem)
    }

    pub fn to_pem(&self) -> Result<String> {
        crate::pem_utils::key_to_pem(self)
    }

    /// Decodes a PKCS#8 `PrivateKeyInfo` holding an RSA or EC key.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        use rsa::pkcs8::DecodePrivateKey;

        let info = pkcs8::PrivateKeyInfo::try_from(der)?;
        match info.algorithm.oid {
            const_oid::db::rfc5912::RSA_ENCRYPTION => Ok(PrivateKey::Rsa(Box::new(
                RsaPrivateKey::from_pkcs8_der(der)?,
            ))),
            const_oid::db::rfc5912::ID_EC_PUBLIC_KEY => {
                Ok(PrivateKey::Ec(EcPrivateKey::from_pkcs8_der(der)?))
            }
            other => Err(CertError::UnsupportedKeyTypeError(format!(
                "unsupported private key algorithm {other}"
            ))),
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivateKey::Rsa(_) => f
                .debug_struct("PrivateKey::Rsa")
                .field("params", &self.params())
                .finish_non_exhaustive(),
            PrivateKey::Ec(key) => f.debug_tuple("PrivateKey::Ec").field(key).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_parse_is_case_insensitive() {
        assert_eq!("rsa".parse::<KeyAlgorithm>().unwrap(), KeyAlgorithm::Rsa);
        assert_eq!("Ec".parse::<KeyAlgorithm>().unwrap(), KeyAlgorithm::Ec);
        assert!(matches!(
            "DSA".parse::<KeyAlgorithm>(),
            Err(CertError::UnsupportedAlgorithmError(_))
        ));
    }

    #[test]
    fn test_curve_lookup() {
        assert_eq!(Curve::from_name("p384"), Curve::P384);
        assert_eq!(Curve::from_name("P512"), Curve::P224);
        assert_eq!(Curve::from_name(""), Curve::P224);
        assert!("P512".parse::<Curve>().is_err());
        assert_eq!("p521".parse::<Curve>().unwrap(), Curve::P521);
    }

    #[test]
    fn test_curve_oid_round_trip() {
        for curve in Curve::ALL {
            assert_eq!(Curve::from_oid(&curve.oid()), Some(curve));
        }
    }

    #[test]
    fn test_rsa_too_small() {
        let err = PrivateKey::generate_rsa(256).unwrap_err();
        assert!(matches!(err, CertError::KeyGenerationError(_)));
    }

    #[test]
    fn test_rsa_modulus_size() {
        let key = PrivateKey::generate_rsa(1024).unwrap();
        assert_eq!(key.params(), KeyParams::Rsa { bits: 1024 });
        assert_eq!(key.algorithm(), KeyAlgorithm::Rsa);
    }

    #[test]
    fn test_sec1_round_trip_keeps_curve() {
        for curve in Curve::ALL {
            let PrivateKey::Ec(key) = PrivateKey::generate_ec_on(curve) else {
                unreachable!()
            };
            let der = key.to_sec1_der().unwrap();
            let decoded = EcPrivateKey::from_sec1_der(&der).unwrap();
            assert_eq!(decoded.curve(), curve);
        }
    }
}
