use sha1::{Digest, Sha1};
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, SubjectKeyIdentifier, ToAndFromX509Extension,
};
use crate::error::{CertError, Result};
use crate::template::CertificateTemplate;

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
///
/// # Fields
/// * `serial_number` - Big-endian bytes of the certificate serial.
/// * `signature_algorithm` - The algorithm the issuer will sign with.
/// * `issuer` - The issuer name, copied from the issuer's subject.
/// * `validity` - The validity period.
/// * `subject` - The subject name.
/// * `subject_public_key` - The subject's public key.
/// * `extensions` - Extensions in encoding order.
pub struct TbsCertificate {
    pub serial_number: Vec<u8>,
    pub signature_algorithm: SignatureAlgorithm,
    pub issuer: Name,
    pub validity: x509_cert::time::Validity,
    pub subject: Name,
    pub subject_public_key: SubjectPublicKeyInfoOwned,
    pub extensions: Vec<Extension>,
}

impl TbsCertificate {
    /// Lays out a template for signing by an issuer.
    ///
    /// CA templates get a Subject Key Identifier; when the issuer has a key
    /// identifier, an Authority Key Identifier is added as well.
    pub fn from_template(
        template: &CertificateTemplate,
        subject_public_key: SubjectPublicKeyInfoOwned,
        issuer: Name,
        authority_key_id: Option<Vec<u8>>,
        signature_algorithm: SignatureAlgorithm,
    ) -> Result<Self> {
        let mut extensions = vec![template.key_usage.to_x509_extension(true)?];
        extensions.push(template.extended_key_usage.to_x509_extension(false)?);

        if template.constraints.basic_constraints_valid {
            let basic_constraints = BasicConstraints {
                is_ca: template.constraints.is_ca,
                max_path_length: template.constraints.max_path_len,
            };
            extensions.push(basic_constraints.to_x509_extension(true)?);
        }

        if template.constraints.is_ca {
            let ski = SubjectKeyIdentifier(key_identifier(&subject_public_key));
            extensions.push(ski.to_x509_extension(false)?);
        }

        if let Some(key_identifier) = authority_key_id {
            let aki = AuthorityKeyIdentifier { key_identifier };
            extensions.push(aki.to_x509_extension(false)?);
        }

        Ok(Self {
            serial_number: template.serial_number.to_bytes_be(),
            signature_algorithm,
            issuer,
            validity: template.validity.to_x509()?,
            subject: template.identity.to_x509_name()?,
            subject_public_key,
            extensions,
        })
    }

    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner> {
        let serial_number = SerialNumber::new(self.serial_number.as_slice())
            .map_err(|e| CertError::InvalidSerialNumberError(e.to_string()))?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number,
            signature: self.signature_algorithm.into(),
            issuer: self.issuer.clone(),
            validity: self.validity,
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key.clone(),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: Some(self.extensions.clone()),
        })
    }
}

/// SHA-1 over the subject public key bits (RFC 5280 4.2.1.2, method 1).
pub fn key_identifier(public_key: &SubjectPublicKeyInfoOwned) -> Vec<u8> {
    Sha1::digest(public_key.subject_public_key.raw_bytes()).to_vec()
}
