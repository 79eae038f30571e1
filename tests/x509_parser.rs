mod util;

use regex::Regex;
use x509_parser::prelude::*;

const ECDSA_WITH_SHA256: &str = "1.2.840.10045.4.3.2";
const SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";

/// Checks the generated PEM with an independent parser.
#[test]
fn test_x509_parser_reads_root() {
    let root = util::generate_root_ca();
    let pem = root.cert.to_pem();

    let shape = Regex::new(
        r"^-----BEGIN CERTIFICATE-----\n([A-Za-z0-9+/=]{1,64}\n)+-----END CERTIFICATE-----\n$",
    )
    .unwrap();
    assert!(shape.is_match(&pem), "unexpected PEM layout:\n{pem}");

    let (_, block) = x509_parser::pem::parse_x509_pem(pem.as_bytes()).unwrap();
    let cert = block.parse_x509().unwrap();

    assert_eq!(cert.version(), X509Version::V3);
    assert_eq!(cert.subject(), cert.issuer());
    let cn = cert.subject().iter_common_name().next().unwrap();
    assert_eq!(cn.as_str().unwrap(), "root1");
    let ou = cert.subject().iter_organizational_unit().next().unwrap();
    assert_eq!(ou.as_str().unwrap(), "orgunit1");
    let org = cert.subject().iter_organization().next().unwrap();
    assert_eq!(org.as_str().unwrap(), "orgunit1");
    let country = cert.subject().iter_country().next().unwrap();
    assert_eq!(country.as_str().unwrap(), "US");
    assert_eq!(
        cert.signature_algorithm.algorithm.to_id_string(),
        ECDSA_WITH_SHA256
    );
    assert_eq!(cert.raw_serial(), root.cert.serial_number().to_bytes_be().as_slice());

    let bc = cert.basic_constraints().unwrap().unwrap();
    assert!(bc.critical);
    assert!(bc.value.ca);
    assert_eq!(bc.value.path_len_constraint, Some(0));

    let ku = cert.key_usage().unwrap().unwrap();
    assert!(ku.critical);
    assert!(ku.value.key_cert_sign());
    assert!(!ku.value.digital_signature());

    let eku = cert.extended_key_usage().unwrap().unwrap();
    assert!(!eku.critical);
    assert!(eku.value.any);

    assert_eq!(
        cert.validity().not_before.timestamp(),
        root.cert.not_before().unix_timestamp()
    );
    assert_eq!(
        cert.validity().not_after.timestamp(),
        root.cert.not_after().unix_timestamp()
    );
}

#[test]
fn test_x509_parser_reads_cross_signed_leaf() {
    let root = util::generate_rsa_root_ca();
    let (leaf, _) = util::generate_leaf(&root, "EC");

    let (_, cert) = X509Certificate::from_der(leaf.to_der()).unwrap();
    let (_, issuer) = X509Certificate::from_der(root.cert.to_der()).unwrap();

    assert_eq!(cert.issuer(), issuer.subject());
    assert_eq!(
        cert.signature_algorithm.algorithm.to_id_string(),
        SHA256_WITH_RSA
    );
    assert!(cert.basic_constraints().unwrap().is_none());

    let ku = cert.key_usage().unwrap().unwrap();
    assert!(ku.value.digital_signature());
    assert!(ku.value.key_encipherment());
    assert!(!ku.value.key_cert_sign());

    match cert.public_key().parsed().unwrap() {
        x509_parser::public_key::PublicKey::EC(point) => assert_eq!(point.key_size(), 256),
        other => panic!("expected an EC key, got {other:?}"),
    }
}

#[test]
fn test_x509_parser_reads_far_validity() {
    let (root, _) = certsmith::generator::CertGenerator::default()
        .custom_rsa_root_ca(
            util::identity("root1", "99"),
            1024,
            40,
            1,
            certsmith::cert::extensions::KeyUsage::ca_default(),
        )
        .unwrap();
    let (_, cert) = X509Certificate::from_der(root.to_der()).unwrap();
    assert_eq!(
        cert.validity().not_after.timestamp(),
        root.not_after().unix_timestamp()
    );
    match cert.public_key().parsed().unwrap() {
        x509_parser::public_key::PublicKey::RSA(key) => assert_eq!(key.key_size(), 1024),
        other => panic!("expected an RSA key, got {other:?}"),
    }
}
