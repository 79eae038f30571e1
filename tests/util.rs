#![allow(dead_code)]

use certsmith::cert::Certificate;
use certsmith::cert::params::Identity;
use certsmith::generator::CertGenerator;
use certsmith::issuer::CertifiedKey;
use certsmith::key::PrivateKey;

pub fn identity(common_name: &str, serial: &str) -> Identity {
    Identity::new(common_name, "orgunit1", serial, "US")
}

/// The `root1` CA: P-256 key, one year, may sign leaves only.
pub fn generate_root_ca() -> CertifiedKey {
    CertGenerator::default()
        .ec_root_ca(identity("root1", "1"), "P256")
        .unwrap()
        .into()
}

/// An RSA root with a small key so tests stay fast.
pub fn generate_rsa_root_ca() -> CertifiedKey {
    CertGenerator::default()
        .rsa_root_ca(identity("rsaroot", "10"), 1024)
        .unwrap()
        .into()
}

pub fn generate_leaf(issuer: &CertifiedKey, algorithm: &str) -> (Certificate, PrivateKey) {
    let generator = CertGenerator::default();
    match algorithm {
        "RSA" => generator
            .rsa_leaf_cert(identity("leaf1", "2"), 1024, &issuer.cert, &issuer.key)
            .unwrap(),
        _ => generator
            .ec_leaf_cert(identity("leaf1", "2"), "P256", &issuer.cert, &issuer.key)
            .unwrap(),
    }
}
