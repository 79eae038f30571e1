//! # Certsmith - X.509 CA and Leaf Certificate Generation
//!
//! Certsmith builds self-signed root CAs and issues leaf certificates signed
//! by them, using only rustcrypto libraries. It is meant for tests and
//! tooling that need real certificates without an external CA.
//!
//! ## Supported Key Types
//!
//! - **RSA**: any modulus of at least 512 bits, signed with PKCS#1 v1.5 and SHA-256
//! - **ECDSA**: P-224, P-256, P-384 and P-521, always signed with SHA-256
//!
//! Issuer and subject keys may be of different families: an RSA root can
//! issue EC leaves and the other way round.
//!
//! ## Output
//!
//! Certificates and keys are written as PEM with the labels `CERTIFICATE`,
//! `RSA PRIVATE KEY` and `EC PRIVATE KEY`. File writes never replace an
//! existing file unless asked to.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use certsmith::cert::params::Identity;
//! use certsmith::files::LocalFiles;
//! use certsmith::generator::CertGenerator;
//! use certsmith::pem_utils;
//!
//! # fn main() -> Result<(), certsmith::error::CertError> {
//! let generator = CertGenerator::default();
//!
//! // Root CA with a P-256 key, allowed to sign leaves only.
//! let (root, root_key) = generator.ec_root_ca(Identity::new("root1", "org1", "1", "US"), "P256")?;
//!
//! // RSA leaf signed by the EC root.
//! let (leaf, leaf_key) = generator.rsa_leaf_cert(
//!     Identity::new("leaf1", "org1", "2", "US"),
//!     2048,
//!     &root,
//!     &root_key,
//! )?;
//! assert_eq!(leaf.issuer(), root.subject());
//! leaf.verify_signed_by(&root)?;
//!
//! pem_utils::certificate_to_pem_file(&leaf, Path::new("leaf.pem"), &LocalFiles, false)?;
//! pem_utils::key_to_pem_file(&leaf_key, Path::new("leaf-key.pem"), &LocalFiles, false)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Lower-level API
//!
//! ```rust,no_run
//! use certsmith::cert::extensions::KeyUsage;
//! use certsmith::cert::params::Identity;
//! use certsmith::issuer::{self_sign, sign};
//! use certsmith::key::{Curve, KeyParams};
//! use certsmith::template::{build_ca_template, build_leaf_template};
//!
//! # fn main() -> Result<(), certsmith::error::CertError> {
//! let ca = build_ca_template(
//!     Identity::new("root1", "org1", "1", "US"),
//!     "EC",
//!     10,
//!     1,
//!     KeyUsage::ca_default(),
//! )?
//! .with_key_params(KeyParams::Ec(Curve::P384))?;
//! let (root, root_key) = self_sign(&ca)?;
//!
//! let leaf = build_leaf_template(
//!     Identity::new("leaf1", "org1", "2", "US"),
//!     "RSA",
//!     1,
//!     KeyUsage::leaf_default(),
//! )?;
//! let (cert, key) = sign(&leaf, &root, &root_key)?;
//! println!("{}", cert.to_pem());
//! println!("{}", key.to_pem()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`key`]: Key generation and key families
//! - [`template`]: Unsigned CA and leaf templates
//! - [`issuer`]: Signing templates into certificates
//! - [`cert`]: Parsed certificates, identities and extensions
//! - [`pem_utils`]: PEM encoding and the file-backed variants
//! - [`files`]: Byte persistence with the no-overwrite rule
//! - [`generator`]: One-call root and leaf helpers
//! - [`config`]: Default validity, path length, key usage and key sizes
//! - [`error`]: Error types
//! - [`tbs_certificate`]: Low-level certificate structure

pub mod cert;
pub mod config;
pub mod error;
pub mod files;
pub mod generator;
pub mod issuer;
pub mod key;
pub mod pem_utils;
pub mod tbs_certificate;
pub mod template;
