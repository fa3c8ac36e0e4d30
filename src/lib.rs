//! # certauthority - A Minimal Certificate Authority Engine
//!
//! certauthority issues X.509 certificates from PKCS#10 signing requests under a single
//! root CA, keeps a record of every certificate it issues, and verifies that presented
//! certificates and detached signatures come from that CA. It is built entirely with
//! rustcrypto libraries.
//!
//! ## What an issued certificate looks like
//!
//! - **Version**: X.509 v3
//! - **Serial**: random, positive, 63 bits
//! - **Validity**: 365 days from the moment of issuance, in whole seconds
//! - **Issuer**: the CA certificate's subject, byte for byte
//! - **Subject and public key**: copied from the CSR unchanged
//! - **Signature**: SHA-256 with RSA (PKCS#1 v1.5)
//! - **Extensions**: `subjectAltName`, `keyUsage` and `extKeyUsage` from the CSR, plus an
//!   `authorityKeyIdentifier`
//!
//! ## Quick Start
//!
//! ### Issuing a Certificate
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use certauthority::{
//!     anchor::TrustAnchor,
//!     config::Settings,
//!     engine::CertificateAuthority,
//!     store::MemoryCertificateStore,
//! };
//!
//! # fn main() -> Result<(), certauthority::error::CaError> {
//! let settings = Settings::load("ca.toml")?;
//! let anchor = TrustAnchor::load(&settings.ca)?;
//! let ca = CertificateAuthority::new(Arc::new(anchor), Arc::new(MemoryCertificateStore::new()))
//!     .with_proof_of_possession(settings.ca.require_proof_of_possession);
//!
//! let csr_pem = std::fs::read_to_string("server.csr")?;
//! let issuance = ca.issue_certificate(&csr_pem)?;
//! println!("serial {}:\n{}", issuance.record.serial_number, issuance.certificate_pem);
//! # Ok(())
//! # }
//! ```
//!
//! ### Verifying a Signature
//!
//! ```rust,no_run
//! # use certauthority::engine::CertificateAuthority;
//! use certauthority::verify::SignatureValidationRequest;
//!
//! # fn check(ca: &CertificateAuthority, certificate_pem: String, signature: String) {
//! let result = ca.validate_signature(&SignatureValidationRequest {
//!     certificate_pem,
//!     data: "hello".to_string(),
//!     signature,
//! });
//! if result.certificate_valid && result.signature_valid == Some(true) {
//!     println!("signed by a certificate from this CA");
//! }
//! # }
//! ```
//!
//! ### Bootstrapping CA Material
//!
//! ```rust,no_run
//! use certauthority::{
//!     cert::{Certificate, params::{DistinguishedName, Validity}},
//!     key::KeyPair,
//! };
//!
//! # fn main() -> Result<(), certauthority::error::CaError> {
//! let key = KeyPair::generate_rsa(2048)?;
//! let subject = DistinguishedName::builder()
//!     .common_name("Example Root CA".to_string())
//!     .organization("Example Corp".to_string())
//!     .country("US".to_string())
//!     .build();
//! let certificate = Certificate::new_self_signed(&subject, &key, Validity::for_days(3650), 1)?;
//!
//! std::fs::write("rootCA.crt", certificate.to_pem()?)?;
//! std::fs::write("rootCA.key", key.to_pkcs8_pem()?)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Issuance and lookup return [`error::CaError`]. Verification never fails; it reports
//! booleans.
//!
//! ```rust
//! use certauthority::{csr::ParsedCsr, error::CaError};
//!
//! match ParsedCsr::from_pem("not a csr") {
//!     Ok(_) => println!("parsed"),
//!     Err(CaError::InvalidCsr(msg)) => println!("rejected: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`engine`]: The four CA operations: issue, describe, look up, validate
//! - [`anchor`]: CA certificate and private key
//! - [`csr`]: PKCS#10 parsing and construction
//! - [`issuer`]: Building and signing certificates for a CSR
//! - [`verify`]: Chain and detached-signature verification
//! - [`record`] and [`store`]: Issued-certificate records and where they live
//! - [`serial`]: Serial number generation
//! - [`config`]: TOML settings
//! - [`key`]: RSA key generation, import/export, signing
//! - [`cert`]: Certificate encoding/decoding, names, validity and extensions
//! - [`error`]: Error types
//! - [`tbs_certificate`]: Low-level certificate structure manipulation

pub mod anchor;
pub mod cert;
pub mod config;
pub mod csr;
pub mod engine;
pub mod error;
pub mod issuer;
pub mod key;
pub mod pem_utils;
pub mod record;
pub mod serial;
pub mod store;
pub mod tbs_certificate;
pub mod verify;
