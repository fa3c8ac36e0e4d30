//! The CA's own certificate and signing key.

use std::path::Path;

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use tracing::info;
use x509_cert::name::Name;

use crate::cert::Certificate;
use crate::cert::extensions::SubjectKeyIdentifier;
use crate::cert::params::DistinguishedName;
use crate::config::CaConfig;
use crate::error::{CaError, Result};
use crate::issuer::Issuer;
use crate::key::KeyPair;

/// A root CA certificate together with its private key.
///
/// Immutable once built. The engine shares it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct TrustAnchor {
    certificate: Certificate,
    key: KeyPair,
}

/// A summary of the CA certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaInfo {
    /// Common name of the CA certificate's issuer.
    pub issuer: String,
    pub serial_number: String,
    pub not_before: String,
    pub not_after: String,
    pub algorithm: String,
    pub status: String,
}

impl TrustAnchor {
    /// Pairs a certificate with its key, failing if the key does not belong to it.
    pub fn new(certificate: Certificate, key: KeyPair) -> Result<Self> {
        if !key.matches(certificate.subject_public_key_info()) {
            return Err(CaError::Config(
                "CA private key does not match the CA certificate".to_string(),
            ));
        }
        Ok(Self { certificate, key })
    }

    pub fn from_pem(certificate_pem: &str, private_key_pem: &str) -> Result<Self> {
        let certificate = Certificate::from_pem(certificate_pem)
            .map_err(|e| CaError::Config(format!("CA certificate: {e}")))?;
        let key = KeyPair::import_from_pem(private_key_pem)
            .map_err(|e| CaError::Config(format!("CA private key: {e}")))?;
        Self::new(certificate, key)
    }

    /// Reads the CA certificate and private key named by `config`.
    pub fn load(config: &CaConfig) -> Result<Self> {
        let certificate_pem = read(&config.certificate_path)?;
        let private_key_pem = read(&config.private_key_path)?;
        let anchor = Self::from_pem(&certificate_pem, &private_key_pem)?;
        info!(
            certificate = %config.certificate_path.display(),
            subject = %anchor.certificate.subject(),
            "loaded CA material"
        );
        Ok(anchor)
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    pub fn private_key(&self) -> &KeyPair {
        &self.key
    }

    /// Describes the CA certificate.
    pub fn ca_info(&self) -> Result<CaInfo> {
        let validity = self.certificate.validity();
        let format = |at: time::OffsetDateTime| {
            at.format(&Rfc3339)
                .map_err(|e| CaError::EncodingError(e.to_string()))
        };
        Ok(CaInfo {
            issuer: DistinguishedName::from_x509_name(self.certificate.issuer()).common_name,
            serial_number: self.certificate.serial_number_decimal(),
            not_before: format(validity.not_before)?,
            not_after: format(validity.not_after)?,
            algorithm: self.certificate.signature_algorithm_name(),
            status: "active".to_string(),
        })
    }
}

impl Issuer for TrustAnchor {
    fn issuer_name(&self) -> &Name {
        self.certificate.subject()
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }

    /// Reuses the CA certificate's own `subjectKeyIdentifier` when it has one.
    fn authority_key_identifier(&self) -> Result<Vec<u8>> {
        match self.certificate.extension::<SubjectKeyIdentifier>()? {
            Some(ski) => Ok(ski.0),
            None => Ok(crate::cert::key_identifier(
                self.certificate.subject_public_key_info(),
            )),
        }
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| CaError::Config(format!("{}: {e}", path.display())))
}
