//! Chain and detached-signature verification.
//!
//! Every check returns a typed reason internally. The public request/response pair
//! ([`SignatureValidationRequest`], [`SignatureValidation`]) only exposes booleans.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use der::Encode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::anchor::TrustAnchor;
use crate::cert::{Certificate, SignatureAlgorithm, signature_algorithm_name};
use crate::key;

pub const NOT_ISSUED_BY_THIS_CA: &str = "Certificate was not issued by this CA";

/// Why a certificate does not chain to the CA.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("malformed certificate: {0}")]
    Malformed(String),
    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("signature does not verify with the CA key")]
    SignatureMismatch,
    #[error("certificate is not valid before {0}")]
    NotYetValid(OffsetDateTime),
    #[error("certificate expired at {0}")]
    Expired(OffsetDateTime),
    #[error("issuer {0} is not the CA subject")]
    IssuerMismatch(String),
}

/// Why a detached signature was not accepted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature is not valid base64: {0}")]
    InvalidEncoding(String),
    #[error("certificate key cannot verify SHA256withRSA: {0}")]
    UnsupportedKey(String),
    #[error("signature does not match the data")]
    Mismatch,
}

/// Checks that `certificate` was signed by `ca`, is valid at `now`, and names `ca` as issuer.
///
/// The checks run in that order and the first failure is returned.
pub fn verify_chain(
    certificate: &Certificate,
    ca: &Certificate,
    now: OffsetDateTime,
) -> Result<(), ChainError> {
    let inner = &certificate.inner;
    let outer_oid = inner.signature_algorithm.oid;
    if inner.tbs_certificate.signature.oid != outer_oid {
        return Err(ChainError::Malformed(
            "inner and outer signature algorithms differ".to_string(),
        ));
    }
    let algorithm = SignatureAlgorithm::from_oid(&outer_oid)
        .ok_or_else(|| ChainError::UnsupportedAlgorithm(signature_algorithm_name(&outer_oid)))?;

    let ca_key = key::rsa_public_key(ca.subject_public_key_info())
        .map_err(|e| ChainError::UnsupportedAlgorithm(e.to_string()))?;
    let tbs = inner
        .tbs_certificate
        .to_der()
        .map_err(|e| ChainError::Malformed(e.to_string()))?;
    let signature = inner
        .signature
        .as_bytes()
        .ok_or_else(|| ChainError::Malformed("signature has unused bits".to_string()))?;
    key::verify_with(&ca_key, algorithm, &tbs, signature)
        .map_err(|_| ChainError::SignatureMismatch)?;

    let validity = certificate.validity();
    if !validity.contains(now) {
        return Err(if now < validity.not_before {
            ChainError::NotYetValid(validity.not_before)
        } else {
            ChainError::Expired(validity.not_after)
        });
    }

    if certificate.issuer() != ca.subject() {
        return Err(ChainError::IssuerMismatch(certificate.issuer().to_string()));
    }
    Ok(())
}

pub fn is_trusted(certificate: &Certificate, ca: &Certificate, now: OffsetDateTime) -> bool {
    verify_chain(certificate, ca, now).is_ok()
}

/// Verifies a base64 SHA256withRSA signature over the UTF-8 bytes of `data`
/// using the certificate's public key.
pub fn verify_signature(
    certificate: &Certificate,
    data: &str,
    signature: &str,
) -> Result<(), SignatureError> {
    let signature = STANDARD
        .decode(signature.trim())
        .map_err(|e| SignatureError::InvalidEncoding(e.to_string()))?;
    let public = key::rsa_public_key(certificate.subject_public_key_info())
        .map_err(|e| SignatureError::UnsupportedKey(e.to_string()))?;
    key::verify_with(
        &public,
        SignatureAlgorithm::Sha256WithRSA,
        data.as_bytes(),
        &signature,
    )
    .map_err(|_| SignatureError::Mismatch)
}

pub fn is_valid(certificate: &Certificate, data: &str, signature: &str) -> bool {
    verify_signature(certificate, data, signature).is_ok()
}

/// A request to check a certificate against the CA and a signature against the certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureValidationRequest {
    pub certificate_pem: String,
    pub data: String,
    /// Base64 of the raw RSA signature.
    pub signature: String,
}

/// Outcome of a validation request, with the reason kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The certificate could not be parsed or does not chain to the CA.
    Rejected(ChainError),
    /// The certificate chains to the CA; `signature` is the detached-signature outcome.
    Accepted {
        signature: Result<(), SignatureError>,
    },
}

impl Verification {
    /// Runs the full check at `now`. Never fails; every problem becomes a rejection reason.
    pub fn check(
        anchor: &TrustAnchor,
        request: &SignatureValidationRequest,
        now: OffsetDateTime,
    ) -> Self {
        let certificate = match Certificate::from_pem(&request.certificate_pem) {
            Ok(certificate) => certificate,
            Err(e) => {
                let reason = ChainError::Malformed(e.to_string());
                info!(%reason, "rejected certificate");
                return Verification::Rejected(reason);
            }
        };

        if let Err(reason) = verify_chain(&certificate, anchor.certificate(), now) {
            info!(
                serial = %certificate.serial_number_decimal(),
                %reason,
                "rejected certificate"
            );
            return Verification::Rejected(reason);
        }

        let signature = verify_signature(&certificate, &request.data, &request.signature);
        if let Err(reason) = &signature {
            debug!(
                serial = %certificate.serial_number_decimal(),
                %reason,
                "signature not accepted"
            );
        }
        Verification::Accepted { signature }
    }
}

/// Boolean summary of a [`Verification`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureValidation {
    pub certificate_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&Verification> for SignatureValidation {
    fn from(verification: &Verification) -> Self {
        match verification {
            Verification::Rejected(_) => SignatureValidation {
                certificate_valid: false,
                signature_valid: None,
                message: Some(NOT_ISSUED_BY_THIS_CA.to_string()),
            },
            Verification::Accepted { signature } => SignatureValidation {
                certificate_valid: true,
                signature_valid: Some(signature.is_ok()),
                message: None,
            },
        }
    }
}
