use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{error, info};

use crate::anchor::{CaInfo, TrustAnchor};
use crate::cert::params::Validity;
use crate::config::CaConfig;
use crate::csr::ParsedCsr;
use crate::error::{CaError, Result};
use crate::issuer::Issuer;
use crate::record::{CertificateRecord, CertificateStatus, IssuedCertificate, NewCertificateRecord};
use crate::serial::SerialNumberGenerator;
use crate::store::CertificateStore;
use crate::verify::{SignatureValidation, SignatureValidationRequest, Verification};

/// Lifetime of every issued certificate, in days.
pub const VALIDITY_DAYS: i64 = 365;

/// Result of a successful issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issuance {
    pub certificate_pem: String,
    pub record: CertificateRecord,
}

/// Issues, looks up and verifies certificates for a single root CA.
///
/// All operations take `&self`; the engine can be shared between threads as is.
pub struct CertificateAuthority {
    anchor: Arc<TrustAnchor>,
    store: Arc<dyn CertificateStore>,
    serials: SerialNumberGenerator,
    require_proof_of_possession: bool,
}

impl CertificateAuthority {
    pub fn new(anchor: Arc<TrustAnchor>, store: Arc<dyn CertificateStore>) -> Self {
        Self {
            anchor,
            store,
            serials: SerialNumberGenerator::new(),
            require_proof_of_possession: false,
        }
    }

    /// Loads the CA material named by `config` and applies its CSR policy.
    pub fn from_config(config: &CaConfig, store: Arc<dyn CertificateStore>) -> Result<Self> {
        let anchor = TrustAnchor::load(config)?;
        Ok(Self::new(Arc::new(anchor), store)
            .with_proof_of_possession(config.require_proof_of_possession))
    }

    /// Require CSRs to carry a valid self-signature.
    pub fn with_proof_of_possession(mut self, required: bool) -> Self {
        self.require_proof_of_possession = required;
        self
    }

    pub fn anchor(&self) -> &Arc<TrustAnchor> {
        &self.anchor
    }

    /// Issues a certificate for a PEM CSR and stores its record.
    ///
    /// # Errors
    /// - [`CaError::InvalidCsr`] if the CSR cannot be parsed, or fails proof of possession
    ///   when that is required.
    /// - [`CaError::Issuance`] if building or signing the certificate fails.
    /// - Store errors, including [`CaError::DuplicateSerial`], as returned by the store.
    pub fn issue_certificate(&self, csr_pem: &str) -> Result<Issuance> {
        let csr = ParsedCsr::from_pem(csr_pem)?;
        if self.require_proof_of_possession {
            csr.verify_proof_of_possession()?;
        }

        let serial_number = self.serials.next();
        let validity = Validity::starting_at(OffsetDateTime::now_utc(), VALIDITY_DAYS);
        let issued = self
            .anchor
            .issue(&csr, serial_number, validity)
            .and_then(|certificate| IssuedCertificate::from_certificate(&certificate))
            .map_err(|e| {
                error!(serial = serial_number, cause = %e, "certificate issuance failed");
                CaError::issuance(e)
            })?;

        let record = self
            .store
            .put(NewCertificateRecord::new(&issued, CertificateStatus::Active))?;
        info!(
            serial = %record.serial_number,
            subject = %issued.subject_dn,
            "issued certificate"
        );

        Ok(Issuance {
            certificate_pem: issued.pem,
            record,
        })
    }

    pub fn ca_info(&self) -> Result<CaInfo> {
        self.anchor.ca_info().map_err(|e| {
            error!(cause = %e, "failed to describe CA certificate");
            CaError::issuance(e)
        })
    }

    /// Looks up a stored record. Surrounding whitespace in `serial_number` is ignored.
    pub fn certificate_by_serial_number(&self, serial_number: &str) -> Result<CertificateRecord> {
        let serial_number = serial_number.trim();
        self.store
            .get(serial_number)?
            .ok_or_else(|| CaError::NotFound(serial_number.to_string()))
    }

    /// Checks that a certificate was issued by this CA and that `signature` was made with
    /// its key over `data`. Never fails.
    pub fn validate_signature(&self, request: &SignatureValidationRequest) -> SignatureValidation {
        SignatureValidation::from(&self.verify_at(request, OffsetDateTime::now_utc()))
    }

    /// Runs the same checks as [`CertificateAuthority::validate_signature`] at `now`,
    /// keeping the specific reason for a rejection.
    pub fn verify_at(&self, request: &SignatureValidationRequest, now: OffsetDateTime) -> Verification {
        Verification::check(&self.anchor, request, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::Certificate;
    use crate::cert::params::DistinguishedName;
    use crate::csr::CertificationRequestInfo;
    use crate::key::KeyPair;
    use crate::store::MemoryCertificateStore;

    fn engine() -> CertificateAuthority {
        let key = KeyPair::generate_rsa(1024).unwrap();
        let subject = DistinguishedName::builder()
            .common_name("Engine Test CA".to_string())
            .build();
        let cert = Certificate::new_self_signed(&subject, &key, Validity::for_days(30), 1).unwrap();
        let anchor = TrustAnchor::new(cert, key).unwrap();
        CertificateAuthority::new(Arc::new(anchor), Arc::new(MemoryCertificateStore::new()))
    }

    #[test]
    fn issue_then_look_up() {
        let ca = engine();
        let key = KeyPair::generate_rsa(1024).unwrap();
        let csr = CertificationRequestInfo::builder()
            .subject(
                DistinguishedName::builder()
                    .common_name("svc.example.com".to_string())
                    .build(),
            )
            .build()
            .to_pem(&key)
            .unwrap();

        let issuance = ca.issue_certificate(&csr).unwrap();
        assert_eq!(issuance.record.certificate_pem, issuance.certificate_pem);
        assert_eq!(issuance.record.common_name, "svc.example.com");

        let serial = format!(" {}\n", issuance.record.serial_number);
        assert_eq!(ca.certificate_by_serial_number(&serial).unwrap(), issuance.record);
    }

    #[test]
    fn engine_is_shareable_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CertificateAuthority>();
    }

    #[test]
    fn unknown_serial_is_not_found() {
        let ca = engine();
        assert_eq!(
            ca.certificate_by_serial_number("12345"),
            Err(CaError::NotFound("12345".to_string()))
        );
    }

    #[test]
    fn unparseable_certificate_is_not_valid() {
        let ca = engine();
        let result = ca.validate_signature(&SignatureValidationRequest {
            certificate_pem: "garbage".to_string(),
            data: "hello".to_string(),
            signature: String::new(),
        });
        assert!(!result.certificate_valid);
        assert_eq!(result.signature_valid, None);
    }
}
