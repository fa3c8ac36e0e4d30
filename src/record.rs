//! What is persisted about an issued certificate.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::cert::Certificate;
use crate::cert::params::DistinguishedName;
use crate::error::{CaError, Result};

/// An issued certificate together with the fields derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCertificate {
    pub serial_number: u64,
    /// RFC 4514 form of the issuer name.
    pub issuer_dn: String,
    /// RFC 4514 form of the subject name.
    pub subject_dn: String,
    pub subject: DistinguishedName,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
    pub version: u8,
    pub signature_algorithm: String,
    pub public_key_algorithm: String,
    pub der: Vec<u8>,
    pub pem: String,
}

impl IssuedCertificate {
    pub fn from_certificate(certificate: &Certificate) -> Result<Self> {
        let serial_number = certificate
            .serial_number_u64()
            .filter(|&serial| serial > 0)
            .ok_or_else(|| {
                CaError::InvalidInput(format!(
                    "serial number {} is not a positive 64-bit value",
                    certificate.serial_number_decimal()
                ))
            })?;
        let validity = certificate.validity();
        let subject_dn = certificate.subject().to_string();

        Ok(Self {
            serial_number,
            issuer_dn: certificate.issuer().to_string(),
            subject: record_subject(certificate, &subject_dn),
            subject_dn,
            not_before: validity.not_before,
            not_after: validity.not_after,
            version: certificate.version(),
            signature_algorithm: certificate.signature_algorithm_name(),
            public_key_algorithm: certificate.public_key_algorithm_name(),
            der: certificate.to_der()?,
            pem: certificate.to_pem()?,
        })
    }
}

/// Subject columns of a record. Without a CN the whole subject DN stands in for it, and a
/// country that is not a two-letter code is left out of the record (it stays in the
/// certificate).
fn record_subject(certificate: &Certificate, subject_dn: &str) -> DistinguishedName {
    let mut subject = DistinguishedName::from_x509_name(certificate.subject());
    if subject.common_name.trim().is_empty() {
        subject.common_name = subject_dn.to_string();
    }
    subject.country = subject.country.filter(|country| country.chars().count() == 2);
    subject
}

/// Lifecycle state of a stored certificate. New records are [`CertificateStatus::Active`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum CertificateStatus {
    #[default]
    Active,
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateStatus::Active => f.write_str("ACTIVE"),
        }
    }
}

/// A certificate record that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCertificateRecord {
    /// Decimal serial number.
    pub serial_number: String,
    pub version: u8,
    pub issuer_dn: String,
    pub subject_dn: String,
    pub common_name: String,
    pub organization: Option<String>,
    pub organizational_unit: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub email: Option<String>,
    pub signature_algorithm: String,
    pub public_key_algorithm: String,
    pub certificate_pem: String,
    #[serde(with = "der_base64")]
    pub certificate_der: Vec<u8>,
    #[serde(with = "time::serde::rfc3339")]
    pub not_before: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub not_after: OffsetDateTime,
    pub status: CertificateStatus,
}

impl NewCertificateRecord {
    pub fn new(issued: &IssuedCertificate, status: CertificateStatus) -> Self {
        let subject = issued.subject.clone();
        Self {
            serial_number: issued.serial_number.to_string(),
            version: issued.version,
            issuer_dn: issued.issuer_dn.clone(),
            subject_dn: issued.subject_dn.clone(),
            common_name: subject.common_name,
            organization: subject.organization,
            organizational_unit: subject.organization_unit,
            country: subject.country,
            state: subject.state,
            locality: subject.locality,
            email: subject.email,
            signature_algorithm: issued.signature_algorithm.clone(),
            public_key_algorithm: issued.public_key_algorithm.clone(),
            certificate_pem: issued.pem.clone(),
            certificate_der: issued.der.clone(),
            not_before: issued.not_before,
            not_after: issued.not_after,
            status,
        }
    }
}

/// A stored certificate record. `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub id: u64,
    pub serial_number: String,
    pub version: u8,
    pub issuer_dn: String,
    pub subject_dn: String,
    pub common_name: String,
    pub organization: Option<String>,
    pub organizational_unit: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub email: Option<String>,
    pub signature_algorithm: String,
    pub public_key_algorithm: String,
    pub certificate_pem: String,
    #[serde(with = "der_base64")]
    pub certificate_der: Vec<u8>,
    #[serde(with = "time::serde::rfc3339")]
    pub not_before: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub not_after: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub status: CertificateStatus,
}

impl CertificateRecord {
    pub fn from_new(record: NewCertificateRecord, id: u64, created_at: OffsetDateTime) -> Self {
        Self {
            id,
            serial_number: record.serial_number,
            version: record.version,
            issuer_dn: record.issuer_dn,
            subject_dn: record.subject_dn,
            common_name: record.common_name,
            organization: record.organization,
            organizational_unit: record.organizational_unit,
            country: record.country,
            state: record.state,
            locality: record.locality,
            email: record.email,
            signature_algorithm: record.signature_algorithm,
            public_key_algorithm: record.public_key_algorithm,
            certificate_pem: record.certificate_pem,
            certificate_der: record.certificate_der,
            not_before: record.not_before,
            not_after: record.not_after,
            created_at,
            status: record.status,
        }
    }
}

mod der_base64 {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(der: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(der))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
