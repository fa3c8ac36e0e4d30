use std::time::SystemTime;

use der::Encode;
use der::asn1::{BitString, GeneralizedTime, UtcTime};
use der::DateTime;
use time::OffsetDateTime;
use x509_cert::Version;
use x509_cert::certificate::{CertificateInner, TbsCertificateInner};
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::time::Time;

use crate::cert::params::{ExtensionParam, Validity};
use crate::cert::{Certificate, SignatureAlgorithm};
use crate::error::{CaError, Result};
use crate::key::KeyPair;

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
/// This struct contains all the fields required to generate a valid X.509 certificate.
///
/// # Fields
/// * `serial_number` - The unique identifier for the certificate.
/// * `signature_algorithm` - The algorithm used to sign the certificate.
/// * `issuer` - The distinguished name of the certificate issuer.
/// * `validity` - The validity window.
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key_info` - The public key of the certificate subject, as submitted.
/// * `extensions` - Additional X.509 extensions for the certificate.
#[derive(Debug, Clone)]
pub struct TbsCertificate {
    /// Certificate serial number
    pub serial_number: u64,
    /// Certificate signature algorithm
    pub signature_algorithm: SignatureAlgorithm,
    /// Certificate issuer distinguished name
    pub issuer: Name,
    /// Not before / not after
    pub validity: Validity,
    /// Certificate subject distinguished name
    pub subject: Name,
    /// Subject's public key
    pub subject_public_key_info: SubjectPublicKeyInfoOwned,
    /// Certificate extensions
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Creates a new `TbsCertificate` signed with SHA-256 with RSA.
    pub fn new(
        serial_number: u64,
        issuer: Name,
        validity: Validity,
        subject: Name,
        subject_public_key_info: SubjectPublicKeyInfoOwned,
        extensions: Vec<ExtensionParam>,
    ) -> Self {
        Self {
            serial_number,
            signature_algorithm: SignatureAlgorithm::Sha256WithRSA,
            issuer,
            validity,
            subject,
            subject_public_key_info,
            extensions,
        }
    }

    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner> {
        if self.validity.not_after <= self.validity.not_before {
            return Err(CaError::InvalidInput(
                "notAfter must be later than notBefore".to_string(),
            ));
        }

        let extensions = self
            .extensions
            .iter()
            .map(ExtensionParam::to_x509)
            .collect::<Result<Vec<_>>>()?;

        let validity = x509_cert::time::Validity {
            not_before: encode_time(self.validity.not_before)?,
            not_after: encode_time(self.validity.not_after)?,
        };

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number: encode_serial(self.serial_number)?,
            signature: self.signature_algorithm.into(),
            issuer: self.issuer.clone(),
            validity,
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key_info.clone(),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!extensions.is_empty()).then_some(extensions),
        })
    }

    /// Signs the DER encoding of this structure and assembles the certificate.
    pub fn sign(&self, key: &KeyPair) -> Result<Certificate> {
        let tbs_certificate = self.to_tbs_certificate_inner()?;
        let signature = key.sign_with(self.signature_algorithm, &tbs_certificate.to_der()?)?;

        let inner = CertificateInner {
            tbs_certificate,
            signature_algorithm: self.signature_algorithm.into(),
            signature: BitString::from_bytes(&signature)?,
        };
        Ok(Certificate { inner })
    }
}

/// Encodes a positive serial as the minimal two's-complement INTEGER content.
pub fn encode_serial(serial: u64) -> Result<SerialNumber> {
    if serial == 0 {
        return Err(CaError::InvalidInput(
            "serial number must be positive".to_string(),
        ));
    }
    let bytes = serial.to_be_bytes();
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    let mut content = Vec::with_capacity(9);
    if bytes[first] & 0x80 != 0 {
        content.push(0);
    }
    content.extend_from_slice(&bytes[first..]);
    Ok(SerialNumber::new(&content)?)
}

/// UTCTime through 2049, GeneralizedTime afterwards (RFC 5280 4.1.2.5).
fn encode_time(at: OffsetDateTime) -> Result<Time> {
    let date_time = DateTime::from_system_time(SystemTime::from(at))
        .map_err(|e| CaError::EncodingError(e.to_string()))?;
    if date_time.year() < 2050 {
        Ok(Time::UtcTime(UtcTime::from_date_time(date_time)?))
    } else {
        Ok(Time::GeneralTime(GeneralizedTime::from_date_time(date_time)))
    }
}

pub fn decode_time(time: &Time) -> OffsetDateTime {
    match time {
        Time::UtcTime(ut) => OffsetDateTime::from(ut.to_system_time()),
        Time::GeneralTime(gt) => OffsetDateTime::from(gt.to_system_time()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_encoding_is_minimal_and_positive() {
        assert_eq!(encode_serial(1).unwrap().as_bytes(), &[0x01]);
        assert_eq!(encode_serial(0x80).unwrap().as_bytes(), &[0x00, 0x80]);
        assert_eq!(encode_serial(0x0100).unwrap().as_bytes(), &[0x01, 0x00]);
        assert_eq!(
            encode_serial(i64::MAX as u64).unwrap().as_bytes(),
            &[0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
        assert!(encode_serial(0).is_err());
    }

    #[test]
    fn times_pick_encoding_by_year() {
        let early = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        assert!(matches!(encode_time(early).unwrap(), Time::UtcTime(_)));
        let late = OffsetDateTime::from_unix_timestamp(2_600_000_000).unwrap();
        let encoded = encode_time(late).unwrap();
        assert!(matches!(encoded, Time::GeneralTime(_)));
        assert_eq!(decode_time(&encoded), late);
    }

    #[test]
    fn inverted_validity_is_rejected() {
        let key = KeyPair::generate_rsa(1024).unwrap();
        let name = crate::cert::params::DistinguishedName::builder()
            .common_name("x".to_string())
            .build()
            .as_x509_name()
            .unwrap();
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let tbs = TbsCertificate::new(
            7,
            name.clone(),
            Validity {
                not_before: now,
                not_after: now,
            },
            name,
            key.as_spki().unwrap(),
            vec![],
        );
        assert!(tbs.sign(&key).is_err());
    }
}
