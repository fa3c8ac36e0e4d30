pub mod extensions;
pub mod params;

use const_oid::ObjectIdentifier;
use der::asn1::AnyRef;
use der::{Decode, Encode, EncodePem};
use extensions::{BasicConstraints, KeyUsage, KeyUsages, SubjectKeyIdentifier, ToAndFromX509Extension};
use params::{DistinguishedName, ExtensionParam, Validity};
use sha1::{Digest, Sha1};
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::error::{CaError, Result};
use crate::key::KeyPair;
use crate::pem_utils::{CERTIFICATE_LABEL, pem_to_der};
use crate::tbs_certificate::{TbsCertificate, decode_time};

/// The signature algorithms this crate can produce and verify.
///
/// All of them are RSASSA-PKCS1-v1_5; they differ only in the digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption.
    Sha256WithRSA,
    /// SHA-384 with RSA encryption.
    Sha384WithRSA,
    /// SHA-512 with RSA encryption.
    Sha512WithRSA,
}

impl SignatureAlgorithm {
    pub fn oid(self) -> ObjectIdentifier {
        match self {
            SignatureAlgorithm::Sha256WithRSA => const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha384WithRSA => const_oid::db::rfc5912::SHA_384_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha512WithRSA => const_oid::db::rfc5912::SHA_512_WITH_RSA_ENCRYPTION,
        }
    }

    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        match *oid {
            const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION => Some(Self::Sha256WithRSA),
            const_oid::db::rfc5912::SHA_384_WITH_RSA_ENCRYPTION => Some(Self::Sha384WithRSA),
            const_oid::db::rfc5912::SHA_512_WITH_RSA_ENCRYPTION => Some(Self::Sha512WithRSA),
            _ => None,
        }
    }

    /// The JCA-style name, e.g. `SHA256withRSA`.
    pub fn name(self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha256WithRSA => "SHA256withRSA",
            SignatureAlgorithm::Sha384WithRSA => "SHA384withRSA",
            SignatureAlgorithm::Sha512WithRSA => "SHA512withRSA",
        }
    }
}

impl From<SignatureAlgorithm> for AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    ///
    /// RSA PKCS#1 v1.5 identifiers carry an explicit NULL parameter (RFC 4055).
    fn from(value: SignatureAlgorithm) -> Self {
        AlgorithmIdentifierOwned {
            oid: value.oid(),
            parameters: Some(AnyRef::NULL.into()),
        }
    }
}

/// Names any signature algorithm OID, including ones this crate cannot verify.
pub fn signature_algorithm_name(oid: &ObjectIdentifier) -> String {
    if let Some(alg) = SignatureAlgorithm::from_oid(oid) {
        return alg.name().to_string();
    }
    match *oid {
        const_oid::db::rfc5912::SHA_1_WITH_RSA_ENCRYPTION => "SHA1withRSA".to_string(),
        const_oid::db::rfc5912::ECDSA_WITH_SHA_256 => "SHA256withECDSA".to_string(),
        const_oid::db::rfc5912::ECDSA_WITH_SHA_384 => "SHA384withECDSA".to_string(),
        const_oid::db::rfc5912::ECDSA_WITH_SHA_512 => "SHA512withECDSA".to_string(),
        const_oid::db::rfc8410::ID_ED_25519 => "Ed25519".to_string(),
        _ => oid.to_string(),
    }
}

/// Represents an X.509 certificate.
///
/// This struct provides methods to encode the certificate into DER or PEM formats and
/// typed accessors over the fields the CA cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertificateInner::from_der(der)?;
        Ok(Self { inner })
    }

    /// Parses a PEM `CERTIFICATE`.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let der = pem_to_der(pem, &[CERTIFICATE_LABEL])?;
        Self::from_der(&der)
    }

    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CaError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| CaError::EncodingError(e.to_string()))
    }

    pub fn issuer(&self) -> &Name {
        &self.inner.tbs_certificate.issuer
    }

    pub fn subject(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn subject_public_key_info(&self) -> &SubjectPublicKeyInfoOwned {
        &self.inner.tbs_certificate.subject_public_key_info
    }

    pub fn validity(&self) -> Validity {
        let validity = &self.inner.tbs_certificate.validity;
        Validity {
            not_before: decode_time(&validity.not_before),
            not_after: decode_time(&validity.not_after),
        }
    }

    /// The X.509 version number as shown to humans (1, 2 or 3).
    pub fn version(&self) -> u8 {
        match self.inner.tbs_certificate.version {
            x509_cert::Version::V1 => 1,
            x509_cert::Version::V2 => 2,
            x509_cert::Version::V3 => 3,
        }
    }

    pub fn serial_number_bytes(&self) -> &[u8] {
        self.inner.tbs_certificate.serial_number.as_bytes()
    }

    /// The serial number as an unsigned decimal string.
    pub fn serial_number_decimal(&self) -> String {
        rsa::BigUint::from_bytes_be(self.serial_number_bytes()).to_string()
    }

    /// The serial number, if it fits in 64 bits.
    pub fn serial_number_u64(&self) -> Option<u64> {
        let bytes = self.serial_number_bytes();
        let significant = bytes.iter().skip_while(|&&b| b == 0).count();
        if significant > 8 {
            return None;
        }
        Some(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    }

    pub fn signature_algorithm_name(&self) -> String {
        signature_algorithm_name(&self.inner.signature_algorithm.oid)
    }

    pub fn public_key_algorithm_name(&self) -> String {
        crate::key::public_key_algorithm_name(&self.subject_public_key_info().algorithm.oid)
    }

    pub fn extensions(&self) -> Vec<ExtensionParam> {
        self.inner
            .tbs_certificate
            .extensions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(ExtensionParam::from_x509)
            .collect()
    }

    /// Finds and decodes the first extension of type `E`.
    pub fn extension<E: ToAndFromX509Extension>(&self) -> Result<Option<E>> {
        self.extensions()
            .iter()
            .find(|ext| ext.oid == E::OID)
            .map(ExtensionParam::to_extension)
            .transpose()
    }

    /// Creates a new self-signed CA certificate.
    ///
    /// The certificate carries a critical `basicConstraints` (CA), a critical `keyUsage`
    /// (keyCertSign, cRLSign) and a `subjectKeyIdentifier`.
    pub fn new_self_signed(
        subject: &DistinguishedName,
        key: &KeyPair,
        validity: Validity,
        serial_number: u64,
    ) -> Result<Self> {
        let name = subject.as_x509_name()?;
        let spki = key.as_spki()?;
        let key_id = key_identifier(&spki);

        let extensions = vec![
            ExtensionParam::from_extension(
                BasicConstraints {
                    is_ca: true,
                    max_path_length: None,
                },
                true,
            )?,
            ExtensionParam::from_extension(
                KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign),
                true,
            )?,
            ExtensionParam::from_extension(SubjectKeyIdentifier(key_id), false)?,
        ];

        TbsCertificate::new(serial_number, name.clone(), validity, name, spki, extensions)
            .sign(key)
    }
}

/// RFC 5280 method 1 key identifier: SHA-1 over the subjectPublicKey bits.
pub fn key_identifier(spki: &SubjectPublicKeyInfoOwned) -> Vec<u8> {
    Sha1::digest(spki.subject_public_key.raw_bytes()).to_vec()
}
