//! PKCS#10 certificate signing requests.
//!
//! [`ParsedCsr`] is what the issuer consumes. [`CertificationRequestInfo`] goes the other
//! way and produces signed requests, which is mostly useful to clients and tests.

use bon::Builder;
use const_oid::AssociatedOid;
use der::asn1::{Any, BitString, SetOfVec};
use der::{Decode, Encode};
use x509_cert::attr::Attribute;
use x509_cert::name::Name;
use x509_cert::request::{CertReq, CertReqInfo, ExtensionReq};
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::cert::SignatureAlgorithm;
use crate::cert::params::{DistinguishedName, ExtensionParam};
use crate::error::{CaError, Result};
use crate::key::{self, KeyPair};
use crate::pem_utils::{CSR_LABELS, der_to_pem, pem_to_der};

/// The parts of a certificate signing request that end up in an issued certificate.
///
/// The subject and public key are kept exactly as encoded in the request. The request's
/// own signature is retained so proof of possession can be checked on demand.
#[derive(Debug, Clone)]
pub struct ParsedCsr {
    pub subject: Name,
    pub public_key: SubjectPublicKeyInfoOwned,
    /// Entries of the PKCS#9 `extensionRequest` attribute, in request order.
    pub extensions: Vec<ExtensionParam>,
    info_der: Vec<u8>,
    signature_algorithm: AlgorithmIdentifierOwned,
    signature: Vec<u8>,
}

impl ParsedCsr {
    /// Parses a PEM `CERTIFICATE REQUEST` (or legacy `NEW CERTIFICATE REQUEST`).
    ///
    /// Every failure, including empty input, is reported as [`CaError::InvalidCsr`].
    pub fn from_pem(pem: &str) -> Result<Self> {
        let der = pem_to_der(pem, CSR_LABELS).map_err(invalid_csr)?;
        Self::from_der(&der)
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        let request = CertReq::from_der(der).map_err(invalid_csr)?;
        let extensions = requested_extensions(&request.info.attributes)?;
        let info_der = request.info.to_der().map_err(invalid_csr)?;

        Ok(Self {
            subject: request.info.subject,
            public_key: request.info.public_key,
            extensions,
            info_der,
            signature_algorithm: request.algorithm,
            signature: request.signature.raw_bytes().to_vec(),
        })
    }

    /// The subject attributes this crate knows about. Nothing is validated here; the
    /// subject goes into the certificate as encoded.
    pub fn subject_fields(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.subject)
    }

    /// Checks the request's self-signature against its own public key.
    ///
    /// Only RSA PKCS#1 v1.5 with SHA-256, SHA-384 or SHA-512 is understood; anything
    /// else fails.
    pub fn verify_proof_of_possession(&self) -> Result<()> {
        let algorithm = SignatureAlgorithm::from_oid(&self.signature_algorithm.oid).ok_or_else(
            || {
                CaError::InvalidCsr(format!(
                    "unsupported CSR signature algorithm {}",
                    crate::cert::signature_algorithm_name(&self.signature_algorithm.oid)
                ))
            },
        )?;
        let public = key::rsa_public_key(&self.public_key).map_err(invalid_csr)?;
        key::verify_with(&public, algorithm, &self.info_der, &self.signature)
            .map_err(|_| CaError::InvalidCsr("CSR signature does not verify".to_string()))
    }
}

fn invalid_csr(err: impl std::fmt::Display) -> CaError {
    CaError::InvalidCsr(err.to_string())
}

fn requested_extensions(attributes: &SetOfVec<Attribute>) -> Result<Vec<ExtensionParam>> {
    let mut extensions = Vec::new();
    for attribute in attributes.iter().filter(|a| a.oid == ExtensionReq::OID) {
        for value in attribute.values.iter() {
            let encoded = value.to_der().map_err(invalid_csr)?;
            let request = ExtensionReq::from_der(&encoded).map_err(invalid_csr)?;
            extensions.extend(request.0.iter().map(ExtensionParam::from_x509));
        }
    }
    Ok(extensions)
}

/// The content of a certificate signing request before it is signed.
#[derive(Debug, Clone, Builder)]
pub struct CertificationRequestInfo {
    pub subject: DistinguishedName,
    /// Requested extensions, sent as a PKCS#9 `extensionRequest` attribute.
    #[builder(default)]
    pub extensions: Vec<ExtensionParam>,
}

impl CertificationRequestInfo {
    /// Builds the request for `key` and signs it with SHA-256 with RSA.
    pub fn sign(&self, key: &KeyPair) -> Result<CertReq> {
        let mut attributes = Vec::new();
        if !self.extensions.is_empty() {
            let request = ExtensionReq(
                self.extensions
                    .iter()
                    .map(ExtensionParam::to_x509)
                    .collect::<Result<Vec<_>>>()?,
            );
            attributes.push(Attribute {
                oid: ExtensionReq::OID,
                values: SetOfVec::try_from(vec![Any::encode_from(&request)?])?,
            });
        }

        let info = CertReqInfo {
            version: x509_cert::request::Version::V1,
            subject: self.subject.as_x509_name()?,
            public_key: key.as_spki()?,
            attributes: SetOfVec::try_from(attributes)?,
        };

        let algorithm = SignatureAlgorithm::Sha256WithRSA;
        let signature = key.sign_with(algorithm, &info.to_der()?)?;
        Ok(CertReq {
            info,
            algorithm: algorithm.into(),
            signature: BitString::from_bytes(&signature)?,
        })
    }

    /// Signs the request and encodes it as a PEM `CERTIFICATE REQUEST`.
    pub fn to_pem(&self, key: &KeyPair) -> Result<String> {
        let der = self.sign(key)?.to_der()?;
        Ok(der_to_pem(&der, CSR_LABELS[0]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::extensions::{BasicConstraints, SubjectAltName};

    fn subject(cn: &str) -> DistinguishedName {
        DistinguishedName::builder()
            .common_name(cn.to_string())
            .organization("Example".to_string())
            .country("US".to_string())
            .build()
    }

    #[test]
    fn round_trips_subject_key_and_extensions() {
        let key = KeyPair::generate_rsa(1024).unwrap();
        let san = SubjectAltName {
            names: vec!["test.example.com".to_string()],
        };
        let pem = CertificationRequestInfo::builder()
            .subject(subject("test.example.com"))
            .extensions(vec![
                ExtensionParam::from_extension(san, false).unwrap(),
                ExtensionParam::from_extension(BasicConstraints::default(), true).unwrap(),
            ])
            .build()
            .to_pem(&key)
            .unwrap();
        assert!(pem.starts_with("-----BEGIN CERTIFICATE REQUEST-----"));

        let csr = ParsedCsr::from_pem(&pem).unwrap();
        assert_eq!(csr.subject_fields(), subject("test.example.com"));
        assert!(key.matches(&csr.public_key));
        assert_eq!(csr.extensions.len(), 2);
        let san: SubjectAltName = csr.extensions[0].to_extension().unwrap();
        assert_eq!(san.names, vec!["test.example.com".to_string()]);
        assert!(csr.extensions[1].critical);
        assert!(csr.verify_proof_of_possession().is_ok());
    }

    #[test]
    fn request_without_extensions_has_no_attributes() {
        let key = KeyPair::generate_rsa(1024).unwrap();
        let info = CertificationRequestInfo::builder()
            .subject(subject("bare"))
            .build();
        let request = info.sign(&key).unwrap();
        assert!(request.info.attributes.is_empty());
        let csr = ParsedCsr::from_der(&request.to_der().unwrap()).unwrap();
        assert!(csr.extensions.is_empty());
    }

    #[test]
    fn garbage_is_an_invalid_csr() {
        for input in ["", "not a pem", "-----BEGIN CERTIFICATE REQUEST-----\n!!\n-----END CERTIFICATE REQUEST-----\n"] {
            assert!(matches!(ParsedCsr::from_pem(input), Err(CaError::InvalidCsr(_))));
        }
        let wrong_label = der_to_pem(&[0x30, 0x00], "CERTIFICATE");
        assert!(matches!(ParsedCsr::from_pem(&wrong_label), Err(CaError::InvalidCsr(_))));
        let not_a_request = der_to_pem(&[0x30, 0x00], "CERTIFICATE REQUEST");
        assert!(matches!(ParsedCsr::from_pem(&not_a_request), Err(CaError::InvalidCsr(_))));
    }

    #[test]
    fn forged_signature_fails_proof_of_possession() {
        let key = KeyPair::generate_rsa(1024).unwrap();
        let other = KeyPair::generate_rsa(1024).unwrap();
        let info = CertificationRequestInfo::builder()
            .subject(subject("victim.example.com"))
            .build();
        let mut request = info.sign(&key).unwrap();
        request.info.public_key = other.as_spki().unwrap();

        let csr = ParsedCsr::from_der(&request.to_der().unwrap()).unwrap();
        assert!(matches!(
            csr.verify_proof_of_possession(),
            Err(CaError::InvalidCsr(_))
        ));
    }

    #[test]
    fn subject_fields_are_taken_as_encoded() {
        let key = KeyPair::generate_rsa(1024).unwrap();
        let long_country = DistinguishedName::builder()
            .common_name(String::new())
            .country("USA".to_string())
            .build();
        let pem = CertificationRequestInfo::builder()
            .subject(long_country.clone())
            .build()
            .to_pem(&key)
            .unwrap();
        let csr = ParsedCsr::from_pem(&pem).unwrap();
        assert_eq!(csr.subject_fields(), long_country);
    }
}
