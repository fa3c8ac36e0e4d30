use tracing::debug;
use x509_cert::name::Name;

use crate::cert::extensions::{
    AuthorityKeyIdentifier, ExtendedKeyUsage, KeyUsage, SubjectAltName, ToAndFromX509Extension,
};
use crate::cert::params::{ExtensionParam, Validity};
use crate::cert::{Certificate, key_identifier};
use crate::csr::ParsedCsr;
use crate::error::Result;
use crate::key::KeyPair;
use crate::tbs_certificate::TbsCertificate;

/// Requested extensions that are copied from a CSR into the issued certificate.
pub const COPIED_EXTENSIONS: [der::oid::ObjectIdentifier; 3] = [
    SubjectAltName::OID,
    KeyUsage::OID,
    ExtendedKeyUsage::OID,
];

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    /// Returns the exact encoded name placed in the `issuer` field of issued certificates.
    fn issuer_name(&self) -> &Name;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// The key identifier advertised in `authorityKeyIdentifier`.
    ///
    /// Defaults to the SHA-1 of the signing key's public bits.
    fn authority_key_identifier(&self) -> Result<Vec<u8>> {
        Ok(key_identifier(&self.signing_key().as_spki()?))
    }

    /// Issues a certificate for the subject and public key of `csr`.
    ///
    /// The subject name and public key are carried over byte for byte. Of the requested
    /// extensions only `subjectAltName`, `keyUsage` and `extKeyUsage` survive, with their
    /// criticality; an `authorityKeyIdentifier` is always added. The result is signed with
    /// SHA-256 with RSA.
    ///
    /// Errors are returned as produced by the encoding and signing layers; callers decide
    /// how to surface them.
    fn issue(&self, csr: &ParsedCsr, serial_number: u64, validity: Validity) -> Result<Certificate> {
        let mut extensions: Vec<ExtensionParam> = Vec::with_capacity(csr.extensions.len() + 1);
        for requested in &csr.extensions {
            if COPIED_EXTENSIONS.contains(&requested.oid) {
                extensions.push(requested.clone());
            } else {
                debug!(oid = %requested.oid, "dropping requested extension");
            }
        }

        let authority_key_id = AuthorityKeyIdentifier {
            key_identifier: self.authority_key_identifier()?,
        };
        extensions.push(ExtensionParam::from_extension(authority_key_id, false)?);

        TbsCertificate::new(
            serial_number,
            self.issuer_name().clone(),
            validity,
            csr.subject.clone(),
            csr.public_key.clone(),
            extensions,
        )
        .sign(self.signing_key())
    }
}
