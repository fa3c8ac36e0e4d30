#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use certauthority::anchor::TrustAnchor;
use certauthority::cert::Certificate;
use certauthority::cert::params::{DistinguishedName, ExtensionParam, Validity};
use certauthority::csr::CertificationRequestInfo;
use certauthority::engine::CertificateAuthority;
use certauthority::key::KeyPair;
use certauthority::pem_utils::der_to_pem;
use certauthority::store::MemoryCertificateStore;
use der::Encode;
use der::asn1::BitString;
use x509_cert::name::Name;

pub const CA_COMMON_NAME: &str = "myca.local";

/// RSA key generation dominates test time; every test shares these two keys.
pub fn ca_key() -> &'static KeyPair {
    static KEY: OnceLock<KeyPair> = OnceLock::new();
    KEY.get_or_init(|| KeyPair::generate_rsa(2048).unwrap())
}

pub fn subject_key() -> &'static KeyPair {
    static KEY: OnceLock<KeyPair> = OnceLock::new();
    KEY.get_or_init(|| KeyPair::generate_rsa(2048).unwrap())
}

pub fn ca_subject() -> DistinguishedName {
    DistinguishedName::builder()
        .common_name(CA_COMMON_NAME.to_string())
        .organization("My CA".to_string())
        .country("US".to_string())
        .build()
}

pub fn generate_ca_cert() -> Arc<TrustAnchor> {
    let cert =
        Certificate::new_self_signed(&ca_subject(), ca_key(), Validity::for_days(3650), 1).unwrap();
    Arc::new(TrustAnchor::new(cert, ca_key().clone()).unwrap())
}

/// A fresh engine with an empty in-memory store.
pub fn engine() -> (CertificateAuthority, Arc<MemoryCertificateStore>) {
    let store = Arc::new(MemoryCertificateStore::new());
    let ca = CertificateAuthority::new(generate_ca_cert(), store.clone());
    (ca, store)
}

pub fn csr_pem(subject: DistinguishedName, extensions: Vec<ExtensionParam>) -> String {
    CertificationRequestInfo::builder()
        .subject(subject)
        .extensions(extensions)
        .build()
        .to_pem(subject_key())
        .unwrap()
}

/// A properly self-signed CSR whose subject is `subject` exactly as given.
pub fn csr_pem_for_name(subject: Name) -> String {
    let mut request = CertificationRequestInfo::builder()
        .subject(server_subject())
        .build()
        .sign(subject_key())
        .unwrap();
    request.info.subject = subject;
    let signature = subject_key()
        .sign_data(&request.info.to_der().unwrap())
        .unwrap();
    request.signature = BitString::from_bytes(&signature).unwrap();
    der_to_pem(&request.to_der().unwrap(), "CERTIFICATE REQUEST")
}

pub fn server_subject() -> DistinguishedName {
    DistinguishedName::builder()
        .common_name("test.example.com".to_string())
        .organization("Example".to_string())
        .organization_unit("Web".to_string())
        .country("AR".to_string())
        .state("Buenos Aires".to_string())
        .locality("La Plata".to_string())
        .email("admin@example.com".to_string())
        .build()
}
