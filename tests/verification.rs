mod util;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use certauthority::anchor::TrustAnchor;
use certauthority::cert::Certificate;
use certauthority::cert::params::{DistinguishedName, Validity};
use certauthority::csr::ParsedCsr;
use certauthority::issuer::Issuer;
use certauthority::key::KeyPair;
use certauthority::verify::{
    self, ChainError, SignatureValidation, SignatureValidationRequest, Verification,
};
use time::{Duration, OffsetDateTime};

fn issued_pem() -> String {
    let (ca, _) = util::engine();
    ca.issue_certificate(&util::csr_pem(util::server_subject(), vec![]))
        .unwrap()
        .certificate_pem
}

fn sign(data: &str) -> String {
    STANDARD.encode(util::subject_key().sign_data(data.as_bytes()).unwrap())
}

fn request(certificate_pem: String, data: &str, signature: String) -> SignatureValidationRequest {
    SignatureValidationRequest {
        certificate_pem,
        data: data.to_string(),
        signature,
    }
}

#[test]
fn correct_signature_is_accepted() {
    let (ca, _) = util::engine();
    let result = ca.validate_signature(&request(issued_pem(), "hello", sign("hello")));
    assert_eq!(
        result,
        SignatureValidation {
            certificate_valid: true,
            signature_valid: Some(true),
            message: None,
        }
    );
}

#[test]
fn signature_over_other_data_is_not_valid() {
    let (ca, _) = util::engine();
    let result = ca.validate_signature(&request(issued_pem(), "hello", sign("goodbye")));
    assert!(result.certificate_valid);
    assert_eq!(result.signature_valid, Some(false));
}

#[test]
fn malformed_base64_signature_is_not_valid() {
    let (ca, _) = util::engine();
    let result = ca.validate_signature(&request(issued_pem(), "hello", "%%%".to_string()));
    assert!(result.certificate_valid);
    assert_eq!(result.signature_valid, Some(false));
}

#[test]
fn foreign_self_signed_certificate_is_rejected() {
    let (ca, _) = util::engine();
    let foreign_key = KeyPair::generate_rsa(2048).unwrap();
    let foreign = Certificate::new_self_signed(
        &util::ca_subject(),
        &foreign_key,
        Validity::for_days(30),
        1,
    )
    .unwrap();
    let signature = STANDARD.encode(foreign_key.sign_data(b"hello").unwrap());

    let pem = foreign.to_pem().unwrap();
    let result = ca.validate_signature(&request(pem.clone(), "hello", signature.clone()));
    assert!(!result.certificate_valid);
    assert_eq!(result.signature_valid, None);
    assert_eq!(
        result.message.as_deref(),
        Some("Certificate was not issued by this CA")
    );

    let detailed = ca.verify_at(&request(pem, "hello", signature), OffsetDateTime::now_utc());
    assert_eq!(detailed, Verification::Rejected(ChainError::SignatureMismatch));
}

#[test]
fn expired_certificate_is_rejected() {
    let (ca, _) = util::engine();
    let pem = issued_pem();
    let later = OffsetDateTime::now_utc() + Duration::days(366);

    let detailed = ca.verify_at(&request(pem, "hello", sign("hello")), later);
    assert!(matches!(
        detailed,
        Verification::Rejected(ChainError::Expired(_))
    ));
    assert!(!SignatureValidation::from(&detailed).certificate_valid);
}

#[test]
fn certificate_naming_another_issuer_is_rejected() {
    // Signed with the CA key but under a different issuer name.
    let anchor = util::generate_ca_cert();
    let impostor_name = DistinguishedName::builder()
        .common_name("Somebody Else".to_string())
        .build()
        .as_x509_name()
        .unwrap();

    struct Impostor<'a> {
        name: x509_cert::name::Name,
        anchor: &'a TrustAnchor,
    }
    impl Issuer for Impostor<'_> {
        fn issuer_name(&self) -> &x509_cert::name::Name {
            &self.name
        }
        fn signing_key(&self) -> &KeyPair {
            self.anchor.private_key()
        }
    }

    let csr = ParsedCsr::from_pem(&util::csr_pem(util::server_subject(), vec![])).unwrap();
    let impostor = Impostor {
        name: impostor_name,
        anchor: &anchor,
    };
    let cert = impostor.issue(&csr, 42, Validity::for_days(1)).unwrap();

    assert!(matches!(
        verify::verify_chain(&cert, anchor.certificate(), OffsetDateTime::now_utc()),
        Err(ChainError::IssuerMismatch(_))
    ));
    assert!(!verify::is_trusted(&cert, anchor.certificate(), OffsetDateTime::now_utc()));
}

#[test]
fn garbage_certificate_is_rejected() {
    let (ca, _) = util::engine();
    let result = ca.validate_signature(&request(
        "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n".to_string(),
        "hello",
        sign("hello"),
    ));
    assert!(!result.certificate_valid);
}

#[test]
fn request_uses_camel_case_fields() {
    let json = serde_json::json!({
        "certificatePem": "pem",
        "data": "hello",
        "signature": "c2ln",
    });
    let parsed: SignatureValidationRequest = serde_json::from_value(json).unwrap();
    assert_eq!(parsed.certificate_pem, "pem");
    assert_eq!(parsed.signature, "c2ln");
}
