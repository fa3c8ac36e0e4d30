use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use certauthority::anchor::TrustAnchor;
use certauthority::cert::Certificate;
use certauthority::cert::extensions::SubjectAltName;
use certauthority::cert::params::{DistinguishedName, ExtensionParam, Validity};
use certauthority::csr::CertificationRequestInfo;
use certauthority::engine::CertificateAuthority;
use certauthority::error::CaError;
use certauthority::key::KeyPair;
use certauthority::store::MemoryCertificateStore;
use certauthority::verify::SignatureValidationRequest;

fn main() -> Result<(), CaError> {
    // Bootstrap a throwaway root CA
    let ca_key = KeyPair::generate_rsa(2048)?;
    let ca_subject = DistinguishedName::builder()
        .common_name("My Test CA".to_string())
        .organization("Example".to_string())
        .country("US".to_string())
        .build();
    let ca_cert = Certificate::new_self_signed(&ca_subject, &ca_key, Validity::for_days(3650), 1)?;
    println!("CA Certificate PEM:\n{}", ca_cert.to_pem()?);

    let anchor = TrustAnchor::new(ca_cert, ca_key)?;
    let ca = CertificateAuthority::new(Arc::new(anchor), Arc::new(MemoryCertificateStore::new()))
        .with_proof_of_possession(true);

    // A client builds a CSR for its own key
    let server_key = KeyPair::generate_rsa(2048)?;
    let csr = CertificationRequestInfo::builder()
        .subject(
            DistinguishedName::builder()
                .common_name("myserver.local".to_string())
                .build(),
        )
        .extensions(vec![ExtensionParam::from_extension(
            SubjectAltName {
                names: vec!["myserver.local".to_string()],
            },
            false,
        )?])
        .build()
        .to_pem(&server_key)?;

    let issuance = ca.issue_certificate(&csr)?;
    println!("Server Certificate PEM:\n{}", issuance.certificate_pem);

    let record = ca.certificate_by_serial_number(&issuance.record.serial_number)?;
    println!(
        "Stored record #{}: serial {} for {} ({})",
        record.id, record.serial_number, record.common_name, record.status
    );

    let signature = STANDARD.encode(server_key.sign_data(b"hello")?);
    let validation = ca.validate_signature(&SignatureValidationRequest {
        certificate_pem: issuance.certificate_pem,
        data: "hello".to_string(),
        signature,
    });
    println!("{validation:?}");

    Ok(())
}
