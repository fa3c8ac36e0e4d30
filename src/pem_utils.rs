use crate::error::{CaError, Result};

pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";
pub const CSR_LABELS: &[&str] = &["CERTIFICATE REQUEST", "NEW CERTIFICATE REQUEST"];

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(&pem, pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF))
}

/// Convert a PEM‑encoded string to DER‑encoded bytes, requiring one of `labels`.
pub fn pem_to_der(pem_str: &str, labels: &[&str]) -> Result<Vec<u8>> {
    if pem_str.trim().is_empty() {
        return Err(CaError::DecodingError("empty PEM input".to_string()));
    }
    let pem = pem::parse(pem_str)?;
    if !labels.contains(&pem.tag()) {
        return Err(CaError::DecodingError(format!(
            "unexpected PEM label {:?}, expected one of {:?}",
            pem.tag(),
            labels
        )));
    }
    Ok(pem.into_contents())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_mismatch_is_rejected() {
        let text = der_to_pem(&[0x30, 0x00], "PUBLIC KEY");
        assert!(pem_to_der(&text, CSR_LABELS).is_err());
        assert_eq!(pem_to_der(&text, &["PUBLIC KEY"]).unwrap(), vec![0x30, 0x00]);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(pem_to_der("", &[CERTIFICATE_LABEL]).is_err());
        assert!(pem_to_der("  \n", &[CERTIFICATE_LABEL]).is_err());
    }
}
