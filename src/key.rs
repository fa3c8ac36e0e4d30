use std::fmt;

use const_oid::ObjectIdentifier;
use der::Decode;
use rsa::{
    BigUint, RsaPrivateKey, RsaPublicKey,
    pkcs1::DecodeRsaPrivateKey,
    pkcs1v15::{Signature, SigningKey as RsaSigningKey, VerifyingKey as RsaVerifyingKey},
    pkcs8::{DecodePrivateKey, EncodePrivateKey},
    signature::{SignatureEncoding, Signer, Verifier},
};
use sha2::{Sha256, Sha384, Sha512};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::error::{CaError, Result};

const PKCS8_LABEL: &str = "PRIVATE KEY";
const PKCS1_LABEL: &str = "RSA PRIVATE KEY";

/// Largest RSA modulus accepted in a public key, in bits.
pub const MAX_RSA_PUBLIC_KEY_BITS: usize = 16384;

/// An RSA key pair used to sign certificates.
///
/// The CA signs with RSA only, so RSA is the only key type held here. Subject keys of
/// other types can still be certified; they are carried as raw SPKI.
#[derive(Clone)]
pub struct KeyPair {
    private: Box<RsaPrivateKey>,
    public: RsaPublicKey,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate an RSA key pair with the specified number of bits.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        let mut rng = rand_core::OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits)?;
        Ok(Self::from_private_key(private))
    }

    pub fn from_private_key(private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        KeyPair {
            private: Box::new(private),
            public,
        }
    }

    /// Import an unencrypted PKCS#8 (`PRIVATE KEY`) PEM.
    pub fn import_from_pkcs8_pem(pem: &str) -> Result<Self> {
        let private = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| CaError::DecodingError(e.to_string()))?;
        Ok(Self::from_private_key(private))
    }

    /// Import a PEM private key, accepting PKCS#8 as well as legacy PKCS#1 encodings.
    pub fn import_from_pem(pem: &str) -> Result<Self> {
        let parsed = pem::parse(pem)?;
        match parsed.tag() {
            PKCS8_LABEL => {
                let private = RsaPrivateKey::from_pkcs8_der(parsed.contents())
                    .map_err(|e| CaError::DecodingError(e.to_string()))?;
                Ok(Self::from_private_key(private))
            }
            PKCS1_LABEL => {
                let private = RsaPrivateKey::from_pkcs1_der(parsed.contents())
                    .map_err(|e| CaError::DecodingError(e.to_string()))?;
                Ok(Self::from_private_key(private))
            }
            other => Err(CaError::DecodingError(format!(
                "unsupported private key PEM label {other:?}"
            ))),
        }
    }

    /// Export the private key as an unencrypted PKCS#8 PEM.
    pub fn to_pkcs8_pem(&self) -> Result<String> {
        let pem = self.private.to_pkcs8_pem(pkcs8::LineEnding::LF)?;
        Ok(pem.to_string())
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    /// The public half as a `SubjectPublicKeyInfo`.
    pub fn as_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        Ok(SubjectPublicKeyInfoOwned::from_key(self.public.clone())?)
    }

    /// Signs `data` with RSASSA-PKCS1-v1_5 over SHA-256.
    pub fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.sign_with(SignatureAlgorithm::Sha256WithRSA, data)
    }

    /// Signs `data` with RSASSA-PKCS1-v1_5 using the digest named by `algorithm`.
    pub fn sign_with(&self, algorithm: SignatureAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
        let private = *self.private.clone();
        let signature = match algorithm {
            SignatureAlgorithm::Sha256WithRSA => RsaSigningKey::<Sha256>::new(private)
                .try_sign(data)
                .map(|sig| sig.to_vec()),
            SignatureAlgorithm::Sha384WithRSA => RsaSigningKey::<Sha384>::new(private)
                .try_sign(data)
                .map(|sig| sig.to_vec()),
            SignatureAlgorithm::Sha512WithRSA => RsaSigningKey::<Sha512>::new(private)
                .try_sign(data)
                .map(|sig| sig.to_vec()),
        };
        signature.map_err(|e| CaError::KeyError(e.to_string()))
    }

    /// Whether `spki` holds the public half of this key pair.
    pub fn matches(&self, spki: &SubjectPublicKeyInfoOwned) -> bool {
        rsa_public_key(spki).is_ok_and(|public| public == self.public)
    }
}

/// Extracts an RSA public key from a `SubjectPublicKeyInfo`.
///
/// Moduli up to [`MAX_RSA_PUBLIC_KEY_BITS`] are accepted, above the `rsa` crate's
/// default limit of 4096 bits.
pub fn rsa_public_key(spki: &SubjectPublicKeyInfoOwned) -> Result<RsaPublicKey> {
    if spki.algorithm.oid != const_oid::db::rfc5912::RSA_ENCRYPTION {
        return Err(CaError::InvalidInput(format!(
            "expected an RSA public key, found {}",
            public_key_algorithm_name(&spki.algorithm.oid)
        )));
    }
    let bytes = spki.subject_public_key.as_bytes().ok_or_else(|| {
        CaError::DecodingError("RSA public key has unused bits".to_string())
    })?;
    let key = rsa::pkcs1::RsaPublicKey::from_der(bytes)
        .map_err(|e| CaError::DecodingError(e.to_string()))?;
    Ok(RsaPublicKey::new_with_max_size(
        BigUint::from_bytes_be(key.modulus.as_bytes()),
        BigUint::from_bytes_be(key.public_exponent.as_bytes()),
        MAX_RSA_PUBLIC_KEY_BITS,
    )?)
}

/// Verifies an RSASSA-PKCS1-v1_5 signature over `data` with the digest named by `algorithm`.
pub fn verify_with(
    public: &RsaPublicKey,
    algorithm: SignatureAlgorithm,
    data: &[u8],
    signature: &[u8],
) -> Result<()> {
    let signature =
        Signature::try_from(signature).map_err(|e| CaError::DecodingError(e.to_string()))?;
    let public = public.clone();
    let verified = match algorithm {
        SignatureAlgorithm::Sha256WithRSA => {
            RsaVerifyingKey::<Sha256>::new(public).verify(data, &signature)
        }
        SignatureAlgorithm::Sha384WithRSA => {
            RsaVerifyingKey::<Sha384>::new(public).verify(data, &signature)
        }
        SignatureAlgorithm::Sha512WithRSA => {
            RsaVerifyingKey::<Sha512>::new(public).verify(data, &signature)
        }
    };
    verified.map_err(|e| CaError::KeyError(e.to_string()))
}

/// The conventional name of a public key algorithm, falling back to the dotted OID.
pub fn public_key_algorithm_name(oid: &ObjectIdentifier) -> String {
    match *oid {
        const_oid::db::rfc5912::RSA_ENCRYPTION => "RSA".to_string(),
        const_oid::db::rfc5912::ID_EC_PUBLIC_KEY => "EC".to_string(),
        const_oid::db::rfc8410::ID_ED_25519 => "Ed25519".to_string(),
        const_oid::db::rfc8410::ID_X_25519 => "X25519".to_string(),
        _ => oid.to_string(),
    }
}
