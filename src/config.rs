use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CaError, Result};

/// Top-level settings file.
///
/// ```toml
/// [ca]
/// certificate_path = "/certs/rootCA.crt"
/// private_key_path = "/certs/rootCA.key"
/// require_proof_of_possession = false
/// ```
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub ca: CaConfig,
}

/// Where the CA material lives and how strictly CSRs are checked.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CaConfig {
    #[serde(default = "default_certificate_path")]
    pub certificate_path: PathBuf,
    #[serde(default = "default_private_key_path")]
    pub private_key_path: PathBuf,
    /// Verify each CSR's self-signature before issuing.
    #[serde(default)]
    pub require_proof_of_possession: bool,
}

impl Default for CaConfig {
    fn default() -> Self {
        Self {
            certificate_path: default_certificate_path(),
            private_key_path: default_private_key_path(),
            require_proof_of_possession: false,
        }
    }
}

fn default_certificate_path() -> PathBuf {
    PathBuf::from("/certs/rootCA.crt")
}

fn default_private_key_path() -> PathBuf {
    PathBuf::from("/certs/rootCA.key")
}

impl Settings {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            CaError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
