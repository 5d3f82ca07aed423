//! Wallet Configuration
//!
//! Defaults, environment overrides and validation for:
//! - keystore location
//! - account derivation prefix and derivation mode
//! - keystore KDF cost
//! - RPC endpoint used for balance queries

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::{WalletError, WalletResult};
use crate::keystore::crypto::KdfParams;
use crate::keystore::file::DEFAULT_KEYSTORE_FILE;
use crate::wallet::{validate_base_path, DerivationMode, BASE_PATH};

pub const ENV_KEYSTORE: &str = "HDVAULT_KEYSTORE";
pub const ENV_BASE_PATH: &str = "HDVAULT_BASE_PATH";
pub const ENV_DERIVATION: &str = "HDVAULT_DERIVATION";
pub const ENV_KDF: &str = "HDVAULT_KDF";
pub const ENV_RPC_URL: &str = "HDVAULT_RPC_URL";
pub const ENV_RPC_TIMEOUT: &str = "HDVAULT_RPC_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub keystore_path: PathBuf,
    pub base_path: String,
    pub derivation: DerivationMode,
    pub kdf: KdfParams,
    pub rpc_url: Option<String>,
    pub rpc_timeout_secs: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            keystore_path: PathBuf::from(DEFAULT_KEYSTORE_FILE),
            base_path: BASE_PATH.to_string(),
            derivation: DerivationMode::Master,
            kdf: KdfParams::default(),
            rpc_url: None,
            rpc_timeout_secs: 30,
        }
    }
}

impl WalletConfig {
    /// Defaults overlaid with `HDVAULT_*` environment variables
    pub fn from_env() -> WalletResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`, then validated
    pub fn from_lookup<F>(lookup: F) -> WalletResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_KEYSTORE) {
            config.keystore_path = PathBuf::from(path);
        }
        if let Some(base) = lookup(ENV_BASE_PATH) {
            config.base_path = base;
        }
        if let Some(mode) = lookup(ENV_DERIVATION) {
            config.derivation = match mode.to_ascii_lowercase().as_str() {
                "master" => DerivationMode::Master,
                "bip32" => DerivationMode::Bip32,
                other => {
                    return Err(WalletError::configuration(format!(
                        "{} must be 'master' or 'bip32', got '{}'",
                        ENV_DERIVATION, other
                    )))
                }
            };
        }
        if let Some(preset) = lookup(ENV_KDF) {
            config.kdf = match preset.to_ascii_lowercase().as_str() {
                "standard" => KdfParams::default(),
                "light" => KdfParams::light(),
                other => {
                    return Err(WalletError::configuration(format!(
                        "{} must be 'standard' or 'light', got '{}'",
                        ENV_KDF, other
                    )))
                }
            };
        }
        if let Some(url) = lookup(ENV_RPC_URL) {
            config.rpc_url = Some(url);
        }
        if let Some(secs) = lookup(ENV_RPC_TIMEOUT) {
            config.rpc_timeout_secs = secs.parse().map_err(|_| {
                WalletError::configuration(format!("{} must be a number of seconds", ENV_RPC_TIMEOUT))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config; missing fields take their defaults
    pub fn from_json(json: &str) -> WalletResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> WalletResult<()> {
        if self.keystore_path.as_os_str().is_empty() {
            return Err(WalletError::configuration("Keystore path is empty"));
        }
        validate_base_path(&self.base_path)?;
        self.kdf.validate()?;
        if let Some(url) = &self.rpc_url {
            validate_rpc_url(url)?;
        }
        if self.rpc_timeout_secs == 0 {
            return Err(WalletError::configuration("RPC timeout must be non-zero"));
        }
        Ok(())
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    pub fn with_keystore_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.keystore_path = path.into();
        self
    }

    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn with_derivation(mut self, mode: DerivationMode) -> Self {
        self.derivation = mode;
        self
    }

    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }
}

/// RPC endpoints must be absolute http(s) URLs
pub fn validate_rpc_url(raw: &str) -> WalletResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| WalletError::configuration(format!("Invalid RPC URL '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(WalletError::configuration(format!(
            "Unsupported RPC URL scheme '{}'",
            scheme
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = WalletConfig::default();
        assert_eq!(config.keystore_path, PathBuf::from("my-wallet.json"));
        assert_eq!(config.base_path, "m/44'/60'/0'/0/");
        assert_eq!(config.derivation, DerivationMode::Master);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overlay() {
        let config = WalletConfig::from_lookup(lookup_from(&[
            (ENV_KEYSTORE, "/tmp/w.json"),
            (ENV_KDF, "light"),
            (ENV_DERIVATION, "bip32"),
            (ENV_RPC_URL, "https://rpc.sepolia.org"),
            (ENV_RPC_TIMEOUT, "5"),
        ]))
        .unwrap();

        assert_eq!(config.keystore_path, PathBuf::from("/tmp/w.json"));
        assert_eq!(config.kdf, KdfParams::light());
        assert_eq!(config.derivation, DerivationMode::Bip32);
        assert_eq!(config.rpc_url.as_deref(), Some("https://rpc.sepolia.org"));
        assert_eq!(config.rpc_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_env_values() {
        assert!(WalletConfig::from_lookup(lookup_from(&[(ENV_KDF, "extreme")])).is_err());
        assert!(WalletConfig::from_lookup(lookup_from(&[(ENV_RPC_URL, "ftp://node")])).is_err());
        assert!(WalletConfig::from_lookup(lookup_from(&[(ENV_BASE_PATH, "m/44'/60'")])).is_err());
        assert!(WalletConfig::from_lookup(lookup_from(&[(ENV_RPC_TIMEOUT, "soon")])).is_err());
    }

    #[test]
    fn test_from_json_partial() {
        let config = WalletConfig::from_json(
            r#"{"keystore_path": "vault.json", "kdf": {"m_cost": 2048, "t_cost": 2, "p_cost": 1}}"#,
        )
        .unwrap();
        assert_eq!(config.keystore_path, PathBuf::from("vault.json"));
        assert_eq!(config.kdf.m_cost, 2048);
        assert_eq!(config.base_path, BASE_PATH);
    }
}
