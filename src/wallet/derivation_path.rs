//! Derivation Path Parsing
//!
//! Paths use BIP-32 syntax (`m/44'/60'/0'/0/7`); parsing is delegated to
//! `bitcoin::bip32` so hardened markers and index ranges match the
//! reference implementation.

use bitcoin::bip32::{ChildNumber, DerivationPath};
use std::str::FromStr;

use crate::error::{WalletError, WalletResult};

/// Ethereum account prefix; account `i` lives at `BASE_PATH` + `i`
pub const BASE_PATH: &str = "m/44'/60'/0'/0/";

/// Path used when a caller does not supply one
pub const DEFAULT_PATH: &str = "m/44'/60'/0'/0/0";

/// Hardened offset for BIP-32 derivation
pub const HARDENED: u32 = 0x8000_0000;

/// Parse a path string, mapping syntax errors to `InvalidPath`
pub fn parse_path(path: &str) -> WalletResult<DerivationPath> {
    DerivationPath::from_str(path.trim())
        .map_err(|e| WalletError::invalid_path(format!("Invalid derivation path '{}': {}", path, e)))
}

pub fn validate_path(path: &str) -> WalletResult<()> {
    parse_path(path).map(|_| ())
}

/// Validate a base prefix such as `m/44'/60'/0'/0/`
pub fn validate_base_path(base: &str) -> WalletResult<()> {
    if !base.ends_with('/') {
        return Err(WalletError::invalid_path(format!(
            "Base path '{}' must end with '/'",
            base
        )));
    }
    validate_path(base.trim_end_matches('/'))
}

/// Path of the account at `index` under `base`
pub fn account_path(base: &str, index: usize) -> WalletResult<String> {
    let path = format!("{}{}", base, index);
    validate_path(&path)?;
    Ok(path)
}

/// Raw child number of the last component (hardened bit included)
pub fn last_index(path: &DerivationPath) -> u32 {
    let children: &[ChildNumber] = path.as_ref();
    children
        .last()
        .map(|child| u32::from(*child))
        .unwrap_or(0)
}

pub fn is_hardened(child: ChildNumber) -> bool {
    u32::from(child) & HARDENED != 0
}
