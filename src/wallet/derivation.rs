//! Key Derivation
//!
//! Turns a mnemonic plus a path into an `Account`.
//!
//! Two modes exist:
//! - `Master`: single-level. The key is the master node of the seed
//!   (`HMAC-SHA512("Bitcoin seed", seed)`), the path is kept as metadata
//!   only and index, depth and parent fingerprint stay zero. Every path
//!   yields the same key. This is the format existing keystores use.
//! - `Bip32`: full hierarchical derivation along the path.
//!
//! SECURITY: the seed and the HMAC output are zeroized on drop.

use bitcoin::bip32::Xpriv;
use bitcoin::Network;
use hmac::{Hmac, Mac};
use secp256k1::{Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

use super::account::Account;
use super::derivation_path::{last_index, parse_path, DEFAULT_PATH};
use super::mnemonic::Mnemonic;
use crate::error::{WalletError, WalletResult};
use crate::log_debug;

/// HMAC key for the master node
pub const MASTER_SECRET: &[u8] = b"Bitcoin seed";

/// How an account key is derived from the seed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DerivationMode {
    #[default]
    Master,
    Bip32,
}

impl fmt::Display for DerivationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DerivationMode::Master => write!(f, "master"),
            DerivationMode::Bip32 => write!(f, "bip32"),
        }
    }
}

/// One derived key with its lineage
#[derive(Clone, Copy)]
pub struct KeyNode {
    pub secret_key: SecretKey,
    pub chain_code: [u8; 32],
    pub parent_fingerprint: [u8; 4],
    pub index: u32,
    pub depth: u8,
}

impl KeyNode {
    /// Root node: index 0, depth 0, all-zero parent fingerprint
    pub fn root(secret_key: SecretKey, chain_code: [u8; 32]) -> Self {
        Self {
            secret_key,
            chain_code,
            parent_fingerprint: [0u8; 4],
            index: 0,
            depth: 0,
        }
    }
}

/// Master node of `seed`
pub fn master_node(seed: &[u8]) -> WalletResult<KeyNode> {
    let mut mac = Hmac::<Sha512>::new_from_slice(MASTER_SECRET)
        .map_err(|e| WalletError::internal(format!("HMAC init failed: {}", e)))?;
    mac.update(seed);

    let mut output = Zeroizing::new([0u8; 64]);
    output.copy_from_slice(&mac.finalize().into_bytes());

    // Left half is the scalar; out-of-range values are rejected here
    let secret_key = SecretKey::from_slice(&output[..32])?;
    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(&output[32..]);

    Ok(KeyNode::root(secret_key, chain_code))
}

/// Node at `path` by full BIP-32 derivation
pub fn bip32_node(seed: &[u8], path: &str) -> WalletResult<KeyNode> {
    let secp = Secp256k1::new();
    let parsed = parse_path(path)?;
    let master = Xpriv::new_master(Network::Bitcoin, seed)?;
    let child = master.derive_priv(&secp, &parsed)?;

    Ok(KeyNode {
        secret_key: child.private_key,
        chain_code: child.chain_code.to_bytes(),
        parent_fingerprint: child.parent_fingerprint.to_bytes(),
        index: last_index(&parsed),
        depth: child.depth,
    })
}

/// Derive the account at `path` (or `DEFAULT_PATH`) in the default
/// single-level mode
pub fn derive_account(mnemonic: Arc<Mnemonic>, path: Option<&str>) -> WalletResult<Account> {
    derive_account_with(mnemonic, path.unwrap_or(DEFAULT_PATH), DerivationMode::Master)
}

pub fn derive_account_with(
    mnemonic: Arc<Mnemonic>,
    path: &str,
    mode: DerivationMode,
) -> WalletResult<Account> {
    // The path is validated in both modes so stored metadata is always parseable
    parse_path(path)?;
    let seed = mnemonic.compute_seed();

    let node = match mode {
        DerivationMode::Master => master_node(seed.as_ref())?,
        DerivationMode::Bip32 => bip32_node(seed.as_ref(), path)?,
    };

    let account = Account::from_node(node, Some(path.to_string()), mode, Some(mnemonic));
    log_debug!(
        "derivation",
        "derived account",
        address = account.address(),
        path = path,
        mode = mode
    );
    Ok(account)
}
