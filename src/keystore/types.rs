//! Keystore record shapes, both the plaintext that gets encrypted and the
//! JSON document written to disk.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::crypto::KdfParams;
use crate::wallet::DerivationMode;

/// Decrypted account record
///
/// `private_key` is `0x`-prefixed hex. Zeroized on drop.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct KeystoreAccount {
    pub address: String,
    pub private_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<MnemonicRecord>,
}

impl fmt::Debug for KeystoreAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeystoreAccount")
            .field("address", &self.address)
            .field("private_key", &"[REDACTED]")
            .field("mnemonic", &self.mnemonic)
            .finish()
    }
}

/// Mnemonic block of the decrypted record; enough to re-derive the account
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct MnemonicRecord {
    pub path: String,
    pub locale: String,
    /// `0x`-prefixed hex entropy
    pub entropy: String,
    #[serde(default)]
    #[zeroize(skip)]
    pub derivation: DerivationMode,
}

impl fmt::Debug for MnemonicRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MnemonicRecord")
            .field("path", &self.path)
            .field("locale", &self.locale)
            .field("entropy", &"[REDACTED]")
            .field("derivation", &self.derivation)
            .finish()
    }
}

/// One encrypted account as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptedAccountRecord {
    /// Lowercase hex address without `0x`
    pub address: String,
    pub version: u32,
    pub crypto: CryptoSection,
    /// Cleartext recovery hints; the entropy itself stays inside `crypto`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<MnemonicMeta>,
}

/// Cipher, KDF and MAC parameters; enough to decrypt with the password alone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoSection {
    pub cipher: String,
    pub ciphertext: String,
    pub cipherparams: CipherParams,
    pub kdf: String,
    pub kdfparams: KdfParamsRecord,
    pub mac: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CipherParams {
    pub iv: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KdfParamsRecord {
    #[serde(flatten)]
    pub params: KdfParams,
    pub dklen: u32,
    pub salt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MnemonicMeta {
    pub path: String,
    pub locale: String,
}

/// Multi-account keystore file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeystoreDocument {
    pub accounts: Vec<EncryptedAccountRecord>,
}
