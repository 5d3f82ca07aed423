//! Per-record Authenticated Encryption
//!
//! - Argon2id derives a 256-bit key from the password and a random salt
//! - AES-256-GCM encrypts the JSON plaintext under a random 96-bit IV
//! - The GCM tag is stored separately as `mac`
//!
//! Every parameter needed for decryption is written into the record.

#![allow(deprecated)] // GenericArray::from_slice deprecated in generic-array 1.x

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::types::{
    CipherParams, CryptoSection, EncryptedAccountRecord, KdfParamsRecord, KeystoreAccount,
    MnemonicMeta,
};
use crate::error::{WalletError, WalletResult};

pub const KEYSTORE_VERSION: u32 = 1;
pub const CIPHER_NAME: &str = "aes-256-gcm";
pub const KDF_NAME: &str = "argon2id";

const KEY_LEN: usize = 32;
const SALT_LEN: usize = 32;
const MIN_SALT_LEN: usize = 8;
const IV_LEN: usize = 12;
const MAC_LEN: usize = 16;

/// Upper bounds on stored KDF costs: four times the defaults
pub const MAX_M_COST: u32 = 4 * 65536;
pub const MAX_T_COST: u32 = 4 * 3;
pub const MAX_P_COST: u32 = 4 * 4;

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub m_cost: u32,
    /// Time cost (iterations)
    pub t_cost: u32,
    /// Parallelism
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        // 64 MiB memory, 3 iterations, 4 parallel lanes
        Self {
            m_cost: 65536,
            t_cost: 3,
            p_cost: 4,
        }
    }
}

impl KdfParams {
    /// Cheap parameters for tests and throwaway wallets
    pub fn light() -> Self {
        Self {
            m_cost: 1024,
            t_cost: 1,
            p_cost: 1,
        }
    }

    /// Reject parameters argon2 would refuse or that exceed the cost limits
    pub fn validate(&self) -> WalletResult<()> {
        if !self.within_limits() {
            return Err(WalletError::configuration(format!(
                "KDF params exceed limits (m_cost <= {}, t_cost <= {}, p_cost <= {})",
                MAX_M_COST, MAX_T_COST, MAX_P_COST
            )));
        }
        self.to_argon2().map(|_| ())
    }

    pub fn within_limits(&self) -> bool {
        self.m_cost <= MAX_M_COST && self.t_cost <= MAX_T_COST && self.p_cost <= MAX_P_COST
    }

    fn to_argon2(&self) -> WalletResult<Params> {
        Params::new(self.m_cost, self.t_cost, self.p_cost, Some(KEY_LEN))
            .map_err(|e| WalletError::configuration(format!("Invalid KDF params: {}", e)))
    }
}

/// Encrypt a plaintext account record with `password`
pub fn encrypt_keystore(
    account: &KeystoreAccount,
    password: &str,
    params: &KdfParams,
) -> WalletResult<EncryptedAccountRecord> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let key = derive_key(password, &salt, params)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_ref())
        .map_err(|e| WalletError::internal(format!("Failed to create cipher: {}", e)))?;

    let plaintext = Zeroizing::new(serde_json::to_vec(account)?);
    let mut sealed = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext.as_slice())
        .map_err(|e| WalletError::internal(format!("Encryption failed: {}", e)))?;

    // aes-gcm appends the tag to the ciphertext
    let mac = sealed.split_off(sealed.len() - MAC_LEN);

    Ok(EncryptedAccountRecord {
        address: account
            .address
            .trim_start_matches("0x")
            .to_ascii_lowercase(),
        version: KEYSTORE_VERSION,
        crypto: CryptoSection {
            cipher: CIPHER_NAME.to_string(),
            ciphertext: hex::encode(&sealed),
            cipherparams: CipherParams {
                iv: hex::encode(iv),
            },
            kdf: KDF_NAME.to_string(),
            kdfparams: KdfParamsRecord {
                params: *params,
                dklen: KEY_LEN as u32,
                salt: hex::encode(salt),
            },
            mac: hex::encode(mac),
        },
        mnemonic: account.mnemonic.as_ref().map(|m| MnemonicMeta {
            path: m.path.clone(),
            locale: m.locale.clone(),
        }),
    })
}

/// Decrypt a record; a wrong password surfaces as an authentication error
pub fn decrypt_keystore(
    record: &EncryptedAccountRecord,
    password: &str,
) -> WalletResult<KeystoreAccount> {
    if record.version != KEYSTORE_VERSION {
        return Err(WalletError::unsupported_cipher(format!(
            "Unsupported keystore version: {}",
            record.version
        )));
    }

    let crypto = &record.crypto;
    if crypto.cipher != CIPHER_NAME {
        return Err(WalletError::unsupported_cipher(format!(
            "Unsupported cipher: {}",
            crypto.cipher
        )));
    }
    if crypto.kdf != KDF_NAME {
        return Err(WalletError::unsupported_cipher(format!(
            "Unsupported kdf: {}",
            crypto.kdf
        )));
    }
    if crypto.kdfparams.dklen as usize != KEY_LEN {
        return Err(WalletError::unsupported_cipher(format!(
            "Unsupported key length: {}",
            crypto.kdfparams.dklen
        )));
    }

    let params = &crypto.kdfparams.params;
    if !params.within_limits() {
        return Err(WalletError::unsupported_cipher(format!(
            "KDF params exceed limits: m_cost={}, t_cost={}, p_cost={}",
            params.m_cost, params.t_cost, params.p_cost
        )));
    }

    let salt = hex::decode(&crypto.kdfparams.salt)?;
    let iv = hex::decode(&crypto.cipherparams.iv)?;
    let mut sealed = hex::decode(&crypto.ciphertext)?;
    let mac = hex::decode(&crypto.mac)?;

    if salt.len() < MIN_SALT_LEN {
        return Err(WalletError::parse_error("Invalid salt length"));
    }
    if iv.len() != IV_LEN {
        return Err(WalletError::parse_error("Invalid iv length"));
    }
    if mac.len() != MAC_LEN {
        return Err(WalletError::parse_error("Invalid mac length"));
    }
    sealed.extend_from_slice(&mac);

    let key = derive_key(password, &salt, params)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_ref())
        .map_err(|e| WalletError::internal(format!("Failed to create cipher: {}", e)))?;

    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(&iv), sealed.as_ref())
            .map_err(|_| {
                WalletError::authentication(
                    "Decryption failed - incorrect password or corrupted data",
                )
            })?,
    );

    serde_json::from_slice(&plaintext).map_err(|e| {
        WalletError::integrity(format!("Decrypted record is not a keystore account: {}", e))
    })
}

/// Derive the record key from the password using Argon2id
fn derive_key(password: &str, salt: &[u8], params: &KdfParams) -> WalletResult<Zeroizing<[u8; KEY_LEN]>> {
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.to_argon2()?);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(password.as_bytes(), salt, key.as_mut())
        .map_err(|e| WalletError::configuration(format!("Key derivation failed: {}", e)))?;

    Ok(key)
}
