//! Ethereum Personal Message Signing (EIP-191)
//!
//! Format: "\x19Ethereum Signed Message:\n" + len(message) + message

use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, PublicKey, Secp256k1, SecretKey,
};
use serde::{Deserialize, Serialize};

use crate::error::{WalletError, WalletResult};
use crate::utils::crypto::{address_from_uncompressed, keccak256};

const ETH_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Recoverable ECDSA signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// 27 + recovery id
    pub v: u8,
}

impl Signature {
    /// 65 bytes: r || s || v
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    pub fn from_bytes(bytes: &[u8]) -> WalletResult<Self> {
        if bytes.len() != 65 {
            return Err(WalletError::parse_error(format!(
                "Expected 65 signature bytes, got {}",
                bytes.len()
            )));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v: bytes[64] })
    }
}

/// keccak256 of the prefixed message
pub fn personal_sign_hash(message: &[u8]) -> [u8; 32] {
    let prefix = format!("{}{}", ETH_MESSAGE_PREFIX, message.len());
    let mut data = Vec::with_capacity(prefix.len() + message.len());
    data.extend_from_slice(prefix.as_bytes());
    data.extend_from_slice(message);
    keccak256(&data)
}

/// Sign a 32-byte digest
pub fn sign_digest(secret_key: &SecretKey, digest: &[u8; 32]) -> Signature {
    let secp = Secp256k1::signing_only();
    let msg = Message::from_digest(*digest);
    let sig = secp.sign_ecdsa_recoverable(&msg, secret_key);
    let (recovery_id, sig_bytes) = sig.serialize_compact();

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&sig_bytes[..32]);
    s.copy_from_slice(&sig_bytes[32..]);

    Signature {
        r,
        s,
        v: 27 + recovery_id.to_i32() as u8,
    }
}

/// Recover the checksummed signer address of an EIP-191 signature
pub fn recover_address(message: &[u8], signature: &Signature) -> WalletResult<String> {
    let recovery = if signature.v >= 27 { signature.v - 27 } else { signature.v };
    let recovery_id = RecoveryId::from_i32(recovery as i32)
        .map_err(|e| WalletError::parse_error(format!("Invalid recovery id: {}", e)))?;

    let mut compact = [0u8; 64];
    compact[..32].copy_from_slice(&signature.r);
    compact[32..].copy_from_slice(&signature.s);
    let recoverable = RecoverableSignature::from_compact(&compact, recovery_id)
        .map_err(|e| WalletError::parse_error(format!("Invalid signature: {}", e)))?;

    let secp = Secp256k1::verification_only();
    let msg = Message::from_digest(personal_sign_hash(message));
    let public_key: PublicKey = secp
        .recover_ecdsa(&msg, &recoverable)
        .map_err(|e| WalletError::parse_error(format!("Recovery failed: {}", e)))?;

    Ok(address_from_uncompressed(&public_key.serialize_uncompressed()))
}

/// True if `signature` over `message` was produced by `address`
pub fn verify_message(message: &[u8], signature: &Signature, address: &str) -> WalletResult<bool> {
    let recovered = recover_address(message, signature)?;
    Ok(recovered.eq_ignore_ascii_case(address))
}
