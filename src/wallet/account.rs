//! Account
//!
//! A signing key plus its derivation lineage. Address, public key and
//! fingerprint are computed once from the key at construction.
//!
//! SECURITY: the secret scalar is erased on drop and never appears in
//! `Debug` output.

use bip39::Language;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use std::fmt;
use std::sync::{Arc, Weak};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::derivation::{derive_account_with, DerivationMode, KeyNode};
use super::mnemonic::{Mnemonic, ENGLISH_LOCALE};
use super::signer::{self, Signature};
use crate::api::BalanceProvider;
use crate::error::{WalletError, WalletResult};
use crate::keystore::crypto::{decrypt_keystore, encrypt_keystore, KdfParams};
use crate::keystore::types::{EncryptedAccountRecord, KeystoreAccount, MnemonicRecord};
use crate::utils::crypto::{address_from_uncompressed, decode_hex, fingerprint, hex_prefixed};
use crate::{log_debug, log_warn};

pub struct Account {
    secret_key: SecretKey,
    public_key: PublicKey,
    address: String,
    fingerprint: [u8; 4],
    parent_fingerprint: [u8; 4],
    chain_code: [u8; 32],
    path: Option<String>,
    index: u32,
    depth: u8,
    derivation: DerivationMode,
    mnemonic: Option<Arc<Mnemonic>>,
    provider: Option<Weak<dyn BalanceProvider>>,
}

impl Account {
    /// Build an account from a derived key node
    pub fn from_node(
        node: KeyNode,
        path: Option<String>,
        derivation: DerivationMode,
        mnemonic: Option<Arc<Mnemonic>>,
    ) -> Self {
        let secp = Secp256k1::signing_only();
        let public_key = PublicKey::from_secret_key(&secp, &node.secret_key);
        let address = address_from_uncompressed(&public_key.serialize_uncompressed());
        let fingerprint = fingerprint(&public_key.serialize());

        Self {
            secret_key: node.secret_key,
            public_key,
            address,
            fingerprint,
            parent_fingerprint: node.parent_fingerprint,
            chain_code: node.chain_code,
            path,
            index: node.index,
            depth: node.depth,
            derivation,
            mnemonic,
            provider: None,
        }
    }

    /// EIP-55 checksummed address
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Compressed public key, `0x`-prefixed hex
    pub fn public_key(&self) -> String {
        hex_prefixed(&self.public_key.serialize())
    }

    /// Private key, `0x`-prefixed hex
    pub fn private_key(&self) -> Zeroizing<String> {
        Zeroizing::new(hex_prefixed(&self.secret_key.secret_bytes()))
    }

    pub fn fingerprint(&self) -> String {
        hex_prefixed(&self.fingerprint)
    }

    pub fn parent_fingerprint(&self) -> String {
        hex_prefixed(&self.parent_fingerprint)
    }

    pub fn chain_code(&self) -> String {
        hex_prefixed(&self.chain_code)
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn derivation(&self) -> DerivationMode {
        self.derivation
    }

    pub fn mnemonic(&self) -> Option<&Arc<Mnemonic>> {
        self.mnemonic.as_ref()
    }

    /// Point this account at `provider` without taking ownership of it
    pub fn connect(&mut self, provider: &Arc<dyn BalanceProvider>) -> &mut Self {
        self.provider = Some(Arc::downgrade(provider));
        self
    }

    /// Live provider, if one is connected and still alive
    pub fn provider(&self) -> Option<Arc<dyn BalanceProvider>> {
        self.provider.as_ref().and_then(Weak::upgrade)
    }

    /// Native balance in wei from the connected provider
    pub fn balance(&self) -> WalletResult<u128> {
        let provider = self
            .provider()
            .ok_or_else(|| WalletError::provider("Account is not connected to a provider"))?;
        provider.get_balance(&self.address)
    }

    pub fn sign_digest(&self, digest: &[u8; 32]) -> Signature {
        signer::sign_digest(&self.secret_key, digest)
    }

    /// EIP-191 personal-sign signature over `message`
    pub fn sign_message(&self, message: &[u8]) -> Signature {
        self.sign_digest(&signer::personal_sign_hash(message))
    }

    /// Plaintext keystore record
    ///
    /// The mnemonic block is written only when it can be recovered
    /// unambiguously: a path is set, the wordlist is English and the
    /// passphrase is empty.
    pub fn to_keystore_record(&self) -> KeystoreAccount {
        let mnemonic = match (&self.path, &self.mnemonic) {
            (Some(path), Some(m)) if m.locale() == ENGLISH_LOCALE && !m.has_passphrase() => {
                Some(MnemonicRecord {
                    path: path.clone(),
                    locale: ENGLISH_LOCALE.to_string(),
                    entropy: m.entropy_hex().to_string(),
                    derivation: self.derivation,
                })
            }
            _ => None,
        };

        KeystoreAccount {
            address: self.address.clone(),
            private_key: self.private_key().to_string(),
            mnemonic,
        }
    }

    /// Encrypt this account; no disk I/O
    pub fn encrypt(&self, password: &str, params: &KdfParams) -> WalletResult<EncryptedAccountRecord> {
        let record = self.to_keystore_record();
        if record.mnemonic.is_none() {
            log_warn!(
                "account",
                "encrypting account without recoverable mnemonic",
                address = self.address
            );
        }
        encrypt_keystore(&record, password, params)
    }

    /// Decrypt `record` and rebuild the account from its mnemonic
    ///
    /// The re-derived address and private key must match the decrypted
    /// fields exactly. Records without an English mnemonic block cannot be
    /// recovered.
    pub fn decrypt(record: &EncryptedAccountRecord, password: &str) -> WalletResult<Self> {
        let plain = decrypt_keystore(record, password)?;

        if !same_address(&plain.address, &record.address) {
            return Err(WalletError::integrity(
                "Cleartext address does not match the encrypted account",
            ));
        }

        let stored = plain.mnemonic.as_ref().ok_or_else(|| {
            WalletError::unsupported_account("Record has no mnemonic; raw-key recovery is not supported")
        })?;

        if stored.locale != ENGLISH_LOCALE {
            return Err(WalletError::unsupported_account(format!(
                "Unsupported mnemonic locale '{}'",
                stored.locale
            )));
        }

        let entropy = Zeroizing::new(decode_hex(&stored.entropy)?);
        let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy, "")?;
        let account = derive_account_with(Arc::new(mnemonic), &stored.path, stored.derivation)?;

        let stored_key = Zeroizing::new(decode_hex(&plain.private_key)?);
        let key_matches: bool = account
            .secret_key
            .secret_bytes()
            .as_slice()
            .ct_eq(stored_key.as_slice())
            .into();

        if !key_matches || !same_address(&account.address, &plain.address) {
            return Err(WalletError::integrity(
                "Re-derived account does not match the decrypted keystore",
            ));
        }

        log_debug!("account", "recovered account", address = account.address, path = stored.path);
        Ok(account)
    }
}

fn same_address(a: &str, b: &str) -> bool {
    a.trim_start_matches("0x")
        .eq_ignore_ascii_case(b.trim_start_matches("0x"))
}

impl Clone for Account {
    fn clone(&self) -> Self {
        Self {
            secret_key: self.secret_key,
            public_key: self.public_key,
            address: self.address.clone(),
            fingerprint: self.fingerprint,
            parent_fingerprint: self.parent_fingerprint,
            chain_code: self.chain_code,
            path: self.path.clone(),
            index: self.index,
            depth: self.depth,
            derivation: self.derivation,
            mnemonic: self.mnemonic.clone(),
            provider: self.provider.clone(),
        }
    }
}

impl Drop for Account {
    fn drop(&mut self) {
        self.secret_key.non_secure_erase();
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .field("public_key", &self.public_key())
            .field("fingerprint", &self.fingerprint())
            .field("path", &self.path)
            .field("index", &self.index)
            .field("depth", &self.depth)
            .field("derivation", &self.derivation)
            .field("connected", &self.provider().is_some())
            .finish_non_exhaustive()
    }
}
