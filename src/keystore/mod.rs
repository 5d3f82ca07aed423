//! Encrypted keystore
//!
//! - `types`: plaintext and on-disk record shapes
//! - `crypto`: per-record AES-256-GCM with an Argon2id key
//! - `codec`: the multi-account `{"accounts": [...]}` document
//! - `file`: atomic keystore writes

pub mod codec;
pub mod crypto;
pub mod file;
pub mod types;

pub use codec::{dump_accounts, load_accounts};
pub use crypto::{decrypt_keystore, encrypt_keystore, KdfParams};
pub use file::{read_keystore, write_atomic, DEFAULT_KEYSTORE_FILE};
pub use types::{EncryptedAccountRecord, KeystoreAccount, KeystoreDocument};
