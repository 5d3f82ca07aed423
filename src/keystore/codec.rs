//! Keystore document codec
//!
//! Each account is encrypted on its own with the shared password and the
//! records are collected into `{"accounts": [...]}` in wallet order.

use crate::error::{WalletError, WalletResult};
use crate::keystore::crypto::KdfParams;
use crate::keystore::types::KeystoreDocument;
use crate::log_debug;
use crate::wallet::Account;

/// Encrypt `accounts` and render the pretty-printed keystore document
pub fn dump_accounts(accounts: &[Account], password: &str, params: &KdfParams) -> WalletResult<String> {
    let records = accounts
        .iter()
        .enumerate()
        .map(|(i, account)| account.encrypt(password, params).map_err(|e| e.at_record(i)))
        .collect::<WalletResult<Vec<_>>>()?;

    log_debug!("keystore", "encrypted accounts", count = records.len());
    Ok(serde_json::to_string_pretty(&KeystoreDocument { accounts: records })?)
}

/// Parse a keystore document and recover every account in file order
///
/// The first record that fails aborts the whole load; the error names the
/// record index.
pub fn load_accounts(json: &str, password: &str) -> WalletResult<Vec<Account>> {
    let document: KeystoreDocument = serde_json::from_str(json)
        .map_err(|e| WalletError::from(e).with_details("keystore document is not valid JSON"))?;

    let accounts = document
        .accounts
        .iter()
        .enumerate()
        .map(|(i, record)| Account::decrypt(record, password).map_err(|e| e.at_record(i)))
        .collect::<WalletResult<Vec<_>>>()?;

    log_debug!("keystore", "recovered accounts", count = accounts.len());
    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::wallet::{derive_account_with, DerivationMode, Mnemonic};
    use std::sync::Arc;

    fn accounts(n: usize) -> Vec<Account> {
        let mnemonic = Arc::new(Mnemonic::from_entropy(&[7u8; 16]).unwrap());
        (0..n)
            .map(|i| {
                derive_account_with(
                    mnemonic.clone(),
                    &format!("m/44'/60'/0'/0/{}", i),
                    DerivationMode::Bip32,
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_dump_and_load_preserve_order() {
        let original = accounts(3);
        let json = dump_accounts(&original, "pw1", &KdfParams::light()).unwrap();
        let loaded = load_accounts(&json, "pw1").unwrap();

        assert_eq!(loaded.len(), 3);
        for (a, b) in original.iter().zip(&loaded) {
            assert_eq!(a.address(), b.address());
            assert_eq!(a.private_key(), b.private_key());
            assert_eq!(a.path(), b.path());
        }
    }

    #[test]
    fn test_document_shape() {
        let json = dump_accounts(&accounts(1), "pw1", &KdfParams::light()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let record = &value["accounts"][0];
        assert!(record["address"].is_string());
        assert!(record["crypto"]["ciphertext"].is_string());
        assert_eq!(record["mnemonic"]["path"], "m/44'/60'/0'/0/0");
        assert_eq!(record["mnemonic"]["locale"], "en");
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_empty_document() {
        let json = dump_accounts(&[], "pw1", &KdfParams::light()).unwrap();
        assert!(load_accounts(&json, "pw1").unwrap().is_empty());
    }

    #[test]
    fn test_wrong_password_fails_whole_load() {
        let json = dump_accounts(&accounts(2), "pw1", &KdfParams::light()).unwrap();
        let err = load_accounts(&json, "wrong-pw").unwrap_err();
        assert!(err.is_authentication());
        assert_eq!(err.details.as_deref(), Some("record 0"));
    }

    #[test]
    fn test_bad_record_is_named() {
        let json = dump_accounts(&accounts(3), "pw1", &KdfParams::light()).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["accounts"][2]["crypto"]["mac"] = serde_json::json!("00".repeat(16));

        let err = load_accounts(&value.to_string(), "pw1").unwrap_err();
        assert!(err.is_authentication());
        assert_eq!(err.details.as_deref(), Some("record 2"));
    }

    #[test]
    fn test_malformed_document() {
        let err = load_accounts("{\"accounts\": 5}", "pw1").unwrap_err();
        assert_eq!(err.code, ErrorCode::JsonError);
    }
}
