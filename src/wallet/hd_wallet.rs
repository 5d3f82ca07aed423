//! Wallet
//!
//! Owns the password, one mnemonic, the ordered account list and an
//! optional balance provider shared by every account.
//!
//! Every mutation that adds an account rewrites the keystore before it
//! returns. Calls that persist (`create_new_account`, `save`) must be
//! serialized by the caller; the wallet does no locking of its own.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use zeroize::Zeroizing;

use super::account::Account;
use super::derivation::derive_account_with;
use super::derivation_path::account_path;
use super::mnemonic::Mnemonic;
use crate::api::BalanceProvider;
use crate::error::{ErrorCode, WalletError, WalletResult};
use crate::keystore::{dump_accounts, load_accounts, read_keystore, write_atomic};
use crate::utils::units::format_ether;
use crate::utils::wallet_config::WalletConfig;
use crate::{log_info, log_warn};

/// Balance of one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub index: usize,
    pub address: String,
    /// Ether, decimal string
    pub balance: String,
    /// Wei
    pub balance_raw: u128,
}

pub struct Wallet {
    password: SecretString,
    mnemonic: Arc<Mnemonic>,
    accounts: Vec<Account>,
    provider: Option<Arc<dyn BalanceProvider>>,
    config: WalletConfig,
}

impl Wallet {
    /// New empty wallet with a fresh English mnemonic and default settings
    pub fn create(
        password: impl Into<String>,
        provider: Option<Arc<dyn BalanceProvider>>,
    ) -> WalletResult<Self> {
        Self::create_with_config(password, provider, WalletConfig::default())
    }

    pub fn create_with_config(
        password: impl Into<String>,
        provider: Option<Arc<dyn BalanceProvider>>,
        config: WalletConfig,
    ) -> WalletResult<Self> {
        config.validate()?;
        let mnemonic = Arc::new(Mnemonic::generate()?);
        log_info!("wallet", "created wallet", derivation = config.derivation);

        Ok(Self {
            password: SecretString::from(password.into()),
            mnemonic,
            accounts: Vec::new(),
            provider,
            config,
        })
    }

    /// Read and decrypt the keystore at `path` (or the default file)
    pub fn load(password: impl Into<String>, path: Option<&Path>) -> WalletResult<Self> {
        Self::load_with_config(password, path, WalletConfig::default())
    }

    /// Load with `config`; `path` overrides `config.keystore_path`
    ///
    /// The wallet adopts the mnemonic and derivation mode of the first
    /// recovered account so new accounts continue that account's sequence.
    /// A keystore without accounts carries no mnemonic and is rejected.
    pub fn load_with_config(
        password: impl Into<String>,
        path: Option<&Path>,
        mut config: WalletConfig,
    ) -> WalletResult<Self> {
        config.validate()?;
        let password = SecretString::from(password.into());
        let source = path.unwrap_or(&config.keystore_path).to_path_buf();

        let json = Zeroizing::new(read_keystore(&source)?);
        let accounts = load_accounts(&json, password.expose_secret())?;

        let first = accounts.first().ok_or_else(|| {
            WalletError::unsupported_account("Keystore holds no accounts; its mnemonic cannot be recovered")
        })?;
        let mnemonic = first
            .mnemonic()
            .cloned()
            .ok_or_else(|| WalletError::internal("Recovered account has no mnemonic"))?;

        if first.derivation() != config.derivation {
            log_warn!(
                "wallet",
                "keystore derivation overrides configured mode",
                stored = first.derivation(),
                configured = config.derivation
            );
            config.derivation = first.derivation();
        }

        log_info!(
            "wallet",
            "loaded wallet",
            path = source.display(),
            accounts = accounts.len()
        );

        Ok(Self {
            password,
            mnemonic,
            accounts,
            provider: None,
            config,
        })
    }

    /// Derive the next account, connect it and persist the whole wallet
    ///
    /// If the write fails the account is dropped again, so the in-memory
    /// list never holds an account the keystore does not.
    pub fn create_new_account(&mut self) -> WalletResult<&Account> {
        let index = self.accounts.len();
        let path = account_path(&self.config.base_path, index)?;
        let mut account = derive_account_with(self.mnemonic.clone(), &path, self.config.derivation)?;

        if let Some(provider) = &self.provider {
            account.connect(provider);
        }
        self.accounts.push(account);

        if let Err(e) = self.save(None) {
            self.accounts.pop();
            log_warn!("wallet", "new account not persisted", index = index);
            return Err(e);
        }

        log_info!("wallet", "created account", index = index, path = path);
        self.account_at(index)
    }

    /// Share `provider` with every account, current and future
    pub fn connect_provider(&mut self, provider: Arc<dyn BalanceProvider>) {
        for account in &mut self.accounts {
            account.connect(&provider);
        }
        log_info!("wallet", "connected provider", provider = provider.name());
        self.provider = Some(provider);
    }

    /// Query every account's balance concurrently, reported in account order
    pub fn get_balances(&self) -> WalletResult<Vec<Balance>> {
        if self.provider.is_none() {
            return Err(WalletError::new(
                ErrorCode::ProviderUnavailable,
                "No provider connected",
            ));
        }

        let results: Vec<WalletResult<u128>> = thread::scope(|scope| {
            let handles: Vec<_> = self
                .accounts
                .iter()
                .map(|account| scope.spawn(move || account.balance()))
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(WalletError::internal("Balance query panicked")))
                })
                .collect()
        });

        self.accounts
            .iter()
            .zip(results)
            .enumerate()
            .map(|(index, (account, result))| -> WalletResult<Balance> {
                let raw = result.map_err(|e| e.with_details(format!("account {}", index)))?;
                Ok(Balance {
                    index,
                    address: account.address().to_string(),
                    balance: format_ether(raw),
                    balance_raw: raw,
                })
            })
            .collect()
    }

    /// Encrypt all accounts and atomically replace the keystore file
    ///
    /// Writes to `path` if given, otherwise to the configured keystore path.
    pub fn save(&self, path: Option<&Path>) -> WalletResult<PathBuf> {
        let target = path.unwrap_or(&self.config.keystore_path).to_path_buf();
        let json = dump_accounts(&self.accounts, self.password.expose_secret(), &self.config.kdf)?;
        write_atomic(&target, &json)?;

        log_info!(
            "wallet",
            "saved keystore",
            path = target.display(),
            accounts = self.accounts.len()
        );
        Ok(target)
    }

    pub fn account_at(&self, index: usize) -> WalletResult<&Account> {
        self.accounts.get(index).ok_or_else(|| {
            WalletError::not_found(format!(
                "No account at index {} (wallet has {})",
                index,
                self.accounts.len()
            ))
        })
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn mnemonic(&self) -> &Arc<Mnemonic> {
        &self.mnemonic
    }

    pub fn mnemonic_phrase(&self) -> Zeroizing<String> {
        self.mnemonic.phrase()
    }

    pub fn provider(&self) -> Option<&Arc<dyn BalanceProvider>> {
        self.provider.as_ref()
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("accounts", &self.accounts)
            .field("connected", &self.provider.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::KdfParams;
    use crate::wallet::DerivationMode;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MapProvider {
        balances: Mutex<HashMap<String, u128>>,
    }

    impl BalanceProvider for MapProvider {
        fn get_balance(&self, address: &str) -> WalletResult<u128> {
            Ok(*self.balances.lock().unwrap().get(address).unwrap_or(&0))
        }
    }

    struct FailingProvider;

    impl BalanceProvider for FailingProvider {
        fn get_balance(&self, _address: &str) -> WalletResult<u128> {
            Err(WalletError::network("node unreachable"))
        }
    }

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hdvault-wallet-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("w.json")
    }

    fn light_config(path: &Path, mode: DerivationMode) -> WalletConfig {
        WalletConfig::default()
            .with_keystore_path(path)
            .with_kdf(KdfParams::light())
            .with_derivation(mode)
    }

    #[test]
    fn test_new_accounts_follow_base_path() {
        let path = scratch("index");
        let mut wallet =
            Wallet::create_with_config("pw1", None, light_config(&path, DerivationMode::Master)).unwrap();

        for _ in 0..3 {
            wallet.create_new_account().unwrap();
        }
        let paths: Vec<_> = wallet.accounts().iter().map(|a| a.path().unwrap().to_string()).collect();
        assert_eq!(
            paths,
            vec!["m/44'/60'/0'/0/0", "m/44'/60'/0'/0/1", "m/44'/60'/0'/0/2"]
        );
        assert!(path.exists());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = scratch("roundtrip");
        let mut wallet =
            Wallet::create_with_config("pw1", None, light_config(&path, DerivationMode::Bip32)).unwrap();
        for _ in 0..3 {
            wallet.create_new_account().unwrap();
        }
        wallet.save(Some(&path)).unwrap();

        let loaded =
            Wallet::load_with_config("pw1", Some(&path), light_config(&path, DerivationMode::Bip32)).unwrap();
        assert_eq!(loaded.accounts().len(), 3);
        for (a, b) in wallet.accounts().iter().zip(loaded.accounts()) {
            assert_eq!(a.address(), b.address());
            assert_eq!(a.private_key(), b.private_key());
        }
        assert_eq!(*loaded.mnemonic_phrase(), *wallet.mnemonic_phrase());
    }

    #[test]
    fn test_load_with_wrong_password() {
        let path = scratch("wrongpw");
        let mut wallet =
            Wallet::create_with_config("pw1", None, light_config(&path, DerivationMode::Master)).unwrap();
        wallet.create_new_account().unwrap();

        let err = Wallet::load("wrong-pw", Some(&path)).unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn test_load_missing_file() {
        let path = scratch("missing").with_file_name("absent.json");
        let err = Wallet::load("pw1", Some(&path)).unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_reloaded_wallet_keeps_its_mnemonic() {
        let path = scratch("keepmnemonic");
        let config = light_config(&path, DerivationMode::Bip32);
        let mut wallet = Wallet::create_with_config("pw1", None, config.clone()).unwrap();
        wallet.create_new_account().unwrap();

        let mut loaded = Wallet::load_with_config("pw1", Some(&path), config).unwrap();
        let next = loaded.create_new_account().unwrap().address().to_string();

        assert_eq!(*loaded.mnemonic_phrase(), *wallet.mnemonic_phrase());
        let expected =
            derive_account_with(wallet.mnemonic().clone(), "m/44'/60'/0'/0/1", DerivationMode::Bip32).unwrap();
        assert_eq!(next, expected.address());
    }

    #[test]
    fn test_load_empty_keystore_fails() {
        let path = scratch("empty");
        let wallet =
            Wallet::create_with_config("pw1", None, light_config(&path, DerivationMode::Master)).unwrap();
        wallet.save(None).unwrap();

        let err = Wallet::load("pw1", Some(&path)).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedAccount);
    }

    #[test]
    fn test_load_adopts_stored_derivation_mode() {
        let path = scratch("storedmode");
        let mut wallet =
            Wallet::create_with_config("pw1", None, light_config(&path, DerivationMode::Bip32)).unwrap();
        wallet.create_new_account().unwrap();

        let mut loaded =
            Wallet::load_with_config("pw1", Some(&path), light_config(&path, DerivationMode::Master)).unwrap();
        assert_eq!(loaded.config().derivation, DerivationMode::Bip32);

        let next = loaded.create_new_account().unwrap();
        let expected =
            derive_account_with(wallet.mnemonic().clone(), "m/44'/60'/0'/0/1", DerivationMode::Bip32).unwrap();
        assert_eq!(next.address(), expected.address());
        assert_eq!(next.derivation(), DerivationMode::Bip32);
        assert_eq!(next.index(), 1);
    }

    #[test]
    fn test_failed_save_rolls_back_account() {
        let dir = scratch("rollback");
        // Parent directory does not exist, so the write fails
        let path = dir.with_file_name("missing-dir").join("w.json");
        let mut wallet =
            Wallet::create_with_config("pw1", None, light_config(&path, DerivationMode::Master)).unwrap();

        assert!(wallet.create_new_account().is_err());
        assert!(wallet.accounts().is_empty());
    }

    #[test]
    fn test_balances_in_account_order() {
        let path = scratch("balances");
        let mut wallet =
            Wallet::create_with_config("pw1", None, light_config(&path, DerivationMode::Bip32)).unwrap();
        for _ in 0..3 {
            wallet.create_new_account().unwrap();
        }

        let mut balances = HashMap::new();
        for (i, account) in wallet.accounts().iter().enumerate() {
            balances.insert(account.address().to_string(), (i as u128 + 1) * 500_000_000_000_000_000);
        }
        let provider: Arc<dyn BalanceProvider> = Arc::new(MapProvider {
            balances: Mutex::new(balances),
        });
        wallet.connect_provider(provider);

        let report = wallet.get_balances().unwrap();
        assert_eq!(report.len(), 3);
        assert_eq!(report[0].balance, "0.5");
        assert_eq!(report[1].balance, "1.0");
        assert_eq!(report[2].balance, "1.5");
        for (i, entry) in report.iter().enumerate() {
            assert_eq!(entry.index, i);
            assert_eq!(entry.address, wallet.accounts()[i].address());
        }
    }

    #[test]
    fn test_new_account_inherits_provider() {
        let path = scratch("inherit");
        let provider: Arc<dyn BalanceProvider> = Arc::new(MapProvider {
            balances: Mutex::new(HashMap::new()),
        });
        let mut wallet = Wallet::create_with_config(
            "pw1",
            Some(provider),
            light_config(&path, DerivationMode::Master),
        )
        .unwrap();

        let account = wallet.create_new_account().unwrap();
        assert!(account.provider().is_some());
        assert_eq!(wallet.get_balances().unwrap()[0].balance_raw, 0);
    }

    #[test]
    fn test_balances_require_provider() {
        let path = scratch("noprovider");
        let wallet =
            Wallet::create_with_config("pw1", None, light_config(&path, DerivationMode::Master)).unwrap();
        assert!(wallet.get_balances().unwrap_err().is_network());
    }

    #[test]
    fn test_provider_errors_propagate() {
        let path = scratch("failing");
        let mut wallet =
            Wallet::create_with_config("pw1", None, light_config(&path, DerivationMode::Master)).unwrap();
        wallet.create_new_account().unwrap();
        wallet.connect_provider(Arc::new(FailingProvider));

        let err = wallet.get_balances().unwrap_err();
        assert!(err.is_network());
        assert_eq!(err.details.as_deref(), Some("account 0"));
    }

    #[test]
    fn test_account_at_out_of_range() {
        let path = scratch("range");
        let wallet =
            Wallet::create_with_config("pw1", None, light_config(&path, DerivationMode::Master)).unwrap();
        assert_eq!(wallet.account_at(0).unwrap_err().code, ErrorCode::NotFound);
    }
}
