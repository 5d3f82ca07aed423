//! hdvault
//!
//! Hierarchical-deterministic Ethereum wallet core with an encrypted
//! multi-account keystore.
//!
//! # Architecture
//!
//! This crate provides:
//! - **wallet**: mnemonics, key derivation, accounts and the `Wallet` aggregate
//! - **keystore**: per-account authenticated encryption and the keystore file
//! - **api**: balance providers (`BalanceProvider`, JSON-RPC)
//! - **utils**: hashing, unit formatting, configuration and logging
//!
//! # Security
//!
//! Private keys, seeds, entropy and the wallet password are zeroized when
//! dropped and redacted from `Debug` output and logs.
//!
//! # Example
//!
//! ```rust,ignore
//! use hdvault::Wallet;
//!
//! let mut wallet = Wallet::create("pw1", None)?;
//! let account = wallet.create_new_account()?;
//! println!("{}", account.address());
//!
//! let wallet = Wallet::load("pw1", None)?;
//! ```

pub mod api;
pub mod error;
pub mod keystore;
pub mod utils;
pub mod wallet;

pub use api::{BalanceProvider, JsonRpcProvider};
pub use error::{ErrorCode, WalletError, WalletResult};
pub use keystore::KdfParams;
pub use utils::wallet_config::WalletConfig;
pub use wallet::{Account, Balance, DerivationMode, Mnemonic, Wallet};
