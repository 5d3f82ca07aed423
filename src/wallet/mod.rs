//! Wallet Module
//!
//! Mnemonic handling, key derivation, accounts and the wallet aggregate.

mod account;
mod derivation;
mod derivation_path;
mod hd_wallet;
mod mnemonic;
pub mod signer;

pub use account::*;
pub use derivation::*;
pub use derivation_path::*;
pub use hd_wallet::*;
pub use mnemonic::*;
pub use signer::Signature;
