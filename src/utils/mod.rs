//! Utilities Module
//!
//! Common utilities used across the crate.

pub mod crypto;
pub mod logging;
pub mod units;
pub mod wallet_config;

pub use crypto::*;
pub use units::*;
pub use wallet_config::WalletConfig;
