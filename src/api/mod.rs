//! Blockchain API
//!
//! Network access is limited to balance queries through `BalanceProvider`.

pub mod providers;

pub use providers::{BalanceProvider, JsonRpcProvider, RpcError};
