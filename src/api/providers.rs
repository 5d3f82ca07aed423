//! Blockchain Balance Providers
//!
//! The core only ever asks a provider for one thing: the native balance of
//! an address in the smallest denomination.

use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::error::{WalletError, WalletResult};
use crate::utils::units::parse_quantity;
use crate::utils::wallet_config::{validate_rpc_url, WalletConfig};

/// Source of account balances
pub trait BalanceProvider: Send + Sync {
    /// Balance of `address` in wei
    fn get_balance(&self, address: &str) -> WalletResult<u128>;

    fn name(&self) -> &str {
        "provider"
    }
}

/// JSON-RPC failures
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid quantity in response: {0}")]
    InvalidQuantity(String),

    #[error("Response carried neither result nor error")]
    EmptyResponse,
}

impl From<RpcError> for WalletError {
    fn from(e: RpcError) -> Self {
        match e {
            RpcError::Transport(inner) => WalletError::from(inner),
            other => WalletError::network(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<serde_json::Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Ethereum JSON-RPC endpoint (`eth_getBalance`)
pub struct JsonRpcProvider {
    url: Url,
    client: reqwest::blocking::Client,
    next_id: AtomicU64,
}

impl JsonRpcProvider {
    pub fn new(url: &str, timeout: Duration) -> WalletResult<Self> {
        let url = validate_rpc_url(url)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("hdvault/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WalletError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    /// Provider for `config.rpc_url`
    pub fn from_config(config: &WalletConfig) -> WalletResult<Self> {
        let url = config
            .rpc_url
            .as_deref()
            .ok_or_else(|| WalletError::configuration("No RPC URL configured"))?;
        Self::new(url, config.rpc_timeout())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    fn call(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, RpcError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
        });

        let response: RpcResponse = self
            .client
            .post(self.url.clone())
            .json(&payload)
            .send()?
            .error_for_status()?
            .json()?;

        unwrap_response(response)
    }
}

fn unwrap_response(response: RpcResponse) -> Result<serde_json::Value, RpcError> {
    if let Some(error) = response.error {
        return Err(RpcError::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    response.result.ok_or(RpcError::EmptyResponse)
}

fn quantity_from_value(value: &serde_json::Value) -> Result<u128, RpcError> {
    let raw = value
        .as_str()
        .ok_or_else(|| RpcError::InvalidQuantity(value.to_string()))?;
    parse_quantity(raw).ok_or_else(|| RpcError::InvalidQuantity(raw.to_string()))
}

impl BalanceProvider for JsonRpcProvider {
    fn get_balance(&self, address: &str) -> WalletResult<u128> {
        let result = self.call("eth_getBalance", serde_json::json!([address, "latest"]))?;
        Ok(quantity_from_value(&result)?)
    }

    fn name(&self) -> &str {
        "json-rpc"
    }
}
