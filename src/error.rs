//! Unified error types for hdvault
//!
//! All errors flow through this module. The core never prints; callers
//! decide how a `WalletError` is displayed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all wallet operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl WalletError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Tag the error with the keystore record it came from
    pub fn at_record(self, index: usize) -> Self {
        self.with_details(format!("record {}", index))
    }

    // Convenience constructors
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Configuration, msg)
    }

    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidPath, msg)
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Authentication, msg)
    }

    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Integrity, msg)
    }

    pub fn unsupported_account(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnsupportedAccount, msg)
    }

    pub fn unsupported_cipher(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnsupportedCipher, msg)
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, msg)
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProviderUnavailable, msg)
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    /// Fatal setup problems: bad entropy, bad paths, bad parameters
    pub fn is_configuration(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::Configuration
                | ErrorCode::InvalidMnemonic
                | ErrorCode::InvalidPath
                | ErrorCode::InvalidPrivateKey
                | ErrorCode::UnsupportedCipher
        )
    }

    /// Wrong password; retryable with a different one
    pub fn is_authentication(&self) -> bool {
        self.code == ErrorCode::Authentication
    }

    /// Decrypted data does not reproduce the stored account
    pub fn is_integrity(&self) -> bool {
        matches!(self.code, ErrorCode::Integrity | ErrorCode::UnsupportedAccount)
    }

    pub fn is_io(&self) -> bool {
        matches!(self.code, ErrorCode::Io | ErrorCode::NotFound)
    }

    pub fn is_network(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::NetworkError | ErrorCode::Timeout | ErrorCode::ProviderUnavailable
        )
    }
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for WalletError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Configuration errors
    Configuration,
    InvalidMnemonic,
    InvalidPath,
    InvalidPrivateKey,
    UnsupportedCipher,

    // Keystore errors
    Authentication,
    Integrity,
    UnsupportedAccount,

    // I/O
    Io,
    NotFound,

    // Network errors
    NetworkError,
    Timeout,
    ProviderUnavailable,

    // Parse errors
    ParseError,
    JsonError,
    HexError,

    // Internal
    Internal,
}

/// Result type alias for wallet operations
pub type WalletResult<T> = Result<T, WalletError>;

// Conversions from common error types

impl From<serde_json::Error> for WalletError {
    fn from(e: serde_json::Error) -> Self {
        WalletError::new(ErrorCode::JsonError, e.to_string())
    }
}

impl From<hex::FromHexError> for WalletError {
    fn from(e: hex::FromHexError) -> Self {
        WalletError::new(ErrorCode::HexError, e.to_string())
    }
}

impl From<std::io::Error> for WalletError {
    fn from(e: std::io::Error) -> Self {
        let code = if e.kind() == std::io::ErrorKind::NotFound {
            ErrorCode::NotFound
        } else {
            ErrorCode::Io
        };
        WalletError::new(code, e.to_string())
    }
}

impl From<reqwest::Error> for WalletError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            WalletError::new(ErrorCode::Timeout, "Request timed out")
        } else if e.is_connect() {
            WalletError::new(ErrorCode::NetworkError, "Connection failed")
        } else {
            WalletError::new(ErrorCode::NetworkError, e.to_string())
        }
    }
}

impl From<bitcoin::bip32::Error> for WalletError {
    fn from(e: bitcoin::bip32::Error) -> Self {
        WalletError::new(ErrorCode::InvalidPath, format!("BIP32 error: {}", e))
    }
}

impl From<secp256k1::Error> for WalletError {
    fn from(e: secp256k1::Error) -> Self {
        WalletError::new(ErrorCode::InvalidPrivateKey, format!("Secp256k1 error: {}", e))
    }
}

impl From<bip39::Error> for WalletError {
    fn from(e: bip39::Error) -> Self {
        WalletError::new(ErrorCode::InvalidMnemonic, format!("BIP39 error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = WalletError::authentication("MAC mismatch").at_record(2);

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("authentication"));
        assert!(json.contains("record 2"));
    }

    #[test]
    fn test_display_includes_details() {
        let err = WalletError::integrity("address mismatch").at_record(0);
        assert_eq!(err.to_string(), "[Integrity] address mismatch (record 0)");
    }

    #[test]
    fn test_taxonomy() {
        assert!(WalletError::unsupported_account("no mnemonic").is_integrity());
        assert!(WalletError::invalid_path("m/x").is_configuration());
        assert!(!WalletError::authentication("bad").is_integrity());

        let missing: WalletError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(missing.is_io());
        assert_eq!(missing.code, ErrorCode::NotFound);
    }
}
