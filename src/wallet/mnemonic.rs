//! Mnemonic / Seed Provider
//!
//! Wraps a BIP-39 mnemonic together with its optional passphrase.
//!
//! SECURITY: entropy, phrase and seed leave this type only inside
//! `Zeroizing` wrappers.

use bip39::Language;
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use zeroize::Zeroizing;

use crate::error::{WalletError, WalletResult};

/// Entropy size for newly generated wallets (128 bits = 12 words)
pub const DEFAULT_ENTROPY_BYTES: usize = 16;

/// Locale tag of the only wordlist keystores can recover from
pub const ENGLISH_LOCALE: &str = "en";

#[derive(Clone)]
pub struct Mnemonic {
    inner: bip39::Mnemonic,
    passphrase: Zeroizing<String>,
}

impl Mnemonic {
    /// Fresh random English mnemonic with an empty passphrase
    pub fn generate() -> WalletResult<Self> {
        let mut entropy = Zeroizing::new([0u8; DEFAULT_ENTROPY_BYTES]);
        OsRng.fill_bytes(entropy.as_mut());
        Self::from_entropy(entropy.as_ref())
    }

    /// English mnemonic from raw entropy, empty passphrase
    pub fn from_entropy(entropy: &[u8]) -> WalletResult<Self> {
        Self::from_entropy_in(Language::English, entropy, "")
    }

    pub fn from_entropy_in(language: Language, entropy: &[u8], passphrase: &str) -> WalletResult<Self> {
        let inner = bip39::Mnemonic::from_entropy_in(language, entropy).map_err(|e| {
            WalletError::new(
                crate::error::ErrorCode::InvalidMnemonic,
                format!("Invalid entropy ({} bytes): {}", entropy.len(), e),
            )
        })?;
        Ok(Self {
            inner,
            passphrase: Zeroizing::new(passphrase.to_string()),
        })
    }

    /// Parse an existing phrase; the wordlist is detected from the words
    pub fn from_phrase(phrase: &str, passphrase: &str) -> WalletResult<Self> {
        let inner = bip39::Mnemonic::parse(phrase)?;
        Ok(Self {
            inner,
            passphrase: Zeroizing::new(passphrase.to_string()),
        })
    }

    pub fn phrase(&self) -> Zeroizing<String> {
        Zeroizing::new(self.inner.to_string())
    }

    pub fn entropy(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.inner.to_entropy())
    }

    /// `0x`-prefixed hex entropy, the form stored in keystore records
    pub fn entropy_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("0x{}", hex::encode(self.entropy().as_slice())))
    }

    pub fn language(&self) -> Language {
        self.inner.language()
    }

    pub fn locale(&self) -> &'static str {
        locale_of(self.inner.language())
    }

    pub fn has_passphrase(&self) -> bool {
        !self.passphrase.is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.inner.word_count()
    }

    /// BIP-39 seed: PBKDF2-HMAC-SHA512 over the phrase and passphrase
    pub fn compute_seed(&self) -> Zeroizing<[u8; 64]> {
        Zeroizing::new(self.inner.to_seed(self.passphrase.as_str()))
    }
}

impl fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mnemonic")
            .field("locale", &self.locale())
            .field("words", &self.word_count())
            .field("phrase", &"[REDACTED]")
            .field("has_passphrase", &self.has_passphrase())
            .finish()
    }
}

/// Locale tag for a wordlist
pub fn locale_of(language: Language) -> &'static str {
    match language {
        Language::English => ENGLISH_LOCALE,
        Language::French => "fr",
        Language::Spanish => "es",
        Language::Japanese => "ja",
        #[allow(unreachable_patterns)]
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO_PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_generate() {
        let mnemonic = Mnemonic::generate().unwrap();
        assert_eq!(mnemonic.word_count(), 12);
        assert_eq!(mnemonic.locale(), "en");
        assert!(!mnemonic.has_passphrase());
        assert_eq!(mnemonic.entropy().len(), DEFAULT_ENTROPY_BYTES);
    }

    #[test]
    fn test_entropy_phrase_bijection() {
        let mnemonic = Mnemonic::from_entropy(&[0u8; 16]).unwrap();
        assert_eq!(mnemonic.phrase().as_str(), ZERO_PHRASE);

        let parsed = Mnemonic::from_phrase(ZERO_PHRASE, "").unwrap();
        assert_eq!(parsed.entropy().as_slice(), &[0u8; 16]);
        assert_eq!(parsed.entropy_hex().as_str(), "0x00000000000000000000000000000000");
    }

    #[test]
    fn test_bip39_seed_vector() {
        // BIP-39 reference vector, passphrase "TREZOR"
        let mnemonic = Mnemonic::from_entropy_in(Language::English, &[0u8; 16], "TREZOR").unwrap();
        assert_eq!(
            hex::encode::<&[u8]>(mnemonic.compute_seed().as_ref()),
            "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e53495531f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04"
        );
    }

    #[test]
    fn test_invalid_entropy_length() {
        let err = Mnemonic::from_entropy(&[0u8; 15]).unwrap_err();
        assert!(err.is_configuration());
        assert!(Mnemonic::from_entropy(&[0u8; 8]).is_err());
    }

    #[test]
    fn test_locales() {
        let french = Mnemonic::from_entropy_in(Language::French, &[7u8; 16], "").unwrap();
        assert_eq!(french.locale(), "fr");
        assert_eq!(locale_of(Language::Spanish), "es");
    }

    #[test]
    fn test_debug_hides_phrase() {
        let mnemonic = Mnemonic::from_entropy(&[0u8; 16]).unwrap();
        let debug = format!("{:?}", mnemonic);
        assert!(!debug.contains("abandon"));
    }
}
