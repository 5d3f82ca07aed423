use hdvault::keystore::{dump_accounts, load_accounts, KdfParams};
use hdvault::utils::{format_units, keccak256, to_checksum_address};
use hdvault::wallet::{derive_account_with, DerivationMode, Mnemonic};
use proptest::prelude::*;
use std::sync::Arc;

fn any_entropy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 16),
        prop::collection::vec(any::<u8>(), 32),
    ]
}

fn any_mode() -> impl Strategy<Value = DerivationMode> {
    prop_oneof![Just(DerivationMode::Master), Just(DerivationMode::Bip32)]
}

proptest! {
    #[test]
    fn checksum_addresses_roundtrip(bytes in prop::array::uniform20(any::<u8>())) {
        let checksummed = to_checksum_address(&bytes);
        prop_assert!(checksummed.starts_with("0x"));

        let lower_expected = hex::encode(bytes);
        let tail = checksummed.trim_start_matches("0x");
        prop_assert_eq!(tail.to_ascii_lowercase(), lower_expected.clone());

        let hash = keccak256(lower_expected.as_bytes());
        for (i, ch) in tail.chars().enumerate() {
            let byte = hash[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if ch.is_ascii_alphabetic() {
                prop_assert_eq!(ch.is_ascii_uppercase(), nibble >= 8);
            }
        }
    }

    #[test]
    fn format_units_is_exact(value in any::<u128>(), decimals in 0u32..=30) {
        let rendered = format_units(value, decimals);
        let (whole, fraction) = rendered.split_once('.').expect("always has a point");
        prop_assert!(!fraction.is_empty());

        let mut digits = whole.to_string();
        let mut padded = fraction.to_string();
        if decimals == 0 {
            prop_assert_eq!(fraction, "0");
            padded.clear();
        }
        while padded.len() < decimals as usize {
            padded.push('0');
        }
        digits.push_str(&padded);
        prop_assert_eq!(digits.parse::<u128>().unwrap(), value);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn derivation_is_deterministic(entropy in any_entropy(), index in 0u32..1000, mode in any_mode()) {
        let path = format!("m/44'/60'/0'/0/{}", index);
        let a = derive_account_with(Arc::new(Mnemonic::from_entropy(&entropy).unwrap()), &path, mode).unwrap();
        let b = derive_account_with(Arc::new(Mnemonic::from_entropy(&entropy).unwrap()), &path, mode).unwrap();

        prop_assert_eq!(a.address(), b.address());
        prop_assert_eq!(a.public_key(), b.public_key());
        prop_assert_eq!(a.private_key(), b.private_key());
    }

    #[test]
    fn passphrase_mnemonics_are_never_serialized(entropy in any_entropy(), passphrase in "[a-z]{1,12}") {
        let mnemonic = Mnemonic::from_entropy_in(bip39::Language::English, &entropy, &passphrase).unwrap();
        let account = derive_account_with(Arc::new(mnemonic), "m/44'/60'/0'/0/0", DerivationMode::Master).unwrap();
        prop_assert!(account.to_keystore_record().mnemonic.is_none());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(4))]

    #[test]
    fn keystore_roundtrip_preserves_accounts(entropy in any_entropy(), count in 1usize..4, password in "[ -~]{1,24}") {
        let mnemonic = Arc::new(Mnemonic::from_entropy(&entropy).unwrap());
        let accounts: Vec<_> = (0..count)
            .map(|i| derive_account_with(mnemonic.clone(), &format!("m/44'/60'/0'/0/{}", i), DerivationMode::Bip32).unwrap())
            .collect();

        let json = dump_accounts(&accounts, &password, &KdfParams::light()).unwrap();
        let loaded = load_accounts(&json, &password).unwrap();

        prop_assert_eq!(loaded.len(), accounts.len());
        for (a, b) in accounts.iter().zip(&loaded) {
            prop_assert_eq!(a.address(), b.address());
            prop_assert_eq!(a.private_key(), b.private_key());
        }
    }

    #[test]
    fn wrong_password_is_always_rejected(entropy in any_entropy(), password in "[a-z]{4,16}", other in "[A-Z]{4,16}") {
        let mnemonic = Arc::new(Mnemonic::from_entropy(&entropy).unwrap());
        let account = derive_account_with(mnemonic, "m/44'/60'/0'/0/0", DerivationMode::Master).unwrap();

        let json = dump_accounts(&[account], &password, &KdfParams::light()).unwrap();
        let err = load_accounts(&json, &other).unwrap_err();
        prop_assert!(err.is_authentication());
    }
}
