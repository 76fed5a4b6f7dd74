use kda_keystore::crypto::kdf::KdfAlgorithm;
use kda_keystore::security::encryption::{decrypt_secret, encrypt_secret};
use kda_keystore::utils::{from_hex, to_hex};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_hex_round_trip(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let hex = to_hex(&bytes);
        prop_assert_eq!(hex.len(), bytes.len() * 2);
        prop_assert_eq!(from_hex(&hex).unwrap(), bytes);
    }

    #[test]
    fn test_hex_odd_length_rejected(s in "[0-9a-f]([0-9a-f]{2}){0,31}") {
        prop_assert!(from_hex(&s).is_err());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn test_encryption_round_trip(
        secret in prop::collection::vec(any::<u8>(), 0..128),
        password in "[ -~]{0,32}",
    ) {
        let kdf = KdfAlgorithm::Scrypt { log_n: 4, r: 8, p: 1 };
        let blob = encrypt_secret(&secret, &password, kdf).unwrap();
        let plain = decrypt_secret(&blob, &password).unwrap();
        prop_assert_eq!(plain.as_slice(), secret.as_slice());

        let wrong = format!("{}!", password);
        prop_assert!(decrypt_secret(&blob, &wrong).is_err());
    }
}
