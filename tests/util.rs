// tests/util.rs
// Shared helpers for integration tests
#![allow(dead_code)]

use kda_keystore::core::config::KeystoreConfig;
use kda_keystore::core::key_manager::KeyManager;
use kda_keystore::crypto::kdf::KdfAlgorithm;
use std::path::Path;

pub const MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// Cheap scrypt cost so tests stay fast.
pub fn fast_kdf() -> KdfAlgorithm {
    KdfAlgorithm::Scrypt { log_n: 4, r: 8, p: 1 }
}

pub fn test_config(dir: &Path) -> KeystoreConfig {
    KeystoreConfig {
        wallet_root: dir.join("wallets"),
        plain_key_root: dir.join("keys"),
        kdf: fast_kdf(),
        mnemonic_words: 12,
    }
}

pub fn test_manager(dir: &Path) -> KeyManager {
    KeyManager::new(test_config(dir))
}
