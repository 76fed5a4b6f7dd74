mod util;

use kda_keystore::core::errors::WalletError;
use kda_keystore::storage::{KeyExtension, WalletStore};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"placeholder").unwrap();
}

fn store(tmp: &TempDir) -> WalletStore {
    WalletStore::from_config(&util::test_config(tmp.path()))
}

#[test]
fn test_legacy_wallets_listed_before_current() {
    let tmp = TempDir::new().unwrap();
    let s = store(&tmp);
    touch(&s.wallet_dir("a").join("a.wallet"));
    touch(&s.wallet_dir("b").join("b.legacy-wallet"));

    assert_eq!(
        s.list_all_wallet_names().unwrap(),
        vec!["b.legacy-wallet".to_string(), "a.wallet".to_string()]
    );
}

#[test]
fn test_current_listing_never_returns_legacy_files() {
    let tmp = TempDir::new().unwrap();
    let s = store(&tmp);
    let dir = s.wallet_dir("mixed");
    touch(&dir.join("x.legacy-wallet"));
    touch(&dir.join("y.wallet"));

    assert_eq!(s.list_files_by_extension(&dir, KeyExtension::CurrentWallet), vec!["y"]);
    assert_eq!(s.list_files_by_extension(&dir, KeyExtension::LegacyWallet), vec!["x"]);
}

#[test]
fn test_missing_root_is_fatal_for_wallet_listing() {
    let tmp = TempDir::new().unwrap();
    let err = store(&tmp).list_all_wallet_names().unwrap_err();
    assert!(matches!(err, WalletError::WalletRootMissing(_)));
    assert!(err.is_fatal());
}

#[test]
fn test_empty_root_lists_nothing() {
    let tmp = TempDir::new().unwrap();
    let s = store(&tmp);
    fs::create_dir_all(s.wallet_root()).unwrap();
    assert!(s.list_all_wallet_names().unwrap().is_empty());
    assert!(s.list_plain_keys().is_empty());
}

#[test]
fn test_wallet_keys_current_then_legacy() {
    let tmp = TempDir::new().unwrap();
    let s = store(&tmp);
    let dir = s.wallet_dir("w");
    touch(&dir.join("w-0.legacy-key"));
    touch(&dir.join("w-0.key"));
    touch(&dir.join("w.wallet"));

    let keys = s.list_wallet_keys("w");
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0].extension, KeyExtension::CurrentKey);
    assert_eq!(keys[1].extension, KeyExtension::LegacyKey);
    // same base name, independent keys
    assert_eq!(keys[0].base_name, keys[1].base_name);
}

#[test]
fn test_plain_keys_classified_by_extension_only() {
    let tmp = TempDir::new().unwrap();
    let s = store(&tmp);
    touch(&s.plain_key_root().join("p.plain-key"));
    touch(&s.plain_key_root().join("q.legacy-plain-key"));
    touch(&s.plain_key_root().join("r.txt"));

    let names: Vec<String> = s.list_plain_keys().iter().map(|f| f.file_name()).collect();
    assert_eq!(names, vec!["p.plain-key".to_string(), "q.legacy-plain-key".to_string()]);
}
