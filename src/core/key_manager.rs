//! Keystore operations.
//!
//! `KeyManager` ties derivation, encryption and storage together and is the
//! only entry point the binary uses. Secrets never reach a log line; at most
//! counts, names and paths are recorded.

use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::core::account::account_for_public_key;
use crate::core::config::KeystoreConfig;
use crate::core::derivation::{
    generate_hd_key_pairs, generate_mnemonic, generate_plain_key_pair, DerivationBatch,
    IndexFailure, RootSecret,
};
use crate::core::errors::WalletError;
use crate::core::key_pair::KeyPair;
use crate::core::range::IndexSelector;
use crate::security::encryption::{decrypt_secret, encrypt_secret};
use crate::security::secret::{SecretString, SecretVec};
use crate::storage::documents::DOCUMENT_VERSION;
use crate::storage::{
    checked_name, HdKeyDocument, KeyFile, PlainKeyDocument, SecretKind, StoredSecret,
    WalletDocument, WalletStore,
};

/// A wallet as seen from the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    pub name: String,
    pub is_legacy: bool,
    pub is_encrypted: bool,
}

/// A key written by a generation command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedKey {
    /// Derivation index; `None` for plain keys.
    pub index: Option<u32>,
    pub public_key: String,
    pub account: String,
    pub path: PathBuf,
}

/// A key file found on disk. `public_key` is `None` when the file could
/// not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    pub file: KeyFile,
    pub public_key: Option<String>,
}

/// Outcome of deriving keys into a wallet.
#[derive(Debug)]
pub struct HdKeysOutcome {
    pub wallet: Wallet,
    pub keys: Vec<GeneratedKey>,
    pub failures: Vec<IndexFailure>,
}

impl HdKeysOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of creating an HD wallet. `mnemonic` is set only when the phrase
/// was generated here and has to be shown to the user once.
#[derive(Debug)]
pub struct NewHdWallet {
    pub keys: HdKeysOutcome,
    pub mnemonic: Option<SecretString>,
}

pub struct KeyManager {
    config: KeystoreConfig,
    store: WalletStore,
}

impl KeyManager {
    pub fn new(config: KeystoreConfig) -> Self {
        let store = WalletStore::from_config(&config);
        Self { config, store }
    }

    pub fn config(&self) -> &KeystoreConfig {
        &self.config
    }

    pub fn store(&self) -> &WalletStore {
        &self.store
    }

    /// Fails with the fatal `WalletRootMissing` when no wallet was created yet.
    pub fn ensure_wallet_root(&self) -> Result<(), WalletError> {
        self.store.ensure_wallet_root_exists()
    }

    /// Generate `amount` standalone keypairs under `alias`.
    ///
    /// A single key is stored as `<alias>`, several as `<alias>-<i>` counting
    /// from zero. The secret key is encrypted when a password is given.
    pub fn generate_plain(
        &self,
        alias: &str,
        amount: usize,
        password: Option<&str>,
        legacy: bool,
    ) -> Result<Vec<GeneratedKey>, WalletError> {
        let alias = checked_name(alias)?;
        if amount == 0 {
            return Err(WalletError::InvalidNumberFormat);
        }

        let mut generated = Vec::new();
        for i in 0..amount {
            let base_name = if amount == 1 { alias.clone() } else { format!("{}-{}", alias, i) };
            let key_pair = generate_plain_key_pair();
            let secret_key = self.protect(key_pair.secret_key(), password)?;
            let document = PlainKeyDocument {
                version: DOCUMENT_VERSION,
                public_key: key_pair.public_key_hex(),
                secret_key,
            };
            let path = self.store.write_plain_key(&base_name, legacy, &document)?;
            generated.push(GeneratedKey {
                index: None,
                public_key: key_pair.public_key_hex(),
                account: key_pair.account(),
                path,
            });
        }

        info!(alias = %alias, amount, encrypted = password.is_some(), legacy, "plain keys generated");
        Ok(generated)
    }

    /// Create a new HD wallet from a fresh mnemonic and derive `selector`
    /// into it.
    pub fn generate_hd(
        &self,
        wallet: &str,
        password: Option<&str>,
        selector: IndexSelector,
        legacy: bool,
    ) -> Result<NewHdWallet, WalletError> {
        let phrase = generate_mnemonic(self.config.mnemonic_words)?;
        let root = RootSecret::Mnemonic(phrase.clone());
        let keys = self.create_hd_wallet(wallet, &root, password, selector, legacy)?;
        Ok(NewHdWallet { keys, mnemonic: Some(phrase) })
    }

    /// Create an HD wallet from an existing mnemonic phrase.
    pub fn import_hd(
        &self,
        wallet: &str,
        mnemonic: &str,
        password: Option<&str>,
        selector: IndexSelector,
        legacy: bool,
    ) -> Result<NewHdWallet, WalletError> {
        let root = RootSecret::mnemonic(mnemonic);
        // reject bad phrases before anything touches the disk
        root.to_seed()?;
        let keys = self.create_hd_wallet(wallet, &root, password, selector, legacy)?;
        Ok(NewHdWallet { keys, mnemonic: None })
    }

    fn create_hd_wallet(
        &self,
        wallet: &str,
        root: &RootSecret,
        password: Option<&str>,
        selector: IndexSelector,
        legacy: bool,
    ) -> Result<HdKeysOutcome, WalletError> {
        let name = checked_name(wallet)?;
        if self.store.wallet_exists(&name) {
            return Err(WalletError::AlreadyExists(self.store.wallet_dir(&name)));
        }

        let secret_kind = match root {
            RootSecret::Mnemonic(_) => SecretKind::Mnemonic,
            RootSecret::Seed(_) => SecretKind::Seed,
        };
        // encrypt before creating anything on disk
        let secret = self.protect(root.as_bytes(), password)?;
        let document =
            WalletDocument { version: DOCUMENT_VERSION, legacy, secret_kind, secret };

        self.store.create_wallet_dir(&name)?;
        self.store.write_wallet(&name, &document)?;

        let wallet = Wallet { name, is_legacy: legacy, is_encrypted: document.is_encrypted() };
        let batch = generate_hd_key_pairs(root, selector, legacy)?;
        let outcome = self.write_hd_keys(wallet, batch);
        info!(
            wallet = %outcome.wallet.name,
            keys = outcome.keys.len(),
            failures = outcome.failures.len(),
            legacy,
            "HD wallet created"
        );
        Ok(outcome)
    }

    /// Derive more keys into an existing wallet.
    pub fn generate_from_existing_hd(
        &self,
        wallet: &str,
        password: Option<&str>,
        selector: IndexSelector,
    ) -> Result<HdKeysOutcome, WalletError> {
        let (wallet, batch) = derive_from_existing_hd(&self.store, wallet, password, selector)?;
        let outcome = self.write_hd_keys(wallet, batch);
        info!(
            wallet = %outcome.wallet.name,
            keys = outcome.keys.len(),
            failures = outcome.failures.len(),
            "keys derived from existing wallet"
        );
        Ok(outcome)
    }

    /// HD key files of a wallet, current keys first.
    pub fn list_keys(&self, wallet: &str) -> Result<Vec<KeyEntry>, WalletError> {
        self.store.ensure_wallet_root_exists()?;
        let name = checked_name(wallet)?;
        if !self.store.wallet_exists(&name) {
            return Err(WalletError::WalletNotFound(name));
        }
        let entries = self
            .store
            .list_wallet_keys(&name)
            .into_iter()
            .map(|file| match self.store.read_hd_key(&name, &file) {
                Ok((file, document)) => KeyEntry { file, public_key: Some(document.public_key) },
                Err(error) => {
                    warn!(wallet = %name, file = %file.file_name(), %error, "unreadable key file");
                    KeyEntry { file, public_key: None }
                }
            })
            .collect();
        Ok(entries)
    }

    /// Plain key files, current first. A missing plain key root is empty.
    pub fn list_plain_keys(&self) -> Vec<KeyEntry> {
        self.store
            .list_plain_keys()
            .into_iter()
            .map(|file| {
                let public_key = match self.store.read_plain_key(&file) {
                    Ok(document) => Some(document.public_key.clone()),
                    Err(error) => {
                        warn!(file = %file.file_name(), %error, "unreadable plain key");
                        None
                    }
                };
                KeyEntry { file, public_key }
            })
            .collect()
    }

    /// Every wallet, legacy wallets first.
    pub fn list_wallets(&self) -> Result<Vec<Wallet>, WalletError> {
        let files = self.store.list_wallet_files()?;
        let wallets: Vec<Wallet> = files
            .into_iter()
            .map(|(dir, file)| {
                let is_encrypted = match self.store.read_wallet_file(&dir, &file) {
                    Ok(document) => document.is_encrypted(),
                    Err(error) => {
                        warn!(wallet = %dir, file = %file.file_name(), %error, "unreadable wallet file");
                        false
                    }
                };
                Wallet { name: file.base_name.clone(), is_legacy: file.is_legacy(), is_encrypted }
            })
            .collect();
        debug!(count = wallets.len(), "wallets listed");
        Ok(wallets)
    }

    /// Decrypt (if needed) and return a stored plain keypair.
    pub fn open_plain_key(
        &self,
        file: &KeyFile,
        password: Option<&str>,
    ) -> Result<KeyPair, WalletError> {
        let document = self.store.read_plain_key(file)?;
        let secret = reveal(&document.secret_key, password)?;
        let key_pair = KeyPair::from_secret_bytes(&secret)?;
        if key_pair.public_key_hex() != document.public_key.to_lowercase() {
            return Err(WalletError::DecryptionFailed);
        }
        Ok(key_pair)
    }

    pub fn rename_wallet(&self, from: &str, to: &str) -> Result<PathBuf, WalletError> {
        let from = checked_name(from)?;
        let to = checked_name(to)?;
        self.store.rename_wallet(&from, &to)
    }

    pub fn delete_wallet(&self, wallet: &str) -> Result<(), WalletError> {
        let name = checked_name(wallet)?;
        self.store.delete_wallet(&name)
    }

    fn protect(&self, secret: &[u8], password: Option<&str>) -> Result<StoredSecret, WalletError> {
        match password {
            Some(password) => {
                let blob = encrypt_secret(secret, password, self.config.kdf)?;
                Ok(StoredSecret::encrypted(&blob))
            }
            None => Ok(StoredSecret::plain(secret)),
        }
    }

    fn write_hd_keys(&self, wallet: Wallet, batch: DerivationBatch) -> HdKeysOutcome {
        let mut outcome = HdKeysOutcome { wallet, keys: Vec::new(), failures: batch.failures };
        for derived in batch.keys {
            let public_key = derived.key_pair.public_key_hex();
            let document = HdKeyDocument {
                version: DOCUMENT_VERSION,
                public_key: public_key.clone(),
                index: derived.index,
                legacy: outcome.wallet.is_legacy,
            };
            let base_name = format!("{}-{}", outcome.wallet.name, derived.index);
            match self.store.write_hd_key(&outcome.wallet.name, &base_name, &document) {
                Ok(path) => outcome.keys.push(GeneratedKey {
                    index: Some(derived.index),
                    account: account_for_public_key(&public_key),
                    public_key,
                    path,
                }),
                Err(error) => {
                    warn!(wallet = %outcome.wallet.name, index = derived.index, %error, "key not written");
                    outcome.failures.push(IndexFailure { index: derived.index as u64, error });
                }
            }
        }
        outcome
    }
}

/// Load the root secret of `wallet`, decrypting it when needed, and derive
/// `selector` with the wallet's own legacy flag. Nothing is written.
pub fn derive_from_existing_hd(
    store: &WalletStore,
    wallet: &str,
    password: Option<&str>,
    selector: IndexSelector,
) -> Result<(Wallet, DerivationBatch), WalletError> {
    store.ensure_wallet_root_exists()?;
    let name = checked_name(wallet)?;
    let (file, document) = store.read_wallet(&name)?;

    let secret = reveal(&document.secret, password)?;
    let root = match document.secret_kind {
        SecretKind::Mnemonic => {
            let phrase = std::str::from_utf8(&secret)
                .map_err(|_| WalletError::DerivationError("stored mnemonic is not UTF-8".into()))?;
            RootSecret::mnemonic(phrase)
        }
        SecretKind::Seed => RootSecret::seed(&secret),
    };

    // the wallet file's extension and its recorded flag must agree
    let legacy = document.legacy || file.is_legacy();
    let batch = generate_hd_key_pairs(&root, selector, legacy)?;
    let wallet = Wallet { name, is_legacy: legacy, is_encrypted: document.is_encrypted() };
    Ok((wallet, batch))
}

/// Plain bytes of a stored secret. An encrypted secret without a password
/// fails like a wrong password does.
fn reveal(secret: &StoredSecret, password: Option<&str>) -> Result<SecretVec, WalletError> {
    if let Some(plain) = secret.plain_bytes() {
        return plain;
    }
    match (secret.blob(), password) {
        (Some(blob), Some(password)) => decrypt_secret(&blob?, password),
        _ => Err(WalletError::DecryptionFailed),
    }
}
