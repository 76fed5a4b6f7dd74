//! On-disk wallet layout.
//!
//! ```text
//! <wallet-root>/<wallet-name>/<base>.wallet | .legacy-wallet | .key | .legacy-key
//! <plain-key-root>/<base>.plain-key | .legacy-plain-key
//! ```
//!
//! Every document is written atomically: a temporary file in the target
//! directory is synced and then renamed into place, so a crash never leaves a
//! half-written file carrying a recognized extension.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::core::config::KeystoreConfig;
use crate::core::errors::WalletError;
use crate::utils::sanitize_filename;

pub mod documents;
pub mod layout;

pub use documents::{HdKeyDocument, PlainKeyDocument, SecretKind, StoredSecret, WalletDocument};
pub use layout::{KeyExtension, KeyFile, KeyMethod};

/// Filesystem backed store for wallets and plain keys.
#[derive(Debug, Clone)]
pub struct WalletStore {
    wallet_root: PathBuf,
    plain_key_root: PathBuf,
}

impl WalletStore {
    pub fn new(wallet_root: impl Into<PathBuf>, plain_key_root: impl Into<PathBuf>) -> Self {
        Self { wallet_root: wallet_root.into(), plain_key_root: plain_key_root.into() }
    }

    pub fn from_config(config: &KeystoreConfig) -> Self {
        Self::new(&config.wallet_root, &config.plain_key_root)
    }

    pub fn wallet_root(&self) -> &Path {
        &self.wallet_root
    }

    pub fn plain_key_root(&self) -> &Path {
        &self.plain_key_root
    }

    /// Directory of a wallet. The name must already be sanitized.
    pub fn wallet_dir(&self, name: &str) -> PathBuf {
        self.wallet_root.join(name)
    }

    /// Fails with the fatal `WalletRootMissing` when the wallet root is absent.
    pub fn ensure_wallet_root_exists(&self) -> Result<(), WalletError> {
        if !self.wallet_root.is_dir() {
            return Err(WalletError::WalletRootMissing(self.wallet_root.clone()));
        }
        Ok(())
    }

    /// Base names of files in `dir` carrying exactly `extension`.
    ///
    /// A missing or unreadable directory yields an empty list. Order follows
    /// directory traversal.
    pub fn list_files_by_extension(&self, dir: &Path, extension: KeyExtension) -> Vec<String> {
        self.classified_files(dir)
            .into_iter()
            .filter(|file| file.extension == extension)
            .map(|file| file.base_name)
            .collect()
    }

    fn classified_files(&self, dir: &Path) -> Vec<KeyFile> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };
        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().to_str().and_then(KeyFile::from_file_name))
            .collect()
    }

    /// Names of the wallet directories under the root, in traversal order.
    pub fn wallet_dirs(&self) -> Result<Vec<String>, WalletError> {
        self.ensure_wallet_root_exists()?;
        let entries =
            fs::read_dir(&self.wallet_root).map_err(|e| WalletError::io(&self.wallet_root, e))?;
        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| WalletError::io(&self.wallet_root, e))?;
            if entry.path().is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    dirs.push(name.to_string());
                }
            }
        }
        Ok(dirs)
    }

    /// Wallet files across every wallet directory, paired with the directory
    /// they live in: all legacy wallets first, then all current wallets.
    pub fn list_wallet_files(&self) -> Result<Vec<(String, KeyFile)>, WalletError> {
        let dirs = self.wallet_dirs()?;
        let legacy_suffix = KeyExtension::LegacyWallet.suffix();

        let collect = |ext: KeyExtension| {
            dirs.iter()
                .flat_map(move |dir| {
                    self.list_files_by_extension(&self.wallet_dir(dir), ext)
                        .into_iter()
                        .map(move |base| (dir.clone(), KeyFile::new(base, ext)))
                })
                .collect::<Vec<_>>()
        };
        let mut files = collect(KeyExtension::LegacyWallet);
        files.extend(
            collect(KeyExtension::CurrentWallet)
                .into_iter()
                .filter(|(_, file)| !file.file_name().ends_with(legacy_suffix)),
        );
        Ok(files)
    }

    /// Wallet file names (with extension), legacy entries first.
    pub fn list_all_wallet_names(&self) -> Result<Vec<String>, WalletError> {
        Ok(self.list_wallet_files()?.into_iter().map(|(_, file)| file.file_name()).collect())
    }

    /// HD key files of a wallet: current keys first, then legacy keys.
    pub fn list_wallet_keys(&self, wallet: &str) -> Vec<KeyFile> {
        let dir = self.wallet_dir(wallet);
        [KeyExtension::CurrentKey, KeyExtension::LegacyKey]
            .into_iter()
            .flat_map(|ext| {
                self.list_files_by_extension(&dir, ext)
                    .into_iter()
                    .map(move |base| KeyFile::new(base, ext))
            })
            .collect()
    }

    /// Plain key files: current first, then legacy.
    pub fn list_plain_keys(&self) -> Vec<KeyFile> {
        [KeyExtension::CurrentPlain, KeyExtension::LegacyPlain]
            .into_iter()
            .flat_map(|ext| {
                self.list_files_by_extension(&self.plain_key_root, ext)
                    .into_iter()
                    .map(move |base| KeyFile::new(base, ext))
            })
            .collect()
    }

    /// The wallet root file of a wallet directory. Legacy files win when both
    /// are present, mirroring the listing order.
    pub fn find_wallet_file(&self, wallet: &str) -> Result<KeyFile, WalletError> {
        let dir = self.wallet_dir(wallet);
        if !dir.is_dir() {
            return Err(WalletError::WalletNotFound(wallet.to_string()));
        }
        [KeyExtension::LegacyWallet, KeyExtension::CurrentWallet]
            .into_iter()
            .find_map(|ext| {
                self.list_files_by_extension(&dir, ext)
                    .into_iter()
                    .next()
                    .map(|base| KeyFile::new(base, ext))
            })
            .ok_or_else(|| WalletError::WalletNotFound(wallet.to_string()))
    }

    pub fn wallet_exists(&self, wallet: &str) -> bool {
        self.wallet_dir(wallet).is_dir()
    }

    /// Create the directory of a new wallet (and the root if needed).
    pub fn create_wallet_dir(&self, wallet: &str) -> Result<PathBuf, WalletError> {
        let dir = self.wallet_dir(wallet);
        create_private_dir(&dir)?;
        Ok(dir)
    }

    pub fn write_wallet(
        &self,
        wallet: &str,
        document: &WalletDocument,
    ) -> Result<PathBuf, WalletError> {
        let file = KeyFile::new(wallet, KeyExtension::wallet(document.legacy));
        let path = self.wallet_dir(wallet).join(file.file_name());
        write_document(&path, document, false)?;
        info!(wallet, path = %path.display(), "wallet file written");
        Ok(path)
    }

    pub fn read_wallet(&self, wallet: &str) -> Result<(KeyFile, WalletDocument), WalletError> {
        let file = self.find_wallet_file(wallet)?;
        let document = self.read_wallet_file(wallet, &file)?;
        Ok((file, document))
    }

    /// Read one specific wallet file inside the `wallet` directory.
    pub fn read_wallet_file(&self, wallet: &str, file: &KeyFile) -> Result<WalletDocument, WalletError> {
        read_document(&self.wallet_dir(wallet).join(file.file_name()))
    }

    pub fn write_hd_key(
        &self,
        wallet: &str,
        base_name: &str,
        document: &HdKeyDocument,
    ) -> Result<PathBuf, WalletError> {
        let file = KeyFile::new(base_name, KeyExtension::hd_key(document.legacy));
        let path = self.wallet_dir(wallet).join(file.file_name());
        write_document(&path, document, false)?;
        debug!(wallet, index = document.index, "key file written");
        Ok(path)
    }

    /// Read an HD key file; fills in the file's derivation index.
    pub fn read_hd_key(
        &self,
        wallet: &str,
        file: &KeyFile,
    ) -> Result<(KeyFile, HdKeyDocument), WalletError> {
        let document: HdKeyDocument = read_document(&self.wallet_dir(wallet).join(file.file_name()))?;
        let mut file = file.clone();
        file.derivation_index = Some(document.index);
        Ok((file, document))
    }

    pub fn write_plain_key(
        &self,
        base_name: &str,
        legacy: bool,
        document: &PlainKeyDocument,
    ) -> Result<PathBuf, WalletError> {
        create_private_dir(&self.plain_key_root)?;
        let file = KeyFile::new(base_name, KeyExtension::plain_key(legacy));
        let path = self.plain_key_root.join(file.file_name());
        write_document(&path, document, false)?;
        debug!(path = %path.display(), "plain key written");
        Ok(path)
    }

    pub fn read_plain_key(&self, file: &KeyFile) -> Result<PlainKeyDocument, WalletError> {
        read_document(&self.plain_key_root.join(file.file_name()))
    }

    /// Rename a wallet directory and the wallet files named after it.
    pub fn rename_wallet(&self, from: &str, to: &str) -> Result<PathBuf, WalletError> {
        self.ensure_wallet_root_exists()?;
        let old_dir = self.wallet_dir(from);
        let new_dir = self.wallet_dir(to);
        if !old_dir.is_dir() {
            return Err(WalletError::WalletNotFound(from.to_string()));
        }
        if new_dir.exists() {
            return Err(WalletError::AlreadyExists(new_dir));
        }
        fs::rename(&old_dir, &new_dir).map_err(|e| WalletError::io(&old_dir, e))?;

        for ext in [KeyExtension::LegacyWallet, KeyExtension::CurrentWallet] {
            let old_file = new_dir.join(ext.file_name(from));
            if old_file.is_file() {
                let new_file = new_dir.join(ext.file_name(to));
                fs::rename(&old_file, &new_file).map_err(|e| WalletError::io(&old_file, e))?;
            }
        }
        info!(from, to, "wallet renamed");
        Ok(new_dir)
    }

    /// Remove a wallet directory and everything inside it.
    pub fn delete_wallet(&self, wallet: &str) -> Result<(), WalletError> {
        self.ensure_wallet_root_exists()?;
        let dir = self.wallet_dir(wallet);
        if !dir.is_dir() {
            return Err(WalletError::WalletNotFound(wallet.to_string()));
        }
        fs::remove_dir_all(&dir).map_err(|e| WalletError::io(&dir, e))?;
        warn!(wallet, "wallet deleted");
        Ok(())
    }
}

/// Sanitize a wallet or key name for use on disk.
pub fn checked_name(name: &str) -> Result<String, WalletError> {
    let sanitized = sanitize_filename(name);
    if sanitized.is_empty() {
        return Err(WalletError::InvalidWalletName(name.to_string()));
    }
    Ok(sanitized)
}

fn create_private_dir(dir: &Path) -> Result<(), WalletError> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| WalletError::io(dir, e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))
            .map_err(|e| WalletError::io(dir, e))?;
    }
    Ok(())
}

/// Serialize `document` as YAML and move it into place atomically.
pub fn write_document<T: Serialize>(
    path: &Path,
    document: &T,
    overwrite: bool,
) -> Result<(), WalletError> {
    if !overwrite && path.exists() {
        return Err(WalletError::AlreadyExists(path.to_path_buf()));
    }
    let dir = path
        .parent()
        .ok_or_else(|| WalletError::Config(format!("{} has no parent directory", path.display())))?;
    let body = zeroize::Zeroizing::new(serde_yaml::to_string(document)?);

    let mut tmp = tempfile::Builder::new()
        .prefix(".tmp-")
        .suffix(".partial")
        .tempfile_in(dir)
        .map_err(|e| WalletError::io(dir, e))?;
    tmp.write_all(body.as_bytes()).map_err(|e| WalletError::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| WalletError::io(tmp.path(), e))?;

    if overwrite {
        tmp.persist(path).map_err(|e| WalletError::io(path, e.error))?;
    } else {
        tmp.persist_noclobber(path).map_err(|e| {
            if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                WalletError::AlreadyExists(path.to_path_buf())
            } else {
                WalletError::io(path, e.error)
            }
        })?;
    }
    Ok(())
}

pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, WalletError> {
    let body = zeroize::Zeroizing::new(fs::read_to_string(path).map_err(|e| WalletError::io(path, e))?);
    serde_yaml::from_str(&body)
        .map_err(|e| WalletError::Serialization(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(tmp: &TempDir) -> WalletStore {
        WalletStore::new(tmp.path().join("wallets"), tmp.path().join("keys"))
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let err = store(&tmp).ensure_wallet_root_exists().unwrap_err();
        assert!(err.is_fatal());
        assert!(store(&tmp).list_all_wallet_names().unwrap_err().is_fatal());
    }

    #[test]
    fn test_list_files_by_extension_missing_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        assert!(s.list_files_by_extension(&tmp.path().join("nope"), KeyExtension::CurrentKey).is_empty());
    }

    #[test]
    fn test_list_files_by_extension_exact() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        let dir = s.wallet_dir("main");
        touch(&dir.join("a.wallet"));
        touch(&dir.join("b.legacy-wallet"));
        touch(&dir.join("c.key"));
        touch(&dir.join("notes.txt"));

        assert_eq!(s.list_files_by_extension(&dir, KeyExtension::CurrentWallet), vec!["a"]);
        assert_eq!(s.list_files_by_extension(&dir, KeyExtension::LegacyWallet), vec!["b"]);
        assert_eq!(s.list_files_by_extension(&dir, KeyExtension::CurrentKey), vec!["c"]);
    }

    #[test]
    fn test_corrupt_file_still_discovered() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        let path = s.wallet_dir("w").join("w-0.key");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"\x00\x01 not yaml: [").unwrap();

        let keys = s.list_wallet_keys("w");
        assert_eq!(keys.len(), 1);
        assert!(s.read_hd_key("w", &keys[0]).is_err());
    }

    #[test]
    fn test_write_document_refuses_overwrite() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("x.key");
        let doc = HdKeyDocument { version: 1, public_key: "ab".into(), index: 0, legacy: false };
        write_document(&path, &doc, false).unwrap();
        assert!(matches!(write_document(&path, &doc, false), Err(WalletError::AlreadyExists(_))));
        write_document(&path, &doc, true).unwrap();
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("x.key");
        let doc = HdKeyDocument { version: 1, public_key: "ab".into(), index: 0, legacy: false };
        write_document(&path, &doc, false).unwrap();
        let names: Vec<String> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["x.key"]);
    }

    #[test]
    fn test_checked_name() {
        assert_eq!(checked_name("My Wallet").unwrap(), "my-wallet");
        assert!(matches!(checked_name("///"), Err(WalletError::InvalidWalletName(_))));
    }

    #[test]
    fn test_wallet_listing_legacy_first() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        touch(&s.wallet_dir("alpha").join("alpha.wallet"));
        touch(&s.wallet_dir("beta").join("beta.legacy-wallet"));
        touch(&s.wallet_dir("gamma").join("gamma.wallet"));

        let names = s.list_all_wallet_names().unwrap();
        assert_eq!(names.len(), 3);
        assert_eq!(names[0], "beta.legacy-wallet");
        assert!(names[1..].iter().all(|n| n.ends_with(".wallet")));

        let files = s.list_wallet_files().unwrap();
        assert_eq!(files[0].0, "beta");
        assert!(files[0].1.is_legacy());
    }

    #[test]
    fn test_rename_and_delete_wallet() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        touch(&s.wallet_dir("old").join("old.wallet"));
        touch(&s.wallet_dir("old").join("old-0.key"));

        s.rename_wallet("old", "new").unwrap();
        assert!(!s.wallet_exists("old"));
        assert!(s.wallet_dir("new").join("new.wallet").is_file());
        assert!(s.wallet_dir("new").join("old-0.key").is_file());

        assert!(matches!(s.rename_wallet("missing", "x"), Err(WalletError::WalletNotFound(_))));
        s.delete_wallet("new").unwrap();
        assert!(matches!(s.delete_wallet("new"), Err(WalletError::WalletNotFound(_))));
    }
}
