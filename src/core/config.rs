use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::core::errors::WalletError;
use crate::crypto::kdf::KdfAlgorithm;

pub const ENV_WALLET_ROOT: &str = "KDA_WALLET_ROOT";
pub const ENV_PLAIN_KEY_ROOT: &str = "KDA_PLAIN_KEY_ROOT";

/// Keystore configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoreConfig {
    /// Directory holding one subdirectory per wallet
    #[serde(default = "KeystoreConfig::default_wallet_root")]
    pub wallet_root: PathBuf,

    /// Directory holding standalone plain keys
    #[serde(default = "KeystoreConfig::default_plain_key_root")]
    pub plain_key_root: PathBuf,

    /// Password hashing parameters for newly encrypted secrets
    #[serde(default)]
    pub kdf: KdfAlgorithm,

    /// Word count of generated mnemonics (12 or 24)
    #[serde(default = "KeystoreConfig::default_mnemonic_words")]
    pub mnemonic_words: usize,
}

impl KeystoreConfig {
    fn default_wallet_root() -> PathBuf {
        PathBuf::from(".kadena").join("wallets")
    }
    fn default_plain_key_root() -> PathBuf {
        PathBuf::from(".kadena").join("keys")
    }
    fn default_mnemonic_words() -> usize {
        12
    }

    /// Load from a TOML file; missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, WalletError> {
        let text = std::fs::read_to_string(path).map_err(|e| WalletError::io(path, e))?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| WalletError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Overrides taken from `KDA_WALLET_ROOT` and `KDA_PLAIN_KEY_ROOT`.
    pub fn env_overrides() -> ConfigOverrides {
        ConfigOverrides {
            wallet_root: env::var(ENV_WALLET_ROOT).ok().map(PathBuf::from),
            plain_key_root: env::var(ENV_PLAIN_KEY_ROOT).ok().map(PathBuf::from),
            ..ConfigOverrides::default()
        }
    }

    /// Return a copy with every set, non-empty override applied.
    pub fn with_overrides(&self, overrides: &ConfigOverrides) -> Self {
        let non_empty = |p: &Option<PathBuf>| p.clone().filter(|p| !p.as_os_str().is_empty());
        Self {
            wallet_root: non_empty(&overrides.wallet_root).unwrap_or_else(|| self.wallet_root.clone()),
            plain_key_root: non_empty(&overrides.plain_key_root)
                .unwrap_or_else(|| self.plain_key_root.clone()),
            kdf: overrides.kdf.unwrap_or(self.kdf),
            mnemonic_words: overrides.mnemonic_words.unwrap_or(self.mnemonic_words),
        }
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        if !matches!(self.mnemonic_words, 12 | 24) {
            return Err(WalletError::Config(format!(
                "mnemonic_words must be 12 or 24, got {}",
                self.mnemonic_words
            )));
        }
        self.kdf.validate()
    }
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            wallet_root: Self::default_wallet_root(),
            plain_key_root: Self::default_plain_key_root(),
            kdf: KdfAlgorithm::default(),
            mnemonic_words: Self::default_mnemonic_words(),
        }
    }
}

/// Partial configuration; `None` keeps the base value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub wallet_root: Option<PathBuf>,
    pub plain_key_root: Option<PathBuf>,
    pub kdf: Option<KdfAlgorithm>,
    pub mnemonic_words: Option<usize>,
}

impl ConfigOverrides {
    /// Later overrides win over earlier ones.
    pub fn merge(self, later: ConfigOverrides) -> ConfigOverrides {
        ConfigOverrides {
            wallet_root: later.wallet_root.or(self.wallet_root),
            plain_key_root: later.plain_key_root.or(self.plain_key_root),
            kdf: later.kdf.or(self.kdf),
            mnemonic_words: later.mnemonic_words.or(self.mnemonic_words),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults() {
        let config = KeystoreConfig::default();
        assert_eq!(config.wallet_root, PathBuf::from(".kadena/wallets"));
        assert_eq!(config.plain_key_root, PathBuf::from(".kadena/keys"));
        assert_eq!(config.mnemonic_words, 12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_overrides_leaves_base_untouched() {
        let base = KeystoreConfig::default();
        let overrides = ConfigOverrides {
            wallet_root: Some(PathBuf::from("/tmp/w")),
            mnemonic_words: Some(24),
            ..Default::default()
        };
        let merged = base.with_overrides(&overrides);
        assert_eq!(merged.wallet_root, PathBuf::from("/tmp/w"));
        assert_eq!(merged.mnemonic_words, 24);
        assert_eq!(merged.plain_key_root, base.plain_key_root);
        assert_eq!(base, KeystoreConfig::default());
    }

    #[test]
    fn test_empty_override_ignored() {
        let base = KeystoreConfig::default();
        let overrides =
            ConfigOverrides { wallet_root: Some(PathBuf::new()), ..Default::default() };
        assert_eq!(base.with_overrides(&overrides), base);
    }

    #[test]
    fn test_merge_prefers_later() {
        let a = ConfigOverrides { wallet_root: Some("a".into()), mnemonic_words: Some(12), ..Default::default() };
        let b = ConfigOverrides { wallet_root: Some("b".into()), ..Default::default() };
        let merged = a.merge(b);
        assert_eq!(merged.wallet_root, Some(PathBuf::from("b")));
        assert_eq!(merged.mnemonic_words, Some(12));
    }

    #[test]
    fn test_from_file_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore.toml");
        std::fs::write(
            &path,
            "wallet_root = \"/data/wallets\"\n[kdf]\nalgorithm = \"pbkdf2\"\niterations = 200000\n",
        )
        .unwrap();
        let config = KeystoreConfig::from_file(&path).unwrap();
        assert_eq!(config.wallet_root, PathBuf::from("/data/wallets"));
        assert_eq!(config.kdf, KdfAlgorithm::Pbkdf2 { iterations: 200_000 });
        assert_eq!(config.mnemonic_words, 12);
    }

    #[test]
    fn test_from_file_rejects_bad_word_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore.toml");
        std::fs::write(&path, "mnemonic_words = 15\n").unwrap();
        assert!(matches!(KeystoreConfig::from_file(&path), Err(WalletError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        env::set_var(ENV_WALLET_ROOT, "/env/wallets");
        env::remove_var(ENV_PLAIN_KEY_ROOT);
        let overrides = KeystoreConfig::env_overrides();
        env::remove_var(ENV_WALLET_ROOT);

        assert_eq!(overrides.wallet_root, Some(PathBuf::from("/env/wallets")));
        assert_eq!(overrides.plain_key_root, None);
    }
}
