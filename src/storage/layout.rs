//! File classification by extension.
//!
//! Classification is purely by suffix and never reads file contents. The
//! recognized extensions form a closed set matched longest first, so a name
//! can only ever belong to one class.

use std::fmt;

/// How the key material in a file came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyMethod {
    /// Derived from a wallet root secret.
    Hd,
    /// Standalone keypair.
    Plain,
    /// The wallet root secret itself.
    WalletRoot,
}

/// Every recognized file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyExtension {
    CurrentKey,
    LegacyKey,
    CurrentPlain,
    LegacyPlain,
    CurrentWallet,
    LegacyWallet,
}

impl KeyExtension {
    /// All extensions, longest suffix first.
    pub const BY_SUFFIX_LENGTH: [KeyExtension; 6] = [
        KeyExtension::LegacyPlain,
        KeyExtension::LegacyWallet,
        KeyExtension::LegacyKey,
        KeyExtension::CurrentPlain,
        KeyExtension::CurrentWallet,
        KeyExtension::CurrentKey,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            KeyExtension::CurrentKey => ".key",
            KeyExtension::LegacyKey => ".legacy-key",
            KeyExtension::CurrentPlain => ".plain-key",
            KeyExtension::LegacyPlain => ".legacy-plain-key",
            KeyExtension::CurrentWallet => ".wallet",
            KeyExtension::LegacyWallet => ".legacy-wallet",
        }
    }

    pub fn is_legacy(self) -> bool {
        matches!(
            self,
            KeyExtension::LegacyKey | KeyExtension::LegacyPlain | KeyExtension::LegacyWallet
        )
    }

    pub fn method(self) -> KeyMethod {
        match self {
            KeyExtension::CurrentKey | KeyExtension::LegacyKey => KeyMethod::Hd,
            KeyExtension::CurrentPlain | KeyExtension::LegacyPlain => KeyMethod::Plain,
            KeyExtension::CurrentWallet | KeyExtension::LegacyWallet => KeyMethod::WalletRoot,
        }
    }

    pub fn hd_key(legacy: bool) -> Self {
        if legacy {
            KeyExtension::LegacyKey
        } else {
            KeyExtension::CurrentKey
        }
    }

    pub fn plain_key(legacy: bool) -> Self {
        if legacy {
            KeyExtension::LegacyPlain
        } else {
            KeyExtension::CurrentPlain
        }
    }

    pub fn wallet(legacy: bool) -> Self {
        if legacy {
            KeyExtension::LegacyWallet
        } else {
            KeyExtension::CurrentWallet
        }
    }

    /// Split `file_name` into base name and extension. `None` for names with
    /// no recognized extension or an empty base name.
    pub fn classify(file_name: &str) -> Option<(&str, KeyExtension)> {
        Self::BY_SUFFIX_LENGTH.iter().find_map(|ext| {
            file_name
                .strip_suffix(ext.suffix())
                .filter(|base| !base.is_empty())
                .map(|base| (base, *ext))
        })
    }

    /// File name for `base_name` with this extension.
    pub fn file_name(self, base_name: &str) -> String {
        format!("{}{}", base_name, self.suffix())
    }
}

impl fmt::Display for KeyExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// A classified key artifact on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyFile {
    pub base_name: String,
    pub extension: KeyExtension,
    /// Known only once the file has been read; HD keys only.
    pub derivation_index: Option<u32>,
}

impl KeyFile {
    pub fn new(base_name: impl Into<String>, extension: KeyExtension) -> Self {
        Self { base_name: base_name.into(), extension, derivation_index: None }
    }

    pub fn from_file_name(file_name: &str) -> Option<Self> {
        KeyExtension::classify(file_name).map(|(base, ext)| Self::new(base, ext))
    }

    pub fn file_name(&self) -> String {
        self.extension.file_name(&self.base_name)
    }

    pub fn is_legacy(&self) -> bool {
        self.extension.is_legacy()
    }
}
