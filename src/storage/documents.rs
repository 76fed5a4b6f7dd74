//! YAML documents persisted for wallets and keys.

use base64::Engine;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::core::errors::WalletError;
use crate::security::encryption::EncryptedBlob;
use crate::utils::{from_hex, to_hex};

pub const DOCUMENT_VERSION: u32 = 1;

/// Secret as written to disk: either plain hex or a base64 encrypted blob.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "encoding", content = "value", rename_all = "lowercase")]
pub enum StoredSecret {
    Hex(String),
    Encrypted(String),
}

impl StoredSecret {
    pub fn plain(secret: &[u8]) -> Self {
        StoredSecret::Hex(to_hex(secret))
    }

    pub fn encrypted(blob: &EncryptedBlob) -> Self {
        StoredSecret::Encrypted(base64::engine::general_purpose::STANDARD.encode(blob.as_bytes()))
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, StoredSecret::Encrypted(_))
    }

    /// Plain secret bytes; `None` when the secret is encrypted.
    pub fn plain_bytes(&self) -> Option<Result<Zeroizing<Vec<u8>>, WalletError>> {
        match self {
            StoredSecret::Hex(hex) => Some(from_hex(hex).map(Zeroizing::new)),
            StoredSecret::Encrypted(_) => None,
        }
    }

    /// Encrypted blob; `None` when the secret is stored in plain.
    ///
    /// Undecodable base64 is reported as `DecryptionFailed`, the same as any
    /// other corruption of the ciphertext.
    pub fn blob(&self) -> Option<Result<EncryptedBlob, WalletError>> {
        match self {
            StoredSecret::Hex(_) => None,
            StoredSecret::Encrypted(b64) => Some(
                base64::engine::general_purpose::STANDARD
                    .decode(b64.trim())
                    .map(EncryptedBlob::from_bytes)
                    .map_err(|_| WalletError::DecryptionFailed),
            ),
        }
    }
}

impl Drop for StoredSecret {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        match self {
            StoredSecret::Hex(s) | StoredSecret::Encrypted(s) => s.zeroize(),
        }
    }
}

impl std::fmt::Debug for StoredSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoredSecret::Hex(_) => f.write_str("StoredSecret::Hex(<redacted>)"),
            StoredSecret::Encrypted(_) => f.write_str("StoredSecret::Encrypted(..)"),
        }
    }
}

/// What a wallet's root secret is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretKind {
    Mnemonic,
    Seed,
}

/// `<wallet>/<name>.wallet` / `.legacy-wallet`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletDocument {
    pub version: u32,
    pub legacy: bool,
    pub secret_kind: SecretKind,
    pub secret: StoredSecret,
}

impl WalletDocument {
    pub fn is_encrypted(&self) -> bool {
        self.secret.is_encrypted()
    }
}

/// `<wallet>/<alias>-<index>.key` / `.legacy-key`. Holds no secret: the
/// private key is re-derived from the wallet root on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HdKeyDocument {
    pub version: u32,
    pub public_key: String,
    pub index: u32,
    pub legacy: bool,
}

/// `<plain-root>/<alias>.plain-key` / `.legacy-plain-key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainKeyDocument {
    pub version: u32,
    pub public_key: String,
    pub secret_key: StoredSecret,
}
