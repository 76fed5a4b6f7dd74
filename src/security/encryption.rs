// src/security/encryption.rs
//! Password based encryption of wallet root secrets.
//!
//! Blob layout (all integers big endian):
//!
//! ```text
//! magic "KDAS" (4) | version (1) | kdf params (10) | salt (16) | nonce (12) | ciphertext || tag
//! ```
//!
//! Everything before the ciphertext is bound as AES-GCM associated data, so a
//! tampered header fails authentication like a tampered ciphertext does.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::errors::WalletError;
use crate::crypto::kdf::{KdfAlgorithm, KeyDerivation};

pub const BLOB_MAGIC: &[u8; 4] = b"KDAS";
pub const BLOB_VERSION: u8 = 1;
pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;
const HEADER_LEN: usize = BLOB_MAGIC.len() + 1 + KdfAlgorithm::ENCODED_LEN + SALT_LEN + NONCE_LEN;

/// Self-describing encrypted secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob(Vec<u8>);

impl EncryptedBlob {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// KDF parameters recorded in the header, if the header is well formed.
    pub fn kdf(&self) -> Option<KdfAlgorithm> {
        let header = self.header()?;
        KdfAlgorithm::decode(&header[5..5 + KdfAlgorithm::ENCODED_LEN])
    }

    fn header(&self) -> Option<&[u8]> {
        if self.0.len() < HEADER_LEN + TAG_LEN {
            return None;
        }
        let header = &self.0[..HEADER_LEN];
        if &header[..4] != BLOB_MAGIC || header[4] != BLOB_VERSION {
            return None;
        }
        Some(header)
    }
}

/// Encrypt `secret` under a key stretched from `password`.
pub fn encrypt_secret(
    secret: &[u8],
    password: &str,
    kdf: KdfAlgorithm,
) -> Result<EncryptedBlob, WalletError> {
    kdf.validate()?;

    let salt = KeyDerivation::generate_salt(SALT_LEN);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);

    let mut blob = Vec::with_capacity(HEADER_LEN + secret.len() + TAG_LEN);
    blob.extend_from_slice(BLOB_MAGIC);
    blob.push(BLOB_VERSION);
    blob.extend_from_slice(&kdf.encode());
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce_bytes);

    let key = KeyDerivation::new(kdf).derive_key(password.as_bytes(), &salt, KEY_LEN)?;
    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|_| WalletError::EncryptionFailed("Invalid key length".to_string()))?;

    #[allow(deprecated)]
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, Payload { msg: secret, aad: &blob })
        .map_err(|_| WalletError::EncryptionFailed("Encryption failed".to_string()))?;

    blob.extend_from_slice(&ciphertext);
    debug!(len = blob.len(), "secret encrypted");
    Ok(EncryptedBlob(blob))
}

/// Decrypt a blob produced by [`encrypt_secret`].
///
/// Every failure, whether a wrong password, a truncated blob or a modified
/// byte, is reported as `DecryptionFailed`.
pub fn decrypt_secret(blob: &EncryptedBlob, password: &str) -> Result<Zeroizing<Vec<u8>>, WalletError> {
    let header = blob.header().ok_or(WalletError::DecryptionFailed)?;
    let kdf = blob.kdf().ok_or(WalletError::DecryptionFailed)?;
    let salt_at = 5 + KdfAlgorithm::ENCODED_LEN;
    let salt = &header[salt_at..salt_at + SALT_LEN];
    let nonce_bytes = &header[salt_at + SALT_LEN..HEADER_LEN];
    let ciphertext = &blob.as_bytes()[HEADER_LEN..];

    let key = KeyDerivation::new(kdf)
        .derive_key(password.as_bytes(), salt, KEY_LEN)
        .map_err(|_| WalletError::DecryptionFailed)?;
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| WalletError::DecryptionFailed)?;

    #[allow(deprecated)]
    let nonce = Nonce::from_slice(nonce_bytes);
    let plaintext = cipher
        .decrypt(nonce, Payload { msg: ciphertext, aad: header })
        .map_err(|_| WalletError::DecryptionFailed)?;

    Ok(Zeroizing::new(plaintext))
}
