//! Ed25519 keypairs.

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use std::fmt;
use zeroize::Zeroizing;

use crate::core::account::account_for_public_key;
use crate::core::errors::WalletError;
use crate::security::secret::redacted;
use crate::utils::to_hex;

pub const PUBLIC_KEY_LENGTH: usize = 32;
pub const SECRET_KEY_LENGTH: usize = 32;

/// Public key plus private key material. The secret is zeroed on drop and is
/// never printed by `Debug`.
pub struct KeyPair {
    public_key: [u8; PUBLIC_KEY_LENGTH],
    secret_key: Zeroizing<[u8; SECRET_KEY_LENGTH]>,
}

impl KeyPair {
    /// Fresh keypair from the OS CSPRNG.
    pub fn generate() -> Self {
        let signing = SigningKey::generate(&mut OsRng);
        Self::from_signing_key(&signing)
    }

    /// Rebuild a keypair from its 32-byte secret.
    pub fn from_secret_bytes(secret: &[u8]) -> Result<Self, WalletError> {
        let bytes: Zeroizing<[u8; SECRET_KEY_LENGTH]> = Zeroizing::new(
            secret
                .try_into()
                .map_err(|_| WalletError::InvalidEncoding(format!(
                    "secret key must be {} bytes, got {}",
                    SECRET_KEY_LENGTH,
                    secret.len()
                )))?,
        );
        let signing = SigningKey::from_bytes(&bytes);
        Ok(Self::from_signing_key(&signing))
    }

    fn from_signing_key(signing: &SigningKey) -> Self {
        let public_key = VerifyingKey::from(signing).to_bytes();
        Self { public_key, secret_key: Zeroizing::new(signing.to_bytes()) }
    }

    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.public_key
    }

    pub fn public_key_hex(&self) -> String {
        to_hex(&self.public_key)
    }

    /// Default `k:` account for this key.
    pub fn account(&self) -> String {
        account_for_public_key(&self.public_key_hex())
    }

    /// Private key bytes. Callers must not keep copies beyond their use.
    pub fn secret_key(&self) -> &[u8; SECRET_KEY_LENGTH] {
        &self.secret_key
    }

}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key_hex())
            .field("secret_key", &redacted(SECRET_KEY_LENGTH))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_random() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        assert_ne!(a.public_key(), b.public_key());
        assert_ne!(a.secret_key(), b.secret_key());
    }

    #[test]
    fn test_from_secret_bytes_reproduces_public_key() {
        let original = KeyPair::generate();
        let restored = KeyPair::from_secret_bytes(original.secret_key()).unwrap();
        assert_eq!(original.public_key(), restored.public_key());
    }

    #[test]
    fn test_from_secret_bytes_wrong_length() {
        assert!(matches!(
            KeyPair::from_secret_bytes(&[0u8; 31]),
            Err(WalletError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let kp = KeyPair::generate();
        let printed = format!("{:?}", kp);
        assert!(printed.contains(&kp.public_key_hex()));
        assert!(!printed.contains(&to_hex(kp.secret_key())));
        assert!(printed.contains("<redacted"));
    }

    #[test]
    fn test_public_key_matches_signing_key() {
        let kp = KeyPair::generate();
        let signing = SigningKey::from_bytes(kp.secret_key());
        assert_eq!(&signing.verifying_key().to_bytes(), kp.public_key());
    }

    #[test]
    fn test_account_and_hex_lengths() {
        let kp = KeyPair::generate();
        assert_eq!(kp.public_key_hex().len(), 64);
        assert!(kp.account().starts_with("k:"));
        assert_eq!(kp.account().len(), 66);
    }
}
