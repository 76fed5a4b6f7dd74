//! Hierarchical-deterministic and plain key generation.
//!
//! HD keys follow SLIP-0010 for Ed25519: the master node is
//! HMAC-SHA512("ed25519 seed", seed) and every child is hardened.
//!
//! Paths:
//! - current: m/44'/626'/index'
//! - legacy:  m/44'/626'/0'/0'/index'
//!
//! The legacy path keeps keys of wallets created by older tooling
//! reproducible. Both are derived from the BIP-39 seed of the wallet mnemonic
//! (empty passphrase) or from raw seed bytes.

use bip39::{Language, Mnemonic};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha512;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::core::errors::WalletError;
use crate::core::key_pair::KeyPair;
use crate::core::range::IndexSelector;
use crate::security::secret::{SecretString, SecretVec};

type HmacSha512 = Hmac<Sha512>;

/// First hardened child index.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;
/// SLIP-0044 coin type.
pub const COIN_TYPE: u32 = 626;

const ED25519_CURVE_KEY: &[u8] = b"ed25519 seed";

/// Which derivation path family to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DerivationScheme {
    #[default]
    Current,
    Legacy,
}

impl DerivationScheme {
    pub fn from_legacy_flag(legacy: bool) -> Self {
        if legacy {
            DerivationScheme::Legacy
        } else {
            DerivationScheme::Current
        }
    }

    /// Unhardened path components for `index`.
    pub fn path(&self, index: u32) -> Vec<u32> {
        match self {
            DerivationScheme::Current => vec![44, COIN_TYPE, index],
            DerivationScheme::Legacy => vec![44, COIN_TYPE, 0, 0, index],
        }
    }

    /// Human readable path, e.g. `m/44'/626'/3'`.
    pub fn path_string(&self, index: u32) -> String {
        let mut out = String::from("m");
        for component in self.path(index) {
            out.push_str(&format!("/{}'", component));
        }
        out
    }
}

/// The root secret a wallet derives its keys from.
pub enum RootSecret {
    Mnemonic(SecretString),
    Seed(SecretVec),
}

impl RootSecret {
    pub fn mnemonic(phrase: &str) -> Self {
        RootSecret::Mnemonic(Zeroizing::new(phrase.to_string()))
    }

    pub fn seed(bytes: &[u8]) -> Self {
        RootSecret::Seed(Zeroizing::new(bytes.to_vec()))
    }

    /// BIP-39 seed bytes. Fails with `DerivationError` when the mnemonic has
    /// an unknown word or a bad checksum, or the raw seed has an unusable
    /// length.
    pub fn to_seed(&self) -> Result<SecretVec, WalletError> {
        match self {
            RootSecret::Mnemonic(phrase) => {
                let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase.trim())
                    .map_err(|e| WalletError::DerivationError(format!("invalid mnemonic: {}", e)))?;
                Ok(Zeroizing::new(mnemonic.to_seed("").to_vec()))
            }
            RootSecret::Seed(bytes) => {
                if bytes.len() < 16 || bytes.len() > 64 {
                    return Err(WalletError::DerivationError(format!(
                        "seed length must be between 16 and 64 bytes, got {}",
                        bytes.len()
                    )));
                }
                Ok(bytes.clone())
            }
        }
    }

    /// Raw bytes as persisted in a wallet file.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RootSecret::Mnemonic(phrase) => phrase.as_bytes(),
            RootSecret::Seed(bytes) => bytes.as_slice(),
        }
    }
}

impl std::fmt::Debug for RootSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RootSecret::Mnemonic(_) => f.write_str("RootSecret::Mnemonic(<redacted>)"),
            RootSecret::Seed(_) => f.write_str("RootSecret::Seed(<redacted>)"),
        }
    }
}

/// Fresh English BIP-39 mnemonic with 12 or 24 words.
pub fn generate_mnemonic(word_count: usize) -> Result<SecretString, WalletError> {
    let entropy_len = match word_count {
        12 => 16,
        24 => 32,
        other => {
            return Err(WalletError::DerivationError(format!(
                "unsupported mnemonic length {}, expected 12 or 24",
                other
            )))
        }
    };
    let mut entropy = Zeroizing::new(vec![0u8; entropy_len]);
    OsRng.fill_bytes(&mut entropy);
    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
        .map_err(|e| WalletError::DerivationError(e.to_string()))?;
    Ok(Zeroizing::new(mnemonic.to_string()))
}

/// SLIP-0010 Ed25519 node: private key plus chain code.
struct ExtendedKey {
    key: Zeroizing<[u8; 32]>,
    chain_code: Zeroizing<[u8; 32]>,
}

impl ExtendedKey {
    fn from_seed(seed: &[u8]) -> Result<Self, WalletError> {
        let mut mac = HmacSha512::new_from_slice(ED25519_CURVE_KEY)
            .map_err(|e| WalletError::DerivationError(format!("HMAC initialization failed: {}", e)))?;
        mac.update(seed);
        Ok(Self::split(&mac.finalize().into_bytes()))
    }

    /// Hardened child: HMAC-SHA512(chain_code, 0x00 || key || index').
    fn derive_child(&self, index: u32) -> Result<Self, WalletError> {
        let mut mac = HmacSha512::new_from_slice(self.chain_code.as_slice())
            .map_err(|e| WalletError::DerivationError(format!("HMAC initialization failed: {}", e)))?;
        mac.update(&[0x00]);
        mac.update(self.key.as_slice());
        mac.update(&(index | HARDENED_OFFSET).to_be_bytes());
        Ok(Self::split(&mac.finalize().into_bytes()))
    }

    fn split(output: &[u8]) -> Self {
        let mut key = Zeroizing::new([0u8; 32]);
        let mut chain_code = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(&output[..32]);
        chain_code.copy_from_slice(&output[32..64]);
        Self { key, chain_code }
    }

    fn derive_path(&self, path: &[u32]) -> Result<Self, WalletError> {
        let mut current = Self { key: self.key.clone(), chain_code: self.chain_code.clone() };
        for &component in path {
            current = current.derive_child(component)?;
        }
        Ok(current)
    }
}

/// One derived key and the index it came from.
#[derive(Debug)]
pub struct DerivedKey {
    pub index: u32,
    pub key_pair: KeyPair,
}

/// Index that could not be derived and why.
#[derive(Debug)]
pub struct IndexFailure {
    pub index: u64,
    pub error: WalletError,
}

/// Result of a bulk derivation. Failures for single indices do not stop the
/// remaining ones.
#[derive(Debug, Default)]
pub struct DerivationBatch {
    pub keys: Vec<DerivedKey>,
    pub failures: Vec<IndexFailure>,
}

impl DerivationBatch {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fresh random keypair with no derivation relationship.
pub fn generate_plain_key_pair() -> KeyPair {
    KeyPair::generate()
}

/// Derive a single HD keypair.
pub fn derive_key_pair(
    seed: &[u8],
    index: u32,
    scheme: DerivationScheme,
) -> Result<KeyPair, WalletError> {
    if index >= HARDENED_OFFSET {
        return Err(WalletError::InvalidIndex(index as u64));
    }
    let master = ExtendedKey::from_seed(seed)?;
    let node = master.derive_path(&scheme.path(index))?;
    KeyPair::from_secret_bytes(node.key.as_slice())
}

/// Derive every index the selector names, ascending. `legacy` selects the
/// legacy path family.
pub fn generate_hd_key_pairs(
    root: &RootSecret,
    selector: IndexSelector,
    legacy: bool,
) -> Result<DerivationBatch, WalletError> {
    let seed = root.to_seed()?;
    let scheme = DerivationScheme::from_legacy_flag(legacy);
    let master = ExtendedKey::from_seed(&seed)?;

    debug!(selector = %selector, ?scheme, "deriving HD keys");

    let mut batch = DerivationBatch::default();
    for index in selector.indices() {
        if index >= HARDENED_OFFSET {
            // every later index is out of range too; one entry covers them
            warn!(index, "index outside the hardened range, stopping");
            batch.failures.push(IndexFailure {
                index: index as u64,
                error: WalletError::InvalidIndex(index as u64),
            });
            break;
        }
        let derived = master
            .derive_path(&scheme.path(index))
            .and_then(|node| KeyPair::from_secret_bytes(node.key.as_slice()));
        match derived {
            Ok(key_pair) => {
                debug!(path = %scheme.path_string(index), "derived");
                batch.keys.push(DerivedKey { index, key_pair })
            }
            Err(error) => {
                warn!(index, %error, "skipping index");
                batch.failures.push(IndexFailure { index: index as u64, error });
            }
        }
    }
    Ok(batch)
}
