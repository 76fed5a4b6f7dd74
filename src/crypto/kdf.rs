use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use scrypt::Params;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::errors::WalletError;

/// Upper bound accepted for scrypt `log_n` when reading a stored blob, so a
/// crafted file cannot make decryption allocate unbounded memory.
pub const MAX_SCRYPT_LOG_N: u8 = 22;
pub const MAX_SCRYPT_R: u32 = 32;
pub const MAX_SCRYPT_P: u32 = 16;
/// Ceiling on scrypt working memory, `128 * r * 2^log_n` bytes.
pub const MAX_SCRYPT_MEMORY: u64 = 1 << 30;
pub const MIN_PBKDF2_ITERATIONS: u32 = 1_000;

/// Password hashing algorithm plus its cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "lowercase")]
pub enum KdfAlgorithm {
    Scrypt { log_n: u8, r: u32, p: u32 },
    Pbkdf2 { iterations: u32 },
}

impl KdfAlgorithm {
    const SCRYPT_ID: u8 = 1;
    const PBKDF2_ID: u8 = 2;

    /// Serialized parameter block length (id + 9 parameter bytes).
    pub const ENCODED_LEN: usize = 10;

    pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        match *self {
            KdfAlgorithm::Scrypt { log_n, r, p } => {
                out[0] = Self::SCRYPT_ID;
                out[1] = log_n;
                out[2..6].copy_from_slice(&r.to_be_bytes());
                out[6..10].copy_from_slice(&p.to_be_bytes());
            }
            KdfAlgorithm::Pbkdf2 { iterations } => {
                out[0] = Self::PBKDF2_ID;
                out[2..6].copy_from_slice(&iterations.to_be_bytes());
            }
        }
        out
    }

    /// `None` for unknown ids or out-of-bounds costs.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::ENCODED_LEN {
            return None;
        }
        let word = |at: usize| u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        match bytes[0] {
            Self::SCRYPT_ID => {
                let algorithm = KdfAlgorithm::Scrypt { log_n: bytes[1], r: word(2), p: word(6) };
                algorithm.validate().ok().map(|_| algorithm)
            }
            Self::PBKDF2_ID => {
                let algorithm = KdfAlgorithm::Pbkdf2 { iterations: word(2) };
                algorithm.validate().ok().map(|_| algorithm)
            }
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        match *self {
            KdfAlgorithm::Scrypt { log_n, r, p } => {
                let out_of_bounds = log_n == 0
                    || log_n > MAX_SCRYPT_LOG_N
                    || r == 0
                    || r > MAX_SCRYPT_R
                    || p == 0
                    || p > MAX_SCRYPT_P;
                if out_of_bounds || 128 * u64::from(r) * (1u64 << log_n) > MAX_SCRYPT_MEMORY {
                    return Err(WalletError::Config(format!(
                        "invalid scrypt parameters log_n={} r={} p={}",
                        log_n, r, p
                    )));
                }
                Ok(())
            }
            KdfAlgorithm::Pbkdf2 { iterations } if iterations < MIN_PBKDF2_ITERATIONS => Err(
                WalletError::Config(format!("pbkdf2 needs at least {} iterations", MIN_PBKDF2_ITERATIONS)),
            ),
            KdfAlgorithm::Pbkdf2 { .. } => Ok(()),
        }
    }
}

impl Default for KdfAlgorithm {
    fn default() -> Self {
        // N=2^17, r=8, p=1
        KdfAlgorithm::Scrypt { log_n: 17, r: 8, p: 1 }
    }
}

pub struct KeyDerivation {
    algorithm: KdfAlgorithm,
}

impl KeyDerivation {
    pub fn new(algorithm: KdfAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn derive_key(
        &self,
        password: &[u8],
        salt: &[u8],
        key_length: usize,
    ) -> Result<Zeroizing<Vec<u8>>, WalletError> {
        debug!("Deriving key with length {} bytes", key_length);

        match self.algorithm {
            KdfAlgorithm::Pbkdf2 { iterations } => {
                let mut key = Zeroizing::new(vec![0u8; key_length]);
                pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key);
                Ok(key)
            }
            KdfAlgorithm::Scrypt { log_n, r, p } => {
                let params = Params::new(log_n, r, p, key_length).map_err(|e| {
                    WalletError::EncryptionFailed(format!("Invalid Scrypt parameters: {}", e))
                })?;
                let mut key = Zeroizing::new(vec![0u8; key_length]);
                scrypt::scrypt(password, salt, &params, &mut key).map_err(|e| {
                    WalletError::EncryptionFailed(format!("Scrypt derivation failed: {}", e))
                })?;
                Ok(key)
            }
        }
    }

    pub fn generate_salt(length: usize) -> Vec<u8> {
        let mut salt = vec![0u8; length];
        rand::rngs::OsRng.fill_bytes(&mut salt);
        salt
    }
}
