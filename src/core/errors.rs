use std::path::PathBuf;
use thiserror::Error;

/// Error type shared by every keystore operation.
#[derive(Debug, Error)]
pub enum WalletError {
    /// Malformed hex input.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),
    /// Index/range expression contains characters outside `[0-9,\- ]`.
    #[error("Invalid number input. e.g \"1\" or \"1-10\" or \"1,10\"")]
    InvalidRangeInput,
    /// Range expression does not split into exactly two integers.
    #[error("Invalid range format. Expected format: \"start-end\" or \"start, end\" e.g \"1-10\" or \"1,10\"")]
    InvalidRangeFormat,
    /// Single index is not a whole number.
    #[error("Invalid number format. e.g \"1\"")]
    InvalidNumberFormat,
    /// Account string is not `<k|c|t|w|u>:<64 alphanumerics>`.
    #[error("Invalid account: {0}")]
    InvalidAccountFormat(String),
    /// The wallet root directory is absent. Fatal for the running command.
    #[error("No wallet created yet at {}. Please create a wallet first.", .0.display())]
    WalletRootMissing(PathBuf),
    /// Seed or mnemonic could not be used for derivation.
    #[error("Key derivation error: {0}")]
    DerivationError(String),
    /// Derivation index outside the hardened range.
    #[error("Invalid index {0}: must be below 2^31")]
    InvalidIndex(u64),
    /// Wrong password or corrupted ciphertext; deliberately indistinguishable.
    #[error("Decryption failed (wrong password or corrupted data)")]
    DecryptionFailed,
    /// Encryption could not be performed.
    #[error("Encryption error: {0}")]
    EncryptionFailed(String),
    /// Underlying filesystem error.
    #[error("IO error at {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Wallet or key name sanitizes to nothing.
    #[error("Invalid wallet name: {0:?}")]
    InvalidWalletName(String),
    /// Named wallet does not exist.
    #[error("Wallet not found: {0}")]
    WalletNotFound(String),
    /// Target file or directory is already present.
    #[error("Already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
    /// Stored document could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WalletError {
    /// Wrap an `io::Error` with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WalletError::IoFailure { path: path.into(), source }
    }

    /// True when the current command cannot continue at all.
    pub fn is_fatal(&self) -> bool {
        matches!(self, WalletError::WalletRootMissing(_))
    }

    /// True when the caller may report the error and keep going.
    pub fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }
}

impl From<serde_yaml::Error> for WalletError {
    fn from(err: serde_yaml::Error) -> Self {
        WalletError::Serialization(err.to_string())
    }
}

pub type Result<T, E = WalletError> = std::result::Result<T, E>;
