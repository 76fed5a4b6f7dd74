pub mod account;
pub mod config;
pub mod derivation;
pub mod errors;
pub mod key_manager;
pub mod key_pair;
pub mod range;

pub use account::{extract_public_key, Account, AccountPrefix};
pub use config::{ConfigOverrides, KeystoreConfig};
pub use errors::WalletError;
pub use key_manager::{KeyManager, Wallet};
pub use key_pair::KeyPair;
pub use range::IndexSelector;
