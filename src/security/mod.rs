// src/security/mod.rs
//! Protection of secrets at rest and in memory.

pub mod encryption;
pub mod secret;

pub use encryption::{decrypt_secret, encrypt_secret, EncryptedBlob};
pub use secret::{SecretString, SecretVec};
