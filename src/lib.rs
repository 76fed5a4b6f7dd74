// src/lib.rs
//! Local key and wallet management: plain and HD Ed25519 keys, password
//! protected wallet secrets and a legacy-aware on-disk layout.

pub mod cli;
pub mod core;
pub mod crypto;
pub mod security;
pub mod storage;
pub mod utils;

pub use crate::core::errors::WalletError;
pub use crate::core::key_manager::KeyManager;
