//! Account identifiers of the form `<prefix>:<public key>`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::core::errors::WalletError;

static ACCOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[kctwuKCTWU]:[a-zA-Z0-9]{64}$").expect("Hardcoded regex should always compile"));

/// Guard scheme encoded by the account prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountPrefix {
    /// Single-key guard.
    K,
    /// Capability guard.
    C,
    /// Module guard.
    T,
    /// Keyset-ref guard.
    W,
    /// User guard.
    U,
}

impl AccountPrefix {
    pub fn as_char(self) -> char {
        match self {
            AccountPrefix::K => 'k',
            AccountPrefix::C => 'c',
            AccountPrefix::T => 't',
            AccountPrefix::W => 'w',
            AccountPrefix::U => 'u',
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            'k' => Some(AccountPrefix::K),
            'c' => Some(AccountPrefix::C),
            't' => Some(AccountPrefix::T),
            'w' => Some(AccountPrefix::W),
            'u' => Some(AccountPrefix::U),
            _ => None,
        }
    }
}

/// Parsed account: prefix plus the lower-cased 64 character key part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Account {
    pub prefix: AccountPrefix,
    pub public_key: String,
}

impl Account {
    /// Parse and validate an account string, case-insensitively.
    pub fn parse(account: &str) -> Result<Self, WalletError> {
        if !ACCOUNT_RE.is_match(account) {
            return Err(WalletError::InvalidAccountFormat(account.to_string()));
        }
        let lowered = account.to_ascii_lowercase();
        // the regex guarantees an ascii prefix char followed by ':'
        let prefix = lowered
            .chars()
            .next()
            .and_then(AccountPrefix::from_char)
            .ok_or_else(|| WalletError::InvalidAccountFormat(account.to_string()))?;

        Ok(Self { prefix, public_key: lowered[2..].to_string() })
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.prefix.as_char(), self.public_key)
    }
}

impl FromStr for Account {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Account::parse(s)
    }
}

/// Extract the public key embedded in an account string.
///
/// ```
/// use kda_keystore::core::account::extract_public_key;
///
/// let account = format!("k:{}", "a".repeat(64));
/// assert_eq!(extract_public_key(&account).unwrap(), "a".repeat(64));
/// ```
pub fn extract_public_key(account: &str) -> Result<String, WalletError> {
    Account::parse(account).map(|a| a.public_key)
}

/// Default single-key account (`k:`) for a hex encoded public key.
pub fn account_for_public_key(public_key_hex: &str) -> String {
    format!("k:{}", public_key_hex.to_lowercase())
}
