//! Aliases for secret buffers that must be zeroized on drop, and helpers for
//! printing them safely.
use zeroize::Zeroizing;

/// Secret byte buffer, zeroed when dropped.
pub type SecretVec = Zeroizing<Vec<u8>>;

/// Secret text (mnemonics, passwords), zeroed when dropped.
pub type SecretString = Zeroizing<String>;

/// Placeholder used wherever secret bytes would otherwise be formatted.
pub fn redacted(len: usize) -> String {
    format!("<redacted len={}>", len)
}
