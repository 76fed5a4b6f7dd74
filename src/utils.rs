// src/utils.rs
use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::errors::WalletError;

/// Convert bytes to a lowercase hex string.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Convert a hex-encoded string to bytes.
///
/// Odd lengths and non-hex characters are rejected. The empty string decodes
/// to an empty vector.
pub fn from_hex(hex_string: &str) -> Result<Vec<u8>, WalletError> {
    hex::decode(hex_string).map_err(|e| WalletError::InvalidEncoding(e.to_string()))
}

static ILLEGAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/?<>\\:*|"\s]"#).expect("hardcoded regex should always compile"));
static CONTROL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x00-\x1f\x{80}-\x{9f}]").expect("hardcoded regex should always compile")
});
static RESERVED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\.+$").expect("hardcoded regex should always compile"));
static WINDOWS_RESERVED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(con|prn|aux|nul|com[0-9]|lpt[0-9])(\..*)?$")
        .expect("hardcoded regex should always compile")
});
static WINDOWS_TRAILING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[. ]+$").expect("hardcoded regex should always compile"));

/// Make a string safe to use as a file or directory name.
///
/// Illegal, control, reserved and trailing characters become `-`, trailing
/// hyphens are dropped and the result is lower-cased.
pub fn sanitize_filename(input: &str) -> String {
    let s = ILLEGAL_RE.replace_all(input, "-");
    let s = CONTROL_RE.replace_all(&s, "-");
    let s = RESERVED_RE.replace_all(&s, "-");
    let s = WINDOWS_RESERVED_RE.replace_all(&s, "-");
    let s = WINDOWS_TRAILING_RE.replace_all(&s, "-");
    s.trim_end_matches('-').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        let bytes = from_hex("48656c6c6f").unwrap();
        assert_eq!(bytes, b"Hello");
    }

    #[test]
    fn test_from_hex_invalid() {
        assert!(matches!(from_hex("invalid"), Err(WalletError::InvalidEncoding(_))));
        assert!(matches!(from_hex("abc"), Err(WalletError::InvalidEncoding(_))));
    }

    #[test]
    fn test_from_hex_accepts_uppercase() {
        assert_eq!(from_hex("DEADBEEF").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(b"Hello"), "48656c6c6f");
        assert_eq!(to_hex(&[]), "");
        assert_eq!(to_hex(&[0x00, 0xff]), "00ff");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("This is a <sample> string:file\\name?"), "this-is-a--sample--string-file-name");
        assert_eq!(sanitize_filename("My Wallet"), "my-wallet");
        assert_eq!(sanitize_filename("con"), "");
        assert_eq!(sanitize_filename(".."), "");
        assert_eq!(sanitize_filename("main."), "main");
    }
}
