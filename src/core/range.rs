//! Index and index-range expressions used by bulk key generation.
//!
//! Accepted forms: `"5"`, `"1-10"`, `"1,10"` (whitespace allowed around the
//! numbers). Ranges are inclusive and kept in the order given; `"10-1"` is a
//! valid selector that simply selects nothing.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::core::errors::WalletError;

static INVALID_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9,\- ]").expect("Hardcoded regex should always compile"));

/// A single derivation index or an inclusive `[start, end]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSelector {
    Single(u32),
    Range { start: u32, end: u32 },
}

impl IndexSelector {
    /// Concrete indices in ascending order. Empty when `start > end`.
    pub fn indices(&self) -> std::ops::RangeInclusive<u32> {
        match *self {
            IndexSelector::Single(index) => index..=index,
            IndexSelector::Range { start, end } => start..=end,
        }
    }

    /// Number of indices the selector expands to.
    pub fn len(&self) -> usize {
        match *self {
            IndexSelector::Single(_) => 1,
            IndexSelector::Range { start, end } if start <= end => (end - start) as usize + 1,
            IndexSelector::Range { .. } => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for IndexSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexSelector::Single(index) => write!(f, "{}", index),
            IndexSelector::Range { start, end } => write!(f, "{}-{}", start, end),
        }
    }
}

impl FromStr for IndexSelector {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parse a user supplied index or range expression.
///
/// Hyphen takes precedence over comma when both are present.
pub fn parse(input: &str) -> Result<IndexSelector, WalletError> {
    let trimmed = input.trim();

    if INVALID_CHARS.is_match(trimmed) {
        return Err(WalletError::InvalidRangeInput);
    }

    let separator = if trimmed.contains('-') {
        Some('-')
    } else if trimmed.contains(',') {
        Some(',')
    } else {
        None
    };

    match separator {
        Some(sep) => {
            let parts: Vec<Option<u32>> = trimmed.split(sep).map(parse_leading_int).collect();
            match parts.as_slice() {
                [Some(start), Some(end)] => Ok(IndexSelector::Range { start: *start, end: *end }),
                _ => Err(WalletError::InvalidRangeFormat),
            }
        }
        None => parse_leading_int(trimmed)
            .map(IndexSelector::Single)
            .ok_or(WalletError::InvalidNumberFormat),
    }
}

/// Leading whitespace is skipped and the longest run of leading digits is the
/// value; anything after that run is ignored. `None` when there is no digit or
/// the value does not fit a `u32`.
fn parse_leading_int(part: &str) -> Option<u32> {
    let part = part.trim_start();
    let end = part.find(|c: char| !c.is_ascii_digit()).unwrap_or(part.len());
    if end == 0 {
        return None;
    }
    part[..end].parse().ok()
}
