//! # Account Names
//!
//! Every account on the ledger is identified by a [`Name`]: up to 12
//! characters drawn from `.12345abcdefghijklmnopqrstuvwxyz`, packed 5 bits
//! per character into a `u64`. An optional 13th character is allowed but
//! only gets 4 bits, so it is limited to `.12345abcdefghij`.
//!
//! Packing into an integer gives us cheap copies, cheap comparisons, and a
//! natural primary key for the keyed tables in [`crate::storage`]. Ordering
//! follows the packed value, which is also lexicographic order for names
//! of equal length.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::MAX_NAME_LEN;

/// Display alphabet, indexed by 5-bit character value.
const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// Errors produced when parsing a [`Name`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("name is empty")]
    Empty,

    #[error("name '{0}' is longer than 13 characters")]
    TooLong(String),

    #[error("name '{name}' contains invalid character '{ch}'")]
    InvalidChar { name: String, ch: char },

    /// Only `.` and `1-5a-j` fit in the 4 bits left for the 13th character.
    #[error("thirteenth character of name '{0}' must be one of .12345abcdefghij")]
    InvalidThirteenth(String),

    /// Names ending in `.` are indistinguishable from the trimmed form.
    #[error("name '{0}' is not normalized (trailing dots)")]
    NotNormalized(String),
}

/// A 64-bit packed account name.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Name(u64);

/// Maps one ASCII byte to its 5-bit value, or `None` if it is not part of
/// the name alphabet.
const fn char_value(c: u8) -> Option<u64> {
    match c {
        b'a'..=b'z' => Some((c - b'a') as u64 + 6),
        b'1'..=b'5' => Some((c - b'1') as u64 + 1),
        b'.' => Some(0),
        _ => None,
    }
}

impl Name {
    /// Wraps an already-packed value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The packed value. Used as a table scope and primary key.
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Packs a name at compile time.
    ///
    /// Intended for `const` items such as the default contract account;
    /// an invalid literal fails the build instead of surfacing at runtime.
    /// Use [`str::parse`] for anything that comes from user input.
    pub const fn constant(s: &str) -> Self {
        let bytes = s.as_bytes();
        if bytes.is_empty() || bytes.len() > 12 {
            panic!("constant names must be 1 to 12 characters");
        }
        let mut value: u64 = 0;
        let mut i = 0;
        while i < bytes.len() {
            let c = match char_value(bytes[i]) {
                Some(c) => c,
                None => panic!("invalid character in constant name"),
            };
            value |= (c & 0x1f) << (64 - 5 * (i + 1));
            i += 1;
        }
        Self(value)
    }

    /// Returns `true` for the empty name (raw value zero).
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    fn encode(s: &str) -> Result<u64, NameError> {
        let bytes = s.as_bytes();
        if bytes.is_empty() {
            return Err(NameError::Empty);
        }
        if bytes.len() > MAX_NAME_LEN {
            return Err(NameError::TooLong(s.to_string()));
        }

        let mut value: u64 = 0;
        for (i, &b) in bytes.iter().enumerate().take(12) {
            let c = char_value(b).ok_or_else(|| NameError::InvalidChar {
                name: s.to_string(),
                ch: b as char,
            })?;
            value |= (c & 0x1f) << (64 - 5 * (i + 1));
        }

        if bytes.len() == 13 {
            let b = bytes[12];
            let c = char_value(b).ok_or_else(|| NameError::InvalidChar {
                name: s.to_string(),
                ch: b as char,
            })?;
            if c > 0x0f {
                return Err(NameError::InvalidThirteenth(s.to_string()));
            }
            value |= c;
        }

        Ok(value)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = [b'.'; 13];
        let mut tmp = self.0;
        for i in 0..13 {
            let mask = if i == 0 { 0x0f } else { 0x1f };
            out[12 - i] = CHARMAP[(tmp & mask) as usize];
            tmp >>= if i == 0 { 4 } else { 5 };
        }
        let end = out.iter().rposition(|&b| b != b'.').map_or(0, |p| p + 1);
        // Every byte comes from CHARMAP, which is ASCII.
        f.write_str(std::str::from_utf8(&out[..end]).map_err(|_| fmt::Error)?)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self)
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = Name(Self::encode(s)?);
        if name.to_string() != s {
            return Err(NameError::NotNormalized(s.to_string()));
        }
        Ok(name)
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_round_trip() {
        for s in ["alice", "bob", "locktoken", "eosio.token", "a1b2c3d4e5", "zzzzzzzzzzzzj"] {
            let name: Name = s.parse().unwrap();
            assert_eq!(name.to_string(), s);
        }
    }

    #[test]
    fn constant_matches_runtime_parse() {
        const ALICE: Name = Name::constant("alice");
        assert_eq!(ALICE, "alice".parse().unwrap());
    }

    #[test]
    fn rejects_invalid_characters() {
        assert!(matches!("Alice".parse::<Name>(), Err(NameError::InvalidChar { .. })));
        assert!(matches!("bob6".parse::<Name>(), Err(NameError::InvalidChar { .. })));
        assert!(matches!("".parse::<Name>(), Err(NameError::Empty)));
    }

    #[test]
    fn rejects_overlong_and_bad_thirteenth() {
        assert!(matches!(
            "aaaaaaaaaaaaaa".parse::<Name>(),
            Err(NameError::TooLong(_))
        ));
        assert!(matches!(
            "aaaaaaaaaaaak".parse::<Name>(),
            Err(NameError::InvalidThirteenth(_))
        ));
    }

    #[test]
    fn rejects_trailing_dots() {
        assert!(matches!(
            "alice.".parse::<Name>(),
            Err(NameError::NotNormalized(_))
        ));
    }

    #[test]
    fn ordering_follows_packed_value() {
        let a: Name = "alice".parse().unwrap();
        let b: Name = "bob".parse().unwrap();
        assert!(a < b);
        assert!(a.raw() < b.raw());
    }

    #[test]
    fn serde_uses_text_form() {
        let name: Name = "carol".parse().unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"carol\"");
        let back: Name = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }
}
