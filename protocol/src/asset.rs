//! # Symbols and Assets
//!
//! An [`Asset`] is a signed fixed-point amount tagged with a [`Symbol`].
//! The symbol carries both the ticker ([`SymbolCode`]) and the precision,
//! so `100.0000 TOK` and `100.00 TOK` are *different* symbols even though
//! they share a code. Tables are keyed by code; operations compare the
//! full symbol and reject a precision mismatch.
//!
//! Amounts are integers in the smallest unit -- no floating point anywhere
//! near money. `100.0000 TOK` is stored as `amount = 1_000_000` with
//! precision 4.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{MAX_ASSET_AMOUNT, MAX_PRECISION, MAX_SYMBOL_CODE_LEN};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced while building or parsing a [`SymbolCode`] or [`Symbol`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    #[error("symbol code '{0}' must be 1 to 7 uppercase letters")]
    InvalidCode(String),

    #[error("precision {0} exceeds the maximum of 18")]
    PrecisionTooLarge(u8),

    #[error("malformed symbol '{0}', expected '<precision>,<CODE>'")]
    Malformed(String),
}

/// Errors produced by [`Asset`] parsing and arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error(transparent)]
    Symbol(#[from] SymbolError),

    #[error("malformed asset '{0}', expected '<amount> <CODE>'")]
    Malformed(String),

    #[error("asset amount out of range: {0}")]
    OutOfRange(String),

    #[error("symbol mismatch: {left} vs {right}")]
    SymbolMismatch { left: Symbol, right: Symbol },
}

// ---------------------------------------------------------------------------
// SymbolCode
// ---------------------------------------------------------------------------

/// Ticker of up to seven uppercase ASCII letters, packed little-endian
/// into a `u64` so it can serve directly as a table key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolCode(u64);

impl SymbolCode {
    /// Packs and validates a ticker.
    pub fn new(code: &str) -> Result<Self, SymbolError> {
        let bytes = code.as_bytes();
        if bytes.is_empty()
            || bytes.len() > MAX_SYMBOL_CODE_LEN
            || !bytes.iter().all(|b| b.is_ascii_uppercase())
        {
            return Err(SymbolError::InvalidCode(code.to_string()));
        }
        let raw = bytes
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, &b)| acc | (u64::from(b) << (8 * i)));
        Ok(Self(raw))
    }

    /// The packed value.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Rebuilds a code from a table key, validating it on the way.
    pub fn from_raw(raw: u64) -> Result<Self, SymbolError> {
        let text: String = raw
            .to_le_bytes()
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect();
        let code = Self::new(&text)?;
        if code.0 != raw {
            return Err(SymbolError::InvalidCode(format!("{raw:#x}")));
        }
        Ok(code)
    }
}

impl fmt::Display for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0.to_le_bytes().iter().take_while(|&&b| b != 0) {
            write!(f, "{}", *b as char)?;
        }
        Ok(())
    }
}

impl fmt::Debug for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolCode({})", self)
    }
}

impl FromStr for SymbolCode {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// Symbol
// ---------------------------------------------------------------------------

/// A symbol code together with its decimal precision, e.g. `4,TOK`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    precision: u8,
    code: SymbolCode,
}

impl Symbol {
    pub fn new(precision: u8, code: SymbolCode) -> Result<Self, SymbolError> {
        if precision > MAX_PRECISION {
            return Err(SymbolError::PrecisionTooLarge(precision));
        }
        Ok(Self { precision, code })
    }

    /// Convenience constructor from a ticker string.
    pub fn parse_code(precision: u8, code: &str) -> Result<Self, SymbolError> {
        Self::new(precision, SymbolCode::new(code)?)
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn code(&self) -> SymbolCode {
        self.code
    }

    /// `10^precision`, the number of smallest units in one whole token.
    pub fn unit(&self) -> i64 {
        10i64.pow(u32::from(self.precision))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision, self.code)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self)
    }
}

impl FromStr for Symbol {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (precision, code) = s
            .split_once(',')
            .ok_or_else(|| SymbolError::Malformed(s.to_string()))?;
        let precision: u8 = precision
            .trim()
            .parse()
            .map_err(|_| SymbolError::Malformed(s.to_string()))?;
        Self::parse_code(precision, code.trim())
    }
}

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

/// A fixed-point amount of a given symbol.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Asset {
    /// Amount in the smallest unit of `symbol`.
    pub amount: i64,
    pub symbol: Symbol,
}

impl Asset {
    pub fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }

    /// Zero of the given symbol.
    pub fn zero(symbol: Symbol) -> Self {
        Self { amount: 0, symbol }
    }

    /// `true` when the amount sits inside the representable range.
    pub fn is_valid(&self) -> bool {
        (-MAX_ASSET_AMOUNT..=MAX_ASSET_AMOUNT).contains(&self.amount)
    }

    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    fn same_symbol(&self, other: &Asset) -> Result<(), AssetError> {
        if self.symbol != other.symbol {
            return Err(AssetError::SymbolMismatch {
                left: self.symbol,
                right: other.symbol,
            });
        }
        Ok(())
    }

    fn in_range(self) -> Result<Self, AssetError> {
        if !self.is_valid() {
            return Err(AssetError::OutOfRange(self.amount.to_string()));
        }
        Ok(self)
    }

    /// Adds two assets of the same symbol. The result must stay in range.
    pub fn checked_add(&self, other: &Asset) -> Result<Asset, AssetError> {
        self.same_symbol(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| AssetError::OutOfRange(format!("{} + {}", self, other)))?;
        Asset::new(amount, self.symbol).in_range()
    }

    /// Subtracts two assets of the same symbol. The result may be negative
    /// but must stay in range; callers decide whether negative is allowed.
    pub fn checked_sub(&self, other: &Asset) -> Result<Asset, AssetError> {
        self.same_symbol(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or_else(|| AssetError::OutOfRange(format!("{} - {}", self, other)))?;
        Asset::new(amount, self.symbol).in_range()
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        let precision = self.symbol.precision();
        if precision == 0 {
            return write!(f, "{}{} {}", sign, abs, self.symbol.code());
        }
        let unit = 10u64.pow(u32::from(precision));
        write!(
            f,
            "{}{}.{:0>width$} {}",
            sign,
            abs / unit,
            abs % unit,
            self.symbol.code(),
            width = precision as usize
        )
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Asset({})", self)
    }
}

impl FromStr for Asset {
    type Err = AssetError;

    /// Parses `"100.0000 TOK"`. Precision is the number of fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || AssetError::Malformed(s.to_string());

        let (amount_str, code) = s.trim().split_once(' ').ok_or_else(malformed)?;
        let code = SymbolCode::new(code.trim())?;

        let (negative, digits) = match amount_str.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, amount_str),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty()
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !frac.bytes().all(|b| b.is_ascii_digit())
            || (digits.contains('.') && frac.is_empty())
        {
            return Err(malformed());
        }

        let precision = u8::try_from(frac.len())
            .map_err(|_| SymbolError::PrecisionTooLarge(u8::MAX))?;
        let symbol = Symbol::new(precision, code)?;

        let out_of_range = || AssetError::OutOfRange(amount_str.to_string());
        let whole: i64 = whole.parse().map_err(|_| out_of_range())?;
        let frac: i64 = if frac.is_empty() {
            0
        } else {
            frac.parse().map_err(|_| out_of_range())?
        };
        let magnitude = whole
            .checked_mul(symbol.unit())
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(out_of_range)?;
        let amount = if negative { -magnitude } else { magnitude };

        Asset::new(amount, symbol).in_range()
    }
}

macro_rules! text_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

text_serde!(SymbolCode);
text_serde!(Symbol);
text_serde!(Asset);

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(s: &str) -> Asset {
        s.parse().unwrap()
    }

    #[test]
    fn symbol_code_packs_little_endian() {
        let code = SymbolCode::new("TOK").unwrap();
        assert_eq!(code.raw(), u64::from(b'T') | u64::from(b'O') << 8 | u64::from(b'K') << 16);
        assert_eq!(code.to_string(), "TOK");
        assert_eq!(SymbolCode::from_raw(code.raw()).unwrap(), code);
    }

    #[test]
    fn symbol_code_rejects_bad_tickers() {
        assert!(SymbolCode::new("").is_err());
        assert!(SymbolCode::new("tok").is_err());
        assert!(SymbolCode::new("TOOLONGX").is_err());
        assert!(SymbolCode::new("T0K").is_err());
    }

    #[test]
    fn symbol_parses_precision_and_code() {
        let sym: Symbol = "4,TOK".parse().unwrap();
        assert_eq!(sym.precision(), 4);
        assert_eq!(sym.code().to_string(), "TOK");
        assert_eq!(sym.to_string(), "4,TOK");
        assert!("19,TOK".parse::<Symbol>().is_err());
        assert!("TOK".parse::<Symbol>().is_err());
    }

    #[test]
    fn asset_parse_infers_precision() {
        let a = tok("100.0000 TOK");
        assert_eq!(a.amount, 1_000_000);
        assert_eq!(a.symbol.precision(), 4);
        assert_eq!(a.to_string(), "100.0000 TOK");

        let whole = tok("42 SYS");
        assert_eq!(whole.amount, 42);
        assert_eq!(whole.symbol.precision(), 0);
        assert_eq!(whole.to_string(), "42 SYS");
    }

    #[test]
    fn asset_display_handles_negative_and_leading_zeros() {
        let a = tok("-0.0050 TOK");
        assert_eq!(a.amount, -50);
        assert_eq!(a.to_string(), "-0.0050 TOK");
    }

    #[test]
    fn asset_parse_rejects_garbage() {
        assert!("100.0000".parse::<Asset>().is_err());
        assert!("1.2.3 TOK".parse::<Asset>().is_err());
        assert!("abc TOK".parse::<Asset>().is_err());
        assert!("1. TOK".parse::<Asset>().is_err());
        assert!(".5 TOK".parse::<Asset>().is_err());
    }

    #[test]
    fn asset_parse_rejects_out_of_range() {
        assert!(matches!(
            "4611686018427387904 TOK".parse::<Asset>(),
            Err(AssetError::OutOfRange(_))
        ));
        assert!("4611686018427387903 TOK".parse::<Asset>().is_ok());
    }

    #[test]
    fn checked_add_and_sub_require_same_symbol() {
        let a = tok("10.0000 TOK");
        let b = tok("2.5000 TOK");
        assert_eq!(a.checked_add(&b).unwrap(), tok("12.5000 TOK"));
        assert_eq!(b.checked_sub(&a).unwrap(), tok("-7.5000 TOK"));

        let other_precision = tok("1.00 TOK");
        assert!(matches!(
            a.checked_add(&other_precision),
            Err(AssetError::SymbolMismatch { .. })
        ));
    }

    #[test]
    fn checked_add_detects_range_overflow() {
        let max = Asset::new(MAX_ASSET_AMOUNT, tok("1 TOK").symbol);
        let one = tok("1 TOK");
        assert!(matches!(max.checked_add(&one), Err(AssetError::OutOfRange(_))));
    }

    #[test]
    fn serde_uses_text_form() {
        let a = tok("7.25 USD");
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "\"7.25 USD\"");
        let back: Asset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}
