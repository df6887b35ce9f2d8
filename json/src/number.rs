//! JSON numbers held as their lexical text.
//!
//! Keeping the source text avoids the platform-dependent rounding that breaks round-trip
//! equality when values are held as 64-bit floats. The text is interpreted only on demand, and
//! compared either lexically (the default) or under the canonical form used by JSON Patch
//! `test`.

use std::fmt;

use wirekit_common::{ensure_attach, Result};

use crate::error::JsonError;

//
// public types
//

/// A JSON number: its source text, validated against the RFC 8259 grammar.
///
/// The derived equality is lexical: `1`, `1.0` and `10e-1` are three distinct `Number`s. Use
/// [`canonical`](Self::canonical) for numeric comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Number {
    text: String,
}

/// The canonical form of a number: sign, one leading digit, fraction, and a signed decimal
/// exponent of unbounded length.
///
/// Two numbers are numerically equal iff their canonical forms are identical. Zero is
/// canonically non-negative with exponent `0`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canonical {
    negative: bool,
    integer: String,
    fraction: String,
    exponent: String,
}

//
// Number impls
//

impl Number {
    /// Validates `text` against `-? (0 | [1-9][0-9]*) (. [0-9]+)? ([eE] [+-]? [0-9]+)?`.
    pub fn from_text(text: impl Into<String>) -> Result<Self, JsonError> {
        let text = text.into();
        ensure_attach!(is_valid_number(&text), JsonError::InvalidNumber(text.clone()));
        Ok(Self { text })
    }

    /// The number's source text.
    pub fn as_text(&self) -> &str {
        &self.text
    }

    /// The number interpreted as a double.
    pub fn as_f64(&self) -> f64 {
        self.text.parse().unwrap_or_default()
    }

    /// The number interpreted as a signed 64-bit integer.
    ///
    /// Returns `None` when the text carries a fraction or exponent, or overflows.
    pub fn as_i64(&self) -> Option<i64> {
        if self.text.contains(['.', 'e', 'E']) {
            return None;
        }
        self.text.parse().ok()
    }

    /// The canonical form used for numeric equality.
    pub fn canonical(&self) -> Canonical {
        Canonical::of(&self.text)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

//
// Canonical impls
//

impl Canonical {
    fn of(text: &str) -> Self {
        let rest = text;
        let (negative, rest) = match rest.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, rest),
        };
        let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (mut integer, rest) = (rest[..digits_end].to_owned(), &rest[digits_end..]);
        let (mut fraction, rest) = match rest.strip_prefix('.') {
            Some(rest) => {
                let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
                (rest[..end].to_owned(), &rest[end..])
            }
            None => (String::new(), rest),
        };
        let mut exponent = match rest.strip_prefix(['e', 'E']) {
            Some(rest) => {
                let (exponent_negative, digits) = match rest.strip_prefix(['+', '-']) {
                    Some(digits) => (rest.starts_with('-'), digits),
                    None => (false, rest),
                };
                let digits = digits.trim_start_matches('0');
                match (digits.is_empty(), exponent_negative) {
                    (true, _) => "0".to_owned(),
                    (false, true) => format!("-{digits}"),
                    (false, false) => digits.to_owned(),
                }
            }
            None => "0".to_owned(),
        };

        while integer.len() > 1 && integer.starts_with('0') {
            integer.remove(0);
        }

        // Shift digits until the integer part is a single digit: 0.12 -> 1.2e-1, 12.3 -> 1.23e1.
        while integer == "0" && !fraction.is_empty() {
            integer = fraction[..1].to_owned();
            fraction.remove(0);
            exponent = signed_decimal_sub(&exponent, "1");
        }
        while integer.len() > 1 {
            let last = integer.split_off(integer.len() - 1);
            fraction.insert_str(0, &last);
            exponent = signed_decimal_add(&exponent, "1");
        }
        while fraction.ends_with('0') {
            fraction.pop();
        }

        if integer == "0" && fraction.is_empty() {
            return Self { negative: false, integer, fraction, exponent: "0".to_owned() };
        }
        Self { negative, integer, fraction, exponent }
    }
}

impl fmt::Display for Canonical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        f.write_str(&self.integer)?;
        if !self.fraction.is_empty() {
            write!(f, ".{}", self.fraction)?;
        }
        if self.exponent != "0" {
            write!(f, "e{}", self.exponent)?;
        }
        Ok(())
    }
}

//
// private functions
//

fn is_valid_number(text: &str) -> bool {
    let rest = text.strip_prefix('-').unwrap_or(text);
    let rest = match rest.as_bytes() {
        [b'0', ..] => &rest[1..],
        [b'1'..=b'9', ..] => rest.trim_start_matches(|c: char| c.is_ascii_digit()),
        _ => return false,
    };
    let rest = match rest.strip_prefix('.') {
        Some(fraction) => {
            let digits = fraction.trim_start_matches(|c: char| c.is_ascii_digit());
            if digits.len() == fraction.len() {
                return false;
            }
            digits
        }
        None => rest,
    };
    let rest = match rest.strip_prefix(['e', 'E']) {
        Some(exponent) => {
            let exponent = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
            let digits = exponent.trim_start_matches(|c: char| c.is_ascii_digit());
            if digits.len() == exponent.len() {
                return false;
            }
            digits
        }
        None => rest,
    };
    rest.is_empty()
}

// The exponent arithmetic is carried out on signed decimal strings so shifts cannot overflow a
// machine integer even for absurd source exponents.

fn unsigned_decimal_add(lhs: &str, rhs: &str) -> String {
    let mut result = Vec::new();
    let mut carry = 0u32;
    let mut lhs_digits = lhs.bytes().rev();
    let mut rhs_digits = rhs.bytes().rev();
    loop {
        let (lhs_digit, rhs_digit) = (lhs_digits.next(), rhs_digits.next());
        if lhs_digit.is_none() && rhs_digit.is_none() {
            break;
        }
        let digit = carry
            + lhs_digit.map_or(0, |b| u32::from(b - b'0'))
            + rhs_digit.map_or(0, |b| u32::from(b - b'0'));
        result.push(b'0' + (digit % 10) as u8);
        carry = digit / 10;
    }
    if carry > 0 {
        result.push(b'0' + carry as u8);
    }
    result.reverse();
    String::from_utf8(result).unwrap_or_else(|_| unreachable!())
}

fn unsigned_decimal_compare(lhs: &str, rhs: &str) -> std::cmp::Ordering {
    lhs.len().cmp(&rhs.len()).then_with(|| lhs.cmp(rhs))
}

// Requires lhs >= rhs.
fn unsigned_decimal_sub(lhs: &str, rhs: &str) -> String {
    let mut result = Vec::new();
    let mut borrow = 0i32;
    let mut lhs_digits = lhs.bytes().rev();
    let mut rhs_digits = rhs.bytes().rev();
    loop {
        let lhs_digit = lhs_digits.next();
        let rhs_digit = rhs_digits.next();
        if lhs_digit.is_none() && rhs_digit.is_none() {
            break;
        }
        let mut digit = lhs_digit.map_or(0, |b| i32::from(b - b'0'))
            - rhs_digit.map_or(0, |b| i32::from(b - b'0'))
            - borrow;
        borrow = if digit < 0 {
            digit += 10;
            1
        } else {
            0
        };
        result.push(b'0' + digit as u8);
    }
    while result.len() > 1 && result.last() == Some(&b'0') {
        result.pop();
    }
    result.reverse();
    String::from_utf8(result).unwrap_or_else(|_| unreachable!())
}

pub(crate) fn signed_decimal_add(lhs: &str, rhs: &str) -> String {
    let (lhs_negative, lhs_digits) = match lhs.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, lhs),
    };
    let (rhs_negative, rhs_digits) = match rhs.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, rhs),
    };
    let signed = |negative: bool, digits: String| {
        if negative && digits != "0" {
            format!("-{digits}")
        } else {
            digits
        }
    };
    if lhs_negative == rhs_negative {
        return signed(lhs_negative, unsigned_decimal_add(lhs_digits, rhs_digits));
    }
    match unsigned_decimal_compare(lhs_digits, rhs_digits) {
        std::cmp::Ordering::Equal => "0".to_owned(),
        std::cmp::Ordering::Greater => {
            signed(lhs_negative, unsigned_decimal_sub(lhs_digits, rhs_digits))
        }
        std::cmp::Ordering::Less => {
            signed(rhs_negative, unsigned_decimal_sub(rhs_digits, lhs_digits))
        }
    }
}

pub(crate) fn signed_decimal_sub(lhs: &str, rhs: &str) -> String {
    match rhs.strip_prefix('-') {
        Some(digits) => signed_decimal_add(lhs, digits),
        None if rhs == "0" => lhs.to_owned(),
        None => signed_decimal_add(lhs, &format!("-{rhs}")),
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn grammar_accepts() {
        for text in ["0", "-0", "1", "-123", "0.5", "123.456", "-123.456e-10", "1e2", "1E+2", "20e1"] {
            assert!(Number::from_text(text).is_ok(), "{text}");
        }
    }

    #[test]
    fn grammar_rejects() {
        for text in ["", "-", "01", "+1", "1.", ".5", "1e", "1e+", "0x1", "1.2.3", "NaN", "1 "] {
            assert_matches!(
                Number::from_text(text),
                Err(err) if matches!(err.get_ref(), JsonError::InvalidNumber(_)),
                "{text}"
            );
        }
    }

    #[test]
    fn lexical_equality_is_strict() {
        let one = Number::from_text("1").unwrap();
        let one_float = Number::from_text("1.0").unwrap();
        assert_ne!(one, one_float);
        assert_eq!(one, Number::from_text("1").unwrap());
    }

    #[test]
    fn canonical_equates_numeric_forms() {
        let forms = ["1", "1.0", "10e-1", "0.1e1", "100e-2", "1e0", "1E-0"];
        let canonical = Number::from_text("1").unwrap().canonical();
        for form in forms {
            assert_eq!(Number::from_text(form).unwrap().canonical(), canonical, "{form}");
        }
        assert_ne!(Number::from_text("2").unwrap().canonical(), canonical);
    }

    #[test]
    fn canonical_shifts_digits() {
        assert_eq!(Number::from_text("12.3").unwrap().canonical().to_string(), "1.23e1");
        assert_eq!(Number::from_text("0.12").unwrap().canonical().to_string(), "1.2e-1");
        assert_eq!(Number::from_text("100").unwrap().canonical().to_string(), "1e2");
        assert_eq!(Number::from_text("0.012").unwrap().canonical().to_string(), "1.2e-2");
    }

    #[test]
    fn canonical_zero_is_unsigned() {
        let zero = Number::from_text("0").unwrap().canonical();
        for form in ["-0", "0.0", "-0.000", "0e17", "-0.0e-5"] {
            assert_eq!(Number::from_text(form).unwrap().canonical(), zero, "{form}");
        }
        assert_eq!(zero.to_string(), "0");
    }

    #[test]
    fn canonical_handles_huge_exponents() {
        let lhs = Number::from_text("1e99999999999999999999").unwrap();
        let rhs = Number::from_text("10e99999999999999999998").unwrap();
        assert_eq!(lhs.canonical(), rhs.canonical());
        let other = Number::from_text("1e99999999999999999998").unwrap();
        assert_ne!(lhs.canonical(), other.canonical());
    }

    #[test]
    fn integer_access() {
        assert_eq!(Number::from_text("42").unwrap().as_i64(), Some(42));
        assert_eq!(Number::from_text("-7").unwrap().as_i64(), Some(-7));
        assert_eq!(Number::from_text("1.5").unwrap().as_i64(), None);
        assert_eq!(Number::from_text("1e3").unwrap().as_i64(), None);
        assert_eq!(Number::from_text("99999999999999999999").unwrap().as_i64(), None);
    }

    #[test]
    fn double_access() {
        assert_eq!(Number::from_text("-123.456e-10").unwrap().as_f64(), -123.456e-10);
    }

    #[test]
    fn signed_decimal_arithmetic() {
        assert_eq!(signed_decimal_add("0", "1"), "1");
        assert_eq!(signed_decimal_add("-1", "1"), "0");
        assert_eq!(signed_decimal_add("999", "1"), "1000");
        assert_eq!(signed_decimal_sub("0", "1"), "-1");
        assert_eq!(signed_decimal_sub("-1", "1"), "-2");
        assert_eq!(signed_decimal_sub("1000", "1"), "999");
        assert_eq!(signed_decimal_add("-10", "3"), "-7");
    }
}
