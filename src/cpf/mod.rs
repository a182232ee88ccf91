//! CPF (Cadastro de Pessoas Físicas) checksum validation.
//!
//! A CPF is 11 decimal digits where the last two are check digits computed
//! from the preceding ones with a weighted sum modulo 11. Input may carry
//! formatting (`111.444.777-35`); every non-ASCII-digit character is dropped
//! before checking.
//!
//! [`is_valid`] is the only entry point handlers should call. [`Cpf::parse`]
//! keeps the rejection reason around for tests and logs, but callers must not
//! surface it: wrong length, repeated digits and checksum mismatch are all
//! just "invalid" to the outside.

use std::{fmt, str::FromStr};
use thiserror::Error;

/// Number of digits in a normalized CPF.
pub const CPF_LENGTH: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CpfError {
    #[error("expected 11 digits, found {0}")]
    Length(usize),
    #[error("all digits are identical")]
    RepeatedDigits,
    #[error("check digit at position {position} does not match")]
    CheckDigit { position: usize },
}

/// A structurally valid CPF, stored as its 11 digit values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cpf([u8; CPF_LENGTH]);

impl Cpf {
    /// Normalize and checksum `raw`.
    ///
    /// # Errors
    /// Returns the first guard that rejected the input.
    pub fn parse(raw: &str) -> Result<Self, CpfError> {
        let digits: Vec<u8> = raw
            .bytes()
            .filter(u8::is_ascii_digit)
            .map(|b| b - b'0')
            .collect();

        let digits: [u8; CPF_LENGTH] = digits
            .as_slice()
            .try_into()
            .map_err(|_| CpfError::Length(digits.len()))?;

        if digits.iter().all(|&d| d == digits[0]) {
            return Err(CpfError::RepeatedDigits);
        }

        for position in [9, 10] {
            if check_digit(&digits[..position]) != digits[position] {
                return Err(CpfError::CheckDigit { position });
            }
        }

        Ok(Self(digits))
    }

    /// Render as `XXX.XXX.XXX-XX`.
    #[must_use]
    pub fn formatted(&self) -> String {
        let s = self.to_string();
        format!("{}.{}.{}-{}", &s[0..3], &s[3..6], &s[6..9], &s[9..11])
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in self.0 {
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

impl FromStr for Cpf {
    type Err = CpfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Weights run from 2 at the last digit upward, so the same routine serves
/// both the 9-digit and the 10-digit prefix.
fn check_digit(prefix: &[u8]) -> u8 {
    let sum: u32 = prefix
        .iter()
        .rev()
        .zip(2u32..)
        .map(|(&d, weight)| u32::from(d) * weight)
        .sum();

    match (sum * 10) % 11 {
        10 => 0,
        // remainder of 11 is always < 11
        r => u8::try_from(r).unwrap_or_default(),
    }
}

/// Strip everything that is not an ASCII digit.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// `true` iff `raw` normalizes to a structurally valid CPF.
#[must_use]
pub fn is_valid(raw: &str) -> bool {
    Cpf::parse(raw).is_ok()
}
