//! Base-7 digits: radix conversion and arithmetic modulo 7.

use crate::error::{HeptaError, Result};
use crate::types::RADIX;

/// Multiplicative inverses mod 7, indexed by value. Zero has none.
const INVERSES: [u8; 7] = [0, 1, 4, 5, 2, 3, 6];

/// Check that every element is a base-7 digit.
pub fn validate_digits(digits: &[u8]) -> Result<()> {
    match digits.iter().position(|&d| d >= RADIX) {
        Some(index) => Err(HeptaError::InvalidDigit {
            index,
            value: u32::from(digits[index]),
        }),
        None => Ok(()),
    }
}

/// Express `value` as exactly `N` base-7 digits, least significant first.
///
/// Fails if `value` needs more than `N` digits.
pub fn to_base7<const N: usize>(mut value: u128) -> Result<[u8; N]> {
    let mut digits = [0u8; N];
    for digit in digits.iter_mut() {
        *digit = (value % u128::from(RADIX)) as u8;
        value /= u128::from(RADIX);
    }
    if value != 0 {
        return Err(HeptaError::FieldOutOfRange(format!(
            "value does not fit in {} base-7 digits",
            N
        )));
    }
    Ok(digits)
}

/// Rebuild an integer from least-significant-first base-7 digits.
pub fn from_base7(digits: &[u8]) -> Result<u128> {
    validate_digits(digits)?;
    digits.iter().rev().try_fold(0u128, |acc, &d| {
        acc.checked_mul(u128::from(RADIX))
            .and_then(|v| v.checked_add(u128::from(d)))
            .ok_or_else(|| {
                HeptaError::FieldOutOfRange(format!(
                    "{} base-7 digits overflow 128 bits",
                    digits.len()
                ))
            })
    })
}

// ---------------------------------------------------------------------------
// Arithmetic mod 7
// ---------------------------------------------------------------------------

pub fn add(a: u8, b: u8) -> u8 {
    (a % RADIX + b % RADIX) % RADIX
}

pub fn sub(a: u8, b: u8) -> u8 {
    (a % RADIX + RADIX - b % RADIX) % RADIX
}

pub fn mul(a: u8, b: u8) -> u8 {
    ((a % RADIX) * (b % RADIX)) % RADIX
}

pub fn square(a: u8) -> u8 {
    mul(a, a)
}

/// Multiplicative inverse, or `None` for zero.
pub fn inv(a: u8) -> Option<u8> {
    match a % RADIX {
        0 => None,
        v => Some(INVERSES[v as usize]),
    }
}
