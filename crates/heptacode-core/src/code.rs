//! The full pipeline: payload → 30 authenticated digits → 42-digit codeword.

use std::fmt;
use std::str::FromStr;

use heptacode_crypto::DeviceKey;

use crate::base7::validate_digits;
use crate::codec;
use crate::ecc::{self, EccInfo};
use crate::error::{HeptaError, Result};
use crate::payload::Payload;
use crate::types::{BLOCK_DIGITS, CODEWORD_DIGITS};

/// A complete 42-digit HeptaCode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeptaCode([u8; CODEWORD_DIGITS]);

impl HeptaCode {
    pub fn as_digits(&self) -> &[u8; CODEWORD_DIGITS] {
        &self.0
    }

    /// Correct and authenticate this code under `key`.
    pub fn decode(&self, key: &DeviceKey) -> Result<Decoded> {
        decode_payload(&self.0, key)
    }
}

impl TryFrom<&[u8]> for HeptaCode {
    type Error = HeptaError;

    fn try_from(digits: &[u8]) -> Result<Self> {
        let arr: [u8; CODEWORD_DIGITS] =
            digits.try_into().map_err(|_| HeptaError::InvalidLength {
                expected: CODEWORD_DIGITS,
                got: digits.len(),
            })?;
        validate_digits(&arr)?;
        Ok(Self(arr))
    }
}

/// Blocks of seven digits joined by `-`.
impl fmt::Display for HeptaCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.0.chunks(BLOCK_DIGITS).enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            for d in block {
                write!(f, "{}", d)?;
            }
        }
        Ok(())
    }
}

/// Accepts the [`Display`](fmt::Display) form; `-` and whitespace are ignored.
/// Digits 7 to 9 are `InvalidDigit`; any other character is `InvalidCharacter`.
impl FromStr for HeptaCode {
    type Err = HeptaError;

    fn from_str(s: &str) -> Result<Self> {
        let mut digits = Vec::with_capacity(CODEWORD_DIGITS);
        for c in s.chars() {
            if c == '-' || c.is_whitespace() {
                continue;
            }
            match c.to_digit(10) {
                Some(d) if d < 7 => digits.push(d as u8),
                Some(d) => {
                    return Err(HeptaError::InvalidDigit {
                        index: digits.len(),
                        value: d,
                    })
                }
                None => {
                    return Err(HeptaError::InvalidCharacter {
                        index: digits.len(),
                        found: c,
                    })
                }
            }
        }
        Self::try_from(digits.as_slice())
    }
}

/// A successfully decoded code and what it took to read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub payload: Payload,
    pub ecc: EccInfo,
}

/// Pack `payload` under `key` and add parity.
pub fn encode_payload(payload: &Payload, key: &DeviceKey) -> Result<HeptaCode> {
    let digits = codec::pack(payload, key)?;
    Ok(HeptaCode(ecc::encode(&digits)?))
}

/// Repair and authenticate a 42-digit codeword.
///
/// An uncorrectable block fails before any MAC is computed.
pub fn decode_payload(codeword: &[u8], key: &DeviceKey) -> Result<Decoded> {
    let (data, info) = ecc::decode_with_info(codeword)?;
    let payload = codec::unpack(&data, key)?;
    if info.has_errors {
        tracing::debug!(
            corrected_blocks = info.corrected_blocks,
            "decoded code after error correction"
        );
    }
    Ok(Decoded { payload, ecc: info })
}
