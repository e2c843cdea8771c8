//! The identity record carried by a HeptaCode.

use serde::{Deserialize, Serialize};

use crate::error::{HeptaError, Result};
use crate::types::{
    CURRENT_VERSION, EPOCH_BITS, EPOCH_MODULUS, NONCE_BITS, TAIL_LENGTH, TAIL_MAX, VERSION_BITS,
};

/// Privacy exposure level. Wire index in parentheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// (0)
    Stealth,
    /// (1)
    Standard,
    /// (2)
    Radiant,
}

impl Preset {
    pub fn index(self) -> u8 {
        match self {
            Self::Stealth => 0,
            Self::Standard => 1,
            Self::Radiant => 2,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Stealth),
            1 => Some(Self::Standard),
            2 => Some(Self::Radiant),
            _ => None,
        }
    }
}

/// Categorical identity class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vault {
    Red,
    Blue,
    Black,
}

impl Vault {
    pub fn index(self) -> u8 {
        match self {
            Self::Red => 0,
            Self::Blue => 1,
            Self::Black => 2,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Red),
            1 => Some(Self::Blue),
            2 => Some(Self::Black),
            _ => None,
        }
    }

    /// Name used in crest signing messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Black => "black",
        }
    }
}

/// Binary orientation flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    #[serde(rename = "clockwise")]
    Clockwise,
    #[serde(rename = "counter-clockwise")]
    CounterClockwise,
}

impl Rotation {
    pub fn index(self) -> u8 {
        match self {
            Self::Clockwise => 0,
            Self::CounterClockwise => 1,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Clockwise),
            1 => Some(Self::CounterClockwise),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clockwise => "clockwise",
            Self::CounterClockwise => "counter-clockwise",
        }
    }
}

/// Identity attributes packed into a HeptaCode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Payload {
    /// Protocol version, 3 bits.
    pub version: u8,
    pub preset: Preset,
    pub vault: Vault,
    pub rotation: Rotation,
    /// Four coordinates, each in `0..=59`.
    pub tail: [u8; TAIL_LENGTH],
    /// Minutes since the Unix epoch, modulo 8192.
    pub epoch: u16,
    /// 14 bits of per-encoding randomness.
    pub nonce: u16,
}

impl Payload {
    /// Build a payload at the current protocol version.
    pub fn new(
        preset: Preset,
        vault: Vault,
        rotation: Rotation,
        tail: [u8; TAIL_LENGTH],
        epoch: u16,
        nonce: u16,
    ) -> Self {
        Self {
            version: CURRENT_VERSION,
            preset,
            vault,
            rotation,
            tail,
            epoch,
            nonce,
        }
    }

    /// Build a payload stamped with the current epoch and a random nonce.
    pub fn fresh(
        preset: Preset,
        vault: Vault,
        rotation: Rotation,
        tail: [u8; TAIL_LENGTH],
    ) -> Result<Self> {
        validate_tail(&tail)?;
        Ok(Self::new(
            preset,
            vault,
            rotation,
            tail,
            epoch_now(),
            random_nonce()?,
        ))
    }

    /// Check every field against its wire width.
    pub fn validate(&self) -> Result<()> {
        if u32::from(self.version) >= 1 << VERSION_BITS {
            return Err(HeptaError::FieldOutOfRange(format!(
                "version {} exceeds {} bits",
                self.version, VERSION_BITS
            )));
        }
        validate_tail(&self.tail)?;
        if u32::from(self.epoch) >= EPOCH_MODULUS {
            return Err(HeptaError::FieldOutOfRange(format!(
                "epoch {} exceeds {} bits",
                self.epoch, EPOCH_BITS
            )));
        }
        if u32::from(self.nonce) >= 1 << NONCE_BITS {
            return Err(HeptaError::FieldOutOfRange(format!(
                "nonce {} exceeds {} bits",
                self.nonce, NONCE_BITS
            )));
        }
        Ok(())
    }

    /// Whether this payload was issued no more than `window` minutes before
    /// `current_epoch`, accounting for wrap-around.
    pub fn is_fresh(&self, current_epoch: u16, window: u16) -> bool {
        epoch_age(self.epoch, current_epoch) <= window
    }
}

/// Every tail coordinate must be in `0..=59`.
pub fn validate_tail(tail: &[u8; TAIL_LENGTH]) -> Result<()> {
    match tail.iter().position(|&t| t > TAIL_MAX) {
        Some(i) => Err(HeptaError::FieldOutOfRange(format!(
            "tail[{}] = {} exceeds {}",
            i, tail[i], TAIL_MAX
        ))),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Epoch & nonce
// ---------------------------------------------------------------------------

/// Coarse epoch for a Unix timestamp in milliseconds: minutes modulo 8192.
pub fn epoch_from_millis(ms: i64) -> u16 {
    ms.div_euclid(60_000).rem_euclid(i64::from(EPOCH_MODULUS)) as u16
}

/// Epoch for the current wall-clock time.
pub fn epoch_now() -> u16 {
    epoch_from_millis(chrono::Utc::now().timestamp_millis())
}

/// Minutes elapsed from `issued` to `current`, modulo the epoch range.
pub fn epoch_age(issued: u16, current: u16) -> u16 {
    let m = EPOCH_MODULUS;
    ((u32::from(current) % m + m - u32::from(issued) % m) % m) as u16
}

/// 14 random bits from the OS random source.
pub fn random_nonce() -> Result<u16> {
    let mut bytes = [0u8; 2];
    getrandom::getrandom(&mut bytes).map_err(|e| HeptaError::RngFailed(e.to_string()))?;
    Ok(u16::from_be_bytes(bytes) & ((1 << NONCE_BITS) - 1))
}
