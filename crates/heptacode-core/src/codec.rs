//! Payload ⇄ 30 authenticated base-7 digits.
//!
//! Format: the 59 payload bits (see [`crate::types`]) followed by a 25-bit
//! truncated MAC over those bits, read as one integer and written as 30
//! base-7 digits, least significant first.

use heptacode_crypto::{tags_equal, DeviceKey, HmacSha256, KeyedMac};

use crate::base7::{from_base7, to_base7};
use crate::bits::{low_mask, BitReader, BitWriter};
use crate::error::{HeptaError, Result};
use crate::payload::{Payload, Preset, Rotation, Vault};
use crate::types::{
    AUTHENTICATED_BITS, DATA_BITS, EPOCH_BITS, MAC_BITS, NONCE_BITS, PAYLOAD_DIGITS, PRESET_BITS,
    ROTATION_BITS, SUPPORTED_VERSIONS, TAIL_BITS, TAIL_MAX, VAULT_BITS, VERSION_BITS,
};

/// Packs and unpacks payloads with a pluggable MAC backend.
#[derive(Debug, Clone, Default)]
pub struct Codec<M: KeyedMac = HmacSha256> {
    mac: M,
}

impl<M: KeyedMac> Codec<M> {
    pub fn new(mac: M) -> Self {
        Self { mac }
    }

    /// Encode `payload` into 30 digits authenticated under `key`.
    ///
    /// Deterministic: the only randomness is whatever the caller put in
    /// `payload.nonce`.
    pub fn pack(&self, payload: &Payload, key: &DeviceKey) -> Result<[u8; PAYLOAD_DIGITS]> {
        payload.validate()?;
        let data = data_bits(payload)?;
        let tag = self.tag(data, key)?;
        let value = (u128::from(data) << MAC_BITS) | u128::from(tag);
        to_base7(value)
    }

    /// Decode and authenticate 30 digits.
    ///
    /// Checks run cheapest first: shape, digit range, integer range,
    /// version, MAC, then field values.
    pub fn unpack(&self, digits: &[u8], key: &DeviceKey) -> Result<Payload> {
        if digits.len() != PAYLOAD_DIGITS {
            return Err(HeptaError::InvalidLength {
                expected: PAYLOAD_DIGITS,
                got: digits.len(),
            });
        }
        let value = from_base7(digits)?;
        if value >> AUTHENTICATED_BITS != 0 {
            return Err(HeptaError::FieldOutOfRange(format!(
                "decoded integer exceeds {} bits",
                AUTHENTICATED_BITS
            )));
        }

        let data = (value >> MAC_BITS) as u64;
        let received_tag = (value & low_mask(MAC_BITS)) as u32;

        let version = (data >> (DATA_BITS - VERSION_BITS)) as u8;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(HeptaError::UnsupportedVersion(version));
        }

        let expected_tag = self.tag(data, key)?;
        if !tags_equal(&expected_tag.to_be_bytes(), &received_tag.to_be_bytes()) {
            tracing::debug!(
                algorithm = self.mac.algorithm(),
                version,
                "payload MAC mismatch"
            );
            return Err(HeptaError::AuthenticationFailed);
        }

        parse_fields(data)
    }

    fn tag(&self, data: u64, key: &DeviceKey) -> Result<u32> {
        let full = self.mac.compute(key.as_bytes(), &data.to_be_bytes())?;
        let head = u32::from_be_bytes([full[0], full[1], full[2], full[3]]);
        Ok(head >> (u32::BITS - MAC_BITS))
    }
}

/// [`Codec::pack`] with HMAC-SHA256.
pub fn pack(payload: &Payload, key: &DeviceKey) -> Result<[u8; PAYLOAD_DIGITS]> {
    Codec::<HmacSha256>::default().pack(payload, key)
}

/// [`Codec::unpack`] with HMAC-SHA256.
pub fn unpack(digits: &[u8], key: &DeviceKey) -> Result<Payload> {
    Codec::<HmacSha256>::default().unpack(digits, key)
}

fn data_bits(payload: &Payload) -> Result<u64> {
    let mut w = BitWriter::new();
    w.push("version", payload.version.into(), VERSION_BITS)?;
    w.push("preset", payload.preset.index().into(), PRESET_BITS)?;
    w.push("vault", payload.vault.index().into(), VAULT_BITS)?;
    w.push("rotation", payload.rotation.index().into(), ROTATION_BITS)?;
    for t in payload.tail {
        w.push("tail", t.into(), TAIL_BITS)?;
    }
    w.push("epoch", payload.epoch.into(), EPOCH_BITS)?;
    w.push("nonce", payload.nonce.into(), NONCE_BITS)?;
    debug_assert_eq!(w.len(), DATA_BITS);
    Ok(w.finish() as u64)
}

fn parse_fields(data: u64) -> Result<Payload> {
    let mut r = BitReader::new(u128::from(data), DATA_BITS);
    let version = r.take(VERSION_BITS) as u8;
    let preset_index = r.take(PRESET_BITS) as u8;
    let vault_index = r.take(VAULT_BITS) as u8;
    let rotation_index = r.take(ROTATION_BITS) as u8;
    let mut tail = [0u8; 4];
    for t in tail.iter_mut() {
        *t = r.take(TAIL_BITS) as u8;
    }
    let epoch = r.take(EPOCH_BITS) as u16;
    let nonce = r.take(NONCE_BITS) as u16;

    let preset = Preset::from_index(preset_index)
        .ok_or_else(|| out_of_range("preset", preset_index))?;
    let vault =
        Vault::from_index(vault_index).ok_or_else(|| out_of_range("vault", vault_index))?;
    let rotation = Rotation::from_index(rotation_index)
        .ok_or_else(|| out_of_range("rotation", rotation_index))?;
    if let Some(&bad) = tail.iter().find(|&&t| t > TAIL_MAX) {
        return Err(out_of_range("tail", bad));
    }

    Ok(Payload {
        version,
        preset,
        vault,
        rotation,
        tail,
        epoch,
        nonce,
    })
}

fn out_of_range(field: &str, index: u8) -> HeptaError {
    HeptaError::FieldOutOfRange(format!("{} index {} is not defined", field, index))
}
