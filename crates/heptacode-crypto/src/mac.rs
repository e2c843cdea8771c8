//! Keyed-MAC strategies.
//!
//! Callers depend only on [`KeyedMac`]: some function of `(key, message)`
//! producing a 32-byte tag. Two interchangeable HMAC-SHA256 backends are
//! provided and produce bit-identical output:
//!
//! - [`HmacSha256`] uses the `hmac` crate.
//! - [`ManualHmacSha256`] builds RFC 2104 inner/outer pads over a bare SHA-256,
//!   for hosts that only expose a hash primitive.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::hash::sha256;
use crate::types::{MAC_OUTPUT_LENGTH, SHA256_BLOCK_SIZE};

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

/// A keyed message-authentication function.
pub trait KeyedMac: Send + Sync {
    /// Compute the untruncated tag of `message` under `key`.
    fn compute(&self, key: &[u8], message: &[u8]) -> Result<[u8; MAC_OUTPUT_LENGTH], CryptoError>;

    /// Algorithm name, for logs.
    fn algorithm(&self) -> &'static str;
}

/// HMAC-SHA256 backed by the `hmac` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha256;

impl KeyedMac for HmacSha256 {
    fn compute(&self, key: &[u8], message: &[u8]) -> Result<[u8; MAC_OUTPUT_LENGTH], CryptoError> {
        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key)
            .map_err(|e| CryptoError::MacFailed(e.to_string()))?;
        mac.update(message);
        let mut tag = [0u8; MAC_OUTPUT_LENGTH];
        tag.copy_from_slice(&mac.finalize().into_bytes());
        Ok(tag)
    }

    fn algorithm(&self) -> &'static str {
        "HMAC-SHA256"
    }
}

/// HMAC-SHA256 assembled by hand from SHA-256.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualHmacSha256;

impl KeyedMac for ManualHmacSha256 {
    fn compute(&self, key: &[u8], message: &[u8]) -> Result<[u8; MAC_OUTPUT_LENGTH], CryptoError> {
        // Keys longer than one block are hashed first (RFC 2104 section 2).
        let mut block = Zeroizing::new([0u8; SHA256_BLOCK_SIZE]);
        if key.len() > SHA256_BLOCK_SIZE {
            let digest = Zeroizing::new(sha256(key));
            block[..digest.len()].copy_from_slice(&digest[..]);
        } else {
            block[..key.len()].copy_from_slice(key);
        }

        let inner_pad = Zeroizing::new((*block).map(|b| b ^ IPAD));
        let outer_pad = Zeroizing::new((*block).map(|b| b ^ OPAD));

        let mut inner = Sha256::new();
        inner.update(&inner_pad[..]);
        inner.update(message);
        let inner_hash = inner.finalize();

        let mut outer = Sha256::new();
        outer.update(&outer_pad[..]);
        outer.update(inner_hash);
        let mut tag = [0u8; MAC_OUTPUT_LENGTH];
        tag.copy_from_slice(&outer.finalize());
        Ok(tag)
    }

    fn algorithm(&self) -> &'static str {
        "HMAC-SHA256 (manual)"
    }
}

/// Constant-time equality for byte tags of any length.
///
/// Length mismatch returns false immediately; lengths are public.
pub fn tags_equal(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}
