//! Device-scoped symmetric key material.

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;
use crate::types::DEVICE_KEY_LENGTH;

/// 256-bit device key used for payload MACs and crest signatures.
///
/// Zeroized on drop. `Debug` never prints the bytes; equality is constant-time.
#[derive(Clone, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DeviceKey {
    bytes: [u8; DEVICE_KEY_LENGTH],
}

impl DeviceKey {
    /// Wrap raw key bytes.
    pub const fn from_bytes(bytes: [u8; DEVICE_KEY_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Generate a fresh key from the OS random source.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut bytes = [0u8; DEVICE_KEY_LENGTH];
        getrandom::getrandom(&mut bytes).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
        Ok(Self { bytes })
    }

    /// Copy a key out of a slice, which must be exactly 32 bytes.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, CryptoError> {
        if slice.len() != DEVICE_KEY_LENGTH {
            return Err(CryptoError::InvalidKeyLength {
                expected: DEVICE_KEY_LENGTH,
                got: slice.len(),
            });
        }
        let mut bytes = [0u8; DEVICE_KEY_LENGTH];
        bytes.copy_from_slice(slice);
        Ok(Self { bytes })
    }

    /// Parse the lowercase or uppercase hex form written by [`DeviceKey::to_hex`].
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let decoded = Zeroizing::new(
            hex::decode(s).map_err(|e| CryptoError::MalformedStoredKey(e.to_string()))?,
        );
        Self::try_from_slice(&decoded)
    }

    /// Hex encoding, zeroized when dropped.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.bytes))
    }

    pub fn as_bytes(&self) -> &[u8; DEVICE_KEY_LENGTH] {
        &self.bytes
    }
}

impl PartialEq for DeviceKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes[..].ct_eq(&other.bytes[..]).into()
    }
}

impl std::fmt::Debug for DeviceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceKey").finish_non_exhaustive()
    }
}
