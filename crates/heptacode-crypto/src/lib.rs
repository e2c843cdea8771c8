//! Cryptographic primitives for HeptaCode: keyed-MAC strategies, SHA-256,
//! and the device key lifecycle.

pub mod device_key;
pub mod error;
pub mod hash;
pub mod key_store;
pub mod mac;
pub mod types;

pub use device_key::DeviceKey;
pub use error::CryptoError;
pub use hash::{sha256, sha256_hex};
pub use key_store::{DeviceKeyProvider, FileKeyStore, KeyStore, MemoryKeyStore};
pub use mac::{tags_equal, HmacSha256, KeyedMac, ManualHmacSha256};
pub use types::{DEVICE_KEY_LENGTH, MAC_OUTPUT_LENGTH, SHA256_LENGTH};
