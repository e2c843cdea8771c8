//! Protocol constants for HeptaCode version 1.
//!
//! Bit layout of the authenticated payload, most significant first:
//!
//! ```text
//! version:3 | preset:2 | vault:2 | rotation:1 | tail:4x6 | epoch:13 | nonce:14 | mac:25
//! ```
//!
//! 84 bits total, which fits under 7^30 (about 2^84.22). Any change to these
//! widths needs a new version value.

/// Version written by this implementation.
pub const CURRENT_VERSION: u8 = 1;

/// Versions accepted on decode.
pub const SUPPORTED_VERSIONS: &[u8] = &[1];

pub const VERSION_BITS: u32 = 3;
pub const PRESET_BITS: u32 = 2;
pub const VAULT_BITS: u32 = 2;
pub const ROTATION_BITS: u32 = 1;
pub const TAIL_BITS: u32 = 6;
pub const TAIL_LENGTH: usize = 4;
pub const EPOCH_BITS: u32 = 13;
pub const NONCE_BITS: u32 = 14;
pub const MAC_BITS: u32 = 25;

/// Largest legal tail coordinate.
pub const TAIL_MAX: u8 = 59;

/// Payload bits before the MAC is appended.
pub const DATA_BITS: u32 = VERSION_BITS
    + PRESET_BITS
    + VAULT_BITS
    + ROTATION_BITS
    + TAIL_BITS * TAIL_LENGTH as u32
    + EPOCH_BITS
    + NONCE_BITS;

/// Payload plus MAC.
pub const AUTHENTICATED_BITS: u32 = DATA_BITS + MAC_BITS;

/// Epoch values wrap at this modulus (minutes).
pub const EPOCH_MODULUS: u32 = 1 << EPOCH_BITS;

/// Base of the wire alphabet.
pub const RADIX: u8 = 7;

/// Digits produced by the codec.
pub const PAYLOAD_DIGITS: usize = 30;

/// Data digits per ECC block.
pub const BLOCK_DATA_DIGITS: usize = 5;

/// Parity digits per ECC block.
pub const BLOCK_PARITY_DIGITS: usize = 2;

pub const BLOCK_DIGITS: usize = BLOCK_DATA_DIGITS + BLOCK_PARITY_DIGITS;

pub const BLOCK_COUNT: usize = PAYLOAD_DIGITS / BLOCK_DATA_DIGITS;

/// Digits in a full ECC codeword.
pub const CODEWORD_DIGITS: usize = BLOCK_COUNT * BLOCK_DIGITS;

/// Bytes of HMAC output kept as a crest signature.
pub const CREST_SIGNATURE_LENGTH: usize = 16;

/// Domain prefix for crest signing messages (null-byte separated fields).
pub const CREST_PREFIX: &str = "heptacode:crest:v1";

const _: () = assert!(DATA_BITS == 59);
const _: () = assert!(AUTHENTICATED_BITS <= 84);
const _: () = assert!(CODEWORD_DIGITS == 42);
