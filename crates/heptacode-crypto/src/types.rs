/// Device key length in bytes (256 bits).
pub const DEVICE_KEY_LENGTH: usize = 32;

/// SHA-256 digest length in bytes.
pub const SHA256_LENGTH: usize = 32;

/// Untruncated HMAC-SHA256 tag length in bytes.
pub const MAC_OUTPUT_LENGTH: usize = 32;

/// SHA-256 internal block size, used by the HMAC pads.
pub const SHA256_BLOCK_SIZE: usize = 64;
