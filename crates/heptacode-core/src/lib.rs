//! HeptaCode core: payload packing, base-7 error correction, and crest attestation.

pub mod base7;
pub mod bits;
pub mod code;
pub mod codec;
pub mod crest;
pub mod ecc;
pub mod error;
pub mod payload;
pub mod types;

pub use code::{decode_payload, encode_payload, Decoded, HeptaCode};
pub use codec::{pack, unpack, Codec};
pub use crest::{
    build_crest_signing_message, matches_dna, mint, mint_at, mint_with, verify, verify_with, Crest,
};
pub use ecc::{ecc_info, EccInfo};
pub use error::{ErrorKind, HeptaError, Result};
pub use payload::{
    epoch_age, epoch_from_millis, epoch_now, random_nonce, Payload, Preset, Rotation, Vault,
};
pub use types::{CODEWORD_DIGITS, CURRENT_VERSION, PAYLOAD_DIGITS};

pub use heptacode_crypto::DeviceKey;
