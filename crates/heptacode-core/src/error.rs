use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeptaError {
    #[error("Invalid length: expected {expected} digits, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Invalid digit {value} at index {index}: must be in 0..=6")]
    InvalidDigit { index: usize, value: u32 },

    #[error("Invalid character {found:?} at digit {index}")]
    InvalidCharacter { index: usize, found: char },

    #[error("Field out of range: {0}")]
    FieldOutOfRange(String),

    #[error("Unsupported payload version: {0}")]
    UnsupportedVersion(u8),

    /// Tampering, corruption beyond ECC capacity, or the wrong key. These are
    /// deliberately reported the same way.
    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Uncorrectable corruption in block {block}")]
    Uncorrectable { block: usize },

    #[error("Random number generation failed: {0}")]
    RngFailed(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] heptacode_crypto::CryptoError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse failure category, for callers deciding between "rescan" and "reject".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong length, bad digit, or a field that cannot be represented.
    Malformed,
    Authentication,
    Uncorrectable,
    UnsupportedVersion,
    /// Host-level faults: RNG, MAC primitive, serialization.
    Internal,
}

impl HeptaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidLength { .. }
            | Self::InvalidDigit { .. }
            | Self::InvalidCharacter { .. }
            | Self::FieldOutOfRange(_) => ErrorKind::Malformed,
            Self::UnsupportedVersion(_) => ErrorKind::UnsupportedVersion,
            Self::AuthenticationFailed => ErrorKind::Authentication,
            Self::Uncorrectable { .. } => ErrorKind::Uncorrectable,
            Self::RngFailed(_) | Self::Crypto(_) | Self::Json(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, HeptaError>;
