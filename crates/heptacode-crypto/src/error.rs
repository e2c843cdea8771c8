use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("MAC computation failed: {0}")]
    MacFailed(String),

    #[error("Random number generation failed: {0}")]
    RngFailed(String),

    #[error("Malformed stored key: {0}")]
    MalformedStoredKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
