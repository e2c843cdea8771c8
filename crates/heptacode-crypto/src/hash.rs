//! SHA-256 hashing helpers.

use sha2::{Digest, Sha256};

use crate::types::SHA256_LENGTH;

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> [u8; SHA256_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let mut digest = [0u8; SHA256_LENGTH];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fips_180_abc_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn hex_is_64_lowercase_chars() {
        let h = sha256_hex(b"meta-pet");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}
