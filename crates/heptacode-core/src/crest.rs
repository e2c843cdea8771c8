//! Crest: a device-signed identity attestation.
//!
//! A crest binds one-way hashes of a secret DNA string (and of its character
//! reversal) to public metadata. The DNA string itself never appears in the
//! crest.
//!
//! Signing message: `heptacode:crest:v1\0{dnaHash}\0{mirrorHash}\0{t0,t1,t2,t3}\0{vault}\0{rotation}\0{coronatedAt}`

use heptacode_crypto::{sha256_hex, tags_equal, DeviceKey, HmacSha256, KeyedMac};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{HeptaError, Result};
use crate::payload::{validate_tail, Rotation, Vault};
use crate::types::{CREST_PREFIX, CREST_SIGNATURE_LENGTH, TAIL_LENGTH};

/// Signed identity attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crest {
    pub vault: Vault,
    pub rotation: Rotation,
    pub tail: [u8; TAIL_LENGTH],
    /// Unix milliseconds at minting.
    pub coronated_at: i64,
    /// Hex SHA-256 of the DNA string.
    pub dna_hash: String,
    /// Hex SHA-256 of the DNA string reversed by character.
    pub mirror_hash: String,
    /// Hex of the first 16 bytes of the HMAC over the signing message.
    pub signature: String,
}

impl Crest {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Mint a crest stamped with the current time.
pub fn mint(
    dna: &str,
    vault: Vault,
    rotation: Rotation,
    tail: [u8; TAIL_LENGTH],
    key: &DeviceKey,
) -> Result<Crest> {
    let now = chrono::Utc::now().timestamp_millis();
    mint_with(&HmacSha256, dna, vault, rotation, tail, now, key)
}

/// Mint a crest with an explicit timestamp.
pub fn mint_at(
    dna: &str,
    vault: Vault,
    rotation: Rotation,
    tail: [u8; TAIL_LENGTH],
    coronated_at: i64,
    key: &DeviceKey,
) -> Result<Crest> {
    mint_with(&HmacSha256, dna, vault, rotation, tail, coronated_at, key)
}

/// Mint with a specific MAC backend.
pub fn mint_with(
    mac: &impl KeyedMac,
    dna: &str,
    vault: Vault,
    rotation: Rotation,
    tail: [u8; TAIL_LENGTH],
    coronated_at: i64,
    key: &DeviceKey,
) -> Result<Crest> {
    validate_tail(&tail)?;

    let dna_hash = sha256_hex(dna.as_bytes());
    let mirror: Zeroizing<String> = Zeroizing::new(dna.chars().rev().collect());
    let mirror_hash = sha256_hex(mirror.as_bytes());

    let message = build_crest_signing_message(
        &dna_hash,
        &mirror_hash,
        &tail,
        vault,
        rotation,
        coronated_at,
    );
    let signature = hex::encode(sign(mac, key, &message)?);

    Ok(Crest {
        vault,
        rotation,
        tail,
        coronated_at,
        dna_hash,
        mirror_hash,
        signature,
    })
}

/// Check a crest's signature under `key`.
///
/// Returns false for any malformed crest; never errors.
pub fn verify(crest: &Crest, key: &DeviceKey) -> bool {
    verify_with(&HmacSha256, crest, key)
}

/// [`verify`] with a specific MAC backend.
pub fn verify_with(mac: &impl KeyedMac, crest: &Crest, key: &DeviceKey) -> bool {
    (|| -> Result<bool> {
        validate_tail(&crest.tail)?;
        let received = hex::decode(&crest.signature)
            .map_err(|e| HeptaError::FieldOutOfRange(format!("signature: {}", e)))?;
        let message = build_crest_signing_message(
            &crest.dna_hash,
            &crest.mirror_hash,
            &crest.tail,
            crest.vault,
            crest.rotation,
            crest.coronated_at,
        );
        let expected = sign(mac, key, &message)?;
        Ok(tags_equal(&expected, &received))
    })()
    .unwrap_or_else(|e| {
        tracing::debug!(error = %e, "crest verification failed on malformed input");
        false
    })
}

/// Whether `dna` is the secret a crest was minted from.
pub fn matches_dna(crest: &Crest, dna: &str) -> bool {
    let mirror: Zeroizing<String> = Zeroizing::new(dna.chars().rev().collect());
    tags_equal(
        sha256_hex(dna.as_bytes()).as_bytes(),
        crest.dna_hash.as_bytes(),
    ) && tags_equal(
        sha256_hex(mirror.as_bytes()).as_bytes(),
        crest.mirror_hash.as_bytes(),
    )
}

/// Build the canonical message signed for a crest.
pub fn build_crest_signing_message(
    dna_hash: &str,
    mirror_hash: &str,
    tail: &[u8; TAIL_LENGTH],
    vault: Vault,
    rotation: Rotation,
    coronated_at: i64,
) -> Vec<u8> {
    let tail = tail
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "{}\0{}\0{}\0{}\0{}\0{}\0{}",
        CREST_PREFIX,
        dna_hash,
        mirror_hash,
        tail,
        vault.as_str(),
        rotation.as_str(),
        coronated_at
    )
    .into_bytes()
}

fn sign(
    mac: &impl KeyedMac,
    key: &DeviceKey,
    message: &[u8],
) -> Result<[u8; CREST_SIGNATURE_LENGTH]> {
    let full = mac.compute(key.as_bytes(), message)?;
    let mut truncated = [0u8; CREST_SIGNATURE_LENGTH];
    truncated.copy_from_slice(&full[..CREST_SIGNATURE_LENGTH]);
    Ok(truncated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use heptacode_crypto::ManualHmacSha256;

    const DNA: &str = "ATCGGCTAAGTC-secret";

    fn key() -> DeviceKey {
        DeviceKey::from_bytes([0x42; 32])
    }

    fn crest() -> Crest {
        mint_at(
            DNA,
            Vault::Black,
            Rotation::CounterClockwise,
            [1, 2, 3, 4],
            1_700_000_000_000,
            &key(),
        )
        .unwrap()
    }

    #[test]
    fn mint_verify_round_trip() {
        assert!(verify(&crest(), &key()));
    }

    #[test]
    fn mint_uses_current_time() {
        let before = chrono::Utc::now().timestamp_millis();
        let c = mint(DNA, Vault::Red, Rotation::Clockwise, [0; 4], &key()).unwrap();
        assert!(c.coronated_at >= before);
        assert!(verify(&c, &key()));
    }

    #[test]
    fn wrong_key_fails() {
        assert!(!verify(&crest(), &DeviceKey::from_bytes([0x43; 32])));
    }

    #[test]
    fn any_field_change_fails() {
        let base = crest();

        let mut c = base.clone();
        c.tail[0] = 5;
        assert!(!verify(&c, &key()));

        let mut c = base.clone();
        c.vault = Vault::Red;
        assert!(!verify(&c, &key()));

        let mut c = base.clone();
        c.rotation = Rotation::Clockwise;
        assert!(!verify(&c, &key()));

        let mut c = base.clone();
        c.coronated_at += 1;
        assert!(!verify(&c, &key()));

        let mut c = base.clone();
        c.dna_hash = c.mirror_hash.clone();
        assert!(!verify(&c, &key()));
    }

    #[test]
    fn hashes_are_sha256_of_dna_and_reverse() {
        let c = crest();
        assert_eq!(c.dna_hash, sha256_hex(DNA.as_bytes()));
        let reversed: String = DNA.chars().rev().collect();
        assert_eq!(c.mirror_hash, sha256_hex(reversed.as_bytes()));
        assert_ne!(c.dna_hash, c.mirror_hash);
    }

    #[test]
    fn secret_never_serialized() {
        let json = crest().to_json().unwrap();
        assert!(!json.contains(DNA));
        assert!(json.contains("\"coronatedAt\""));
        assert!(json.contains("\"dnaHash\""));
        assert!(json.contains("\"counter-clockwise\""));
    }

    #[test]
    fn json_round_trip_still_verifies() {
        let json = crest().to_json().unwrap();
        let back = Crest::from_json(&json).unwrap();
        assert_eq!(back, crest());
        assert!(verify(&back, &key()));
    }

    #[test]
    fn signature_is_16_bytes_hex() {
        assert_eq!(crest().signature.len(), 32);
    }

    #[test]
    fn malformed_signature_is_false_not_panic() {
        let mut c = crest();
        c.signature = "not-hex".to_string();
        assert!(!verify(&c, &key()));

        let mut c = crest();
        c.signature.truncate(30);
        assert!(!verify(&c, &key()));
    }

    #[test]
    fn out_of_range_tail_is_false() {
        let mut c = crest();
        c.tail[3] = 200;
        assert!(!verify(&c, &key()));
        assert!(mint_at(DNA, Vault::Red, Rotation::Clockwise, [60, 0, 0, 0], 0, &key()).is_err());
    }

    #[test]
    fn unicode_dna_reverses_by_character() {
        let c = mint_at("🐾ab", Vault::Blue, Rotation::Clockwise, [0; 4], 0, &key()).unwrap();
        assert_eq!(c.mirror_hash, sha256_hex("ba🐾".as_bytes()));
    }

    #[test]
    fn matches_dna_checks_both_hashes() {
        let c = crest();
        assert!(matches_dna(&c, DNA));
        assert!(!matches_dna(&c, "ATCG"));
    }

    #[test]
    fn backends_produce_identical_crests() {
        let manual = mint_with(
            &ManualHmacSha256,
            DNA,
            Vault::Black,
            Rotation::CounterClockwise,
            [1, 2, 3, 4],
            1_700_000_000_000,
            &key(),
        )
        .unwrap();
        assert_eq!(manual, crest());
        assert!(verify_with(&ManualHmacSha256, &crest(), &key()));
    }

    #[test]
    fn signing_message_layout() {
        let msg = build_crest_signing_message(
            "aa",
            "bb",
            &[1, 22, 3, 59],
            Vault::Blue,
            Rotation::Clockwise,
            42,
        );
        assert_eq!(
            msg,
            b"heptacode:crest:v1\0aa\0bb\x001,22,3,59\0blue\0clockwise\x0042".to_vec()
        );
    }
}
