//! End-to-end tests: payload → code → (damage) → payload, plus crest minting
//! with a provisioned device key.

use heptacode_core::{
    decode_payload, ecc_info, encode_payload, mint, pack, unpack, verify, DeviceKey, ErrorKind,
    HeptaCode, Payload, Preset, Rotation, Vault,
};
use heptacode_crypto::{DeviceKeyProvider, MemoryKeyStore};

// ============================================================================
// Fixtures
// ============================================================================

const CODE: [u8; 42] = [
    6, 3, 5, 4, 6, 3, 3, 5, 0, 0, 6, 5, 2, 2, 1, 2, 2, 3, 1, 2, 5, 1, 5, 2, 6, 3, 3, 5, 1, 2, 0,
    0, 3, 6, 0, 2, 3, 6, 6, 0, 3, 1,
];

fn key() -> DeviceKey {
    DeviceKey::from_bytes([0x42; 32])
}

fn sample() -> Payload {
    Payload::new(
        Preset::Standard,
        Vault::Blue,
        Rotation::Clockwise,
        [10, 20, 30, 40],
        4096,
        8192,
    )
}

// ============================================================================
// Pipeline
// ============================================================================

#[test]
fn encode_is_pinned() {
    assert_eq!(encode_payload(&sample(), &key()).unwrap().as_digits(), &CODE);
}

#[test]
fn damaged_third_block_is_repaired() {
    let mut damaged = CODE;
    damaged[17] = 5;

    let info = ecc_info(&damaged);
    assert!(info.has_errors);
    assert_eq!(info.corrected_blocks, 1);
    assert_eq!(info.uncorrectable_blocks, 0);

    let decoded = decode_payload(&damaged, &key()).unwrap();
    assert_eq!(decoded.payload, sample());
}

#[test]
fn two_errors_in_one_block_are_never_accepted() {
    for p1 in 14..21 {
        for p2 in (p1 + 1)..21 {
            for v1 in 0..7u8 {
                for v2 in 0..7u8 {
                    if v1 == CODE[p1] || v2 == CODE[p2] {
                        continue;
                    }
                    let mut damaged = CODE;
                    damaged[p1] = v1;
                    damaged[p2] = v2;
                    let err = decode_payload(&damaged, &key()).unwrap_err();
                    assert!(
                        matches!(err.kind(), ErrorKind::Uncorrectable | ErrorKind::Authentication),
                        "({}, {}) -> ({}, {}) gave {:?}",
                        p1,
                        p2,
                        v1,
                        v2,
                        err
                    );
                }
            }
        }
    }
}

#[test]
fn codes_are_bound_to_their_key() {
    let alice = DeviceKey::from_bytes([1; 32]);
    let bob = DeviceKey::from_bytes([2; 32]);
    let code = encode_payload(&sample(), &alice).unwrap();

    assert_eq!(code.decode(&alice).unwrap().payload, sample());
    assert_eq!(
        code.decode(&bob).unwrap_err().kind(),
        ErrorKind::Authentication
    );
}

#[test]
fn text_form_survives_transport() {
    let code = encode_payload(&sample(), &key()).unwrap();
    let text = code.to_string();
    let back: HeptaCode = text.parse().unwrap();
    assert_eq!(back.decode(&key()).unwrap().payload, sample());
}

#[test]
fn fresh_payloads_round_trip() {
    for _ in 0..16 {
        let p = Payload::fresh(
            Preset::Radiant,
            Vault::Black,
            Rotation::CounterClockwise,
            [59, 0, 17, 42],
        )
        .unwrap();
        let digits = pack(&p, &key()).unwrap();
        assert_eq!(unpack(&digits, &key()).unwrap(), p);
    }
}

// ============================================================================
// Device key provider
// ============================================================================

#[tokio::test]
async fn provisioned_key_drives_codes_and_crests() {
    let provider = DeviceKeyProvider::new(MemoryKeyStore::new());
    let device_key = provider.get().await.unwrap();

    let code = encode_payload(&sample(), &device_key).unwrap();
    let again = provider.get().await.unwrap();
    assert_eq!(code.decode(&again).unwrap().payload, sample());

    let crest = mint(
        "GATTACA",
        Vault::Red,
        Rotation::Clockwise,
        [1, 2, 3, 4],
        &device_key,
    )
    .unwrap();
    assert!(verify(&crest, &again));
    assert!(!verify(&crest, &key()));
}
