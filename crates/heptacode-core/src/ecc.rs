//! Dual-parity error correction over base-7 digits.
//!
//! Each 5-digit data block gains two parity digits:
//!
//! ```text
//! parityA = Σ dᵢ   mod 7
//! parityB = Σ dᵢ²  mod 7
//! ```
//!
//! 30 data digits become 42 (six blocks of `[d0..d4, parityA, parityB]`).
//! A block with one altered digit is repaired when the syndrome identifies it
//! unambiguously; otherwise the whole codeword is rejected.
//!
//! Both parities are symmetric in the data digits, so the faulty position is
//! located by value, not by index. When the received value occurs twice in a
//! block, or when a parityA error and a data error explain the syndrome
//! equally well, the block is uncorrectable.

use serde::{Deserialize, Serialize};

use crate::base7::{add, inv, mul, square, sub, validate_digits};
use crate::error::{HeptaError, Result};
use crate::types::{
    BLOCK_COUNT, BLOCK_DATA_DIGITS, BLOCK_DIGITS, CODEWORD_DIGITS, PAYLOAD_DIGITS,
};

const PARITY_A: usize = BLOCK_DATA_DIGITS;
const PARITY_B: usize = BLOCK_DATA_DIGITS + 1;

/// Diagnostic summary of a codeword, for telemetry and UX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EccInfo {
    pub has_errors: bool,
    pub corrected_blocks: usize,
    pub uncorrectable_blocks: usize,
    pub total_blocks: usize,
}

impl EccInfo {
    fn clean() -> Self {
        Self {
            has_errors: false,
            corrected_blocks: 0,
            uncorrectable_blocks: 0,
            total_blocks: BLOCK_COUNT,
        }
    }

    fn malformed() -> Self {
        Self {
            has_errors: true,
            corrected_blocks: 0,
            uncorrectable_blocks: 0,
            total_blocks: BLOCK_COUNT,
        }
    }
}

/// Result of checking one 7-digit block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    Clean,
    /// One digit was repaired. Positions 5 and 6 are the parity digits.
    Corrected { position: usize },
    Uncorrectable,
}

/// `(Σd, Σd²) mod 7` over a block's data digits.
pub fn parities(data: &[u8]) -> (u8, u8) {
    data.iter()
        .fold((0, 0), |(a, b), &d| (add(a, d), add(b, square(d))))
}

/// Expand 30 data digits into a 42-digit codeword.
pub fn encode(data: &[u8]) -> Result<[u8; CODEWORD_DIGITS]> {
    if data.len() != PAYLOAD_DIGITS {
        return Err(HeptaError::InvalidLength {
            expected: PAYLOAD_DIGITS,
            got: data.len(),
        });
    }
    validate_digits(data)?;

    let mut codeword = [0u8; CODEWORD_DIGITS];
    for (chunk, block) in data
        .chunks_exact(BLOCK_DATA_DIGITS)
        .zip(codeword.chunks_exact_mut(BLOCK_DIGITS))
    {
        let (a, b) = parities(chunk);
        block[..BLOCK_DATA_DIGITS].copy_from_slice(chunk);
        block[PARITY_A] = a;
        block[PARITY_B] = b;
    }
    Ok(codeword)
}

/// Contract a 42-digit codeword to its 30 data digits, repairing at most one
/// digit per block.
///
/// Any uncorrectable block fails the whole codeword; no partial data is
/// returned.
pub fn decode(codeword: &[u8]) -> Result<[u8; PAYLOAD_DIGITS]> {
    decode_with_info(codeword).map(|(data, _)| data)
}

/// [`decode`], also reporting how many blocks were repaired.
pub fn decode_with_info(codeword: &[u8]) -> Result<([u8; PAYLOAD_DIGITS], EccInfo)> {
    if codeword.len() != CODEWORD_DIGITS {
        return Err(HeptaError::InvalidLength {
            expected: CODEWORD_DIGITS,
            got: codeword.len(),
        });
    }
    validate_digits(codeword)?;

    let mut data = [0u8; PAYLOAD_DIGITS];
    let mut info = EccInfo::clean();
    for (index, (received, out)) in codeword
        .chunks_exact(BLOCK_DIGITS)
        .zip(data.chunks_exact_mut(BLOCK_DATA_DIGITS))
        .enumerate()
    {
        let mut block = to_block(received);
        match correct_block(&mut block) {
            BlockOutcome::Clean => {}
            BlockOutcome::Corrected { position } => {
                tracing::debug!(block = index, position, "corrected single-digit error");
                info.corrected_blocks += 1;
            }
            BlockOutcome::Uncorrectable => {
                tracing::warn!(block = index, "uncorrectable block");
                return Err(HeptaError::Uncorrectable { block: index });
            }
        }
        out.copy_from_slice(&block[..BLOCK_DATA_DIGITS]);
    }
    info.has_errors = info.corrected_blocks > 0;
    Ok((data, info))
}

/// Run the correction logic and report counts instead of data.
///
/// Never fails: malformed input reports `has_errors` with all six blocks.
pub fn ecc_info(codeword: &[u8]) -> EccInfo {
    if codeword.len() != CODEWORD_DIGITS || validate_digits(codeword).is_err() {
        return EccInfo::malformed();
    }

    let mut info = EccInfo::clean();
    for received in codeword.chunks_exact(BLOCK_DIGITS) {
        match correct_block(&mut to_block(received)) {
            BlockOutcome::Clean => {}
            BlockOutcome::Corrected { .. } => info.corrected_blocks += 1,
            BlockOutcome::Uncorrectable => info.uncorrectable_blocks += 1,
        }
    }
    info.has_errors = info.corrected_blocks + info.uncorrectable_blocks > 0;
    info
}

/// Check one block and repair it in place when exactly one digit can be
/// blamed.
///
/// Syndromes are `diffA = recvA − compA` and `diffB = recvB − compB`. A data
/// digit received as `r` but sent as `r − e` gives `diffA = −e` and
/// `diffB = e² − 2re`, so `r = (e² − diffB)·(2e)⁻¹`.
pub fn correct_block(block: &mut [u8; BLOCK_DIGITS]) -> BlockOutcome {
    let (computed_a, computed_b) = parities(&block[..BLOCK_DATA_DIGITS]);
    let diff_a = sub(block[PARITY_A], computed_a);
    let diff_b = sub(block[PARITY_B], computed_b);

    if diff_a == 0 {
        if diff_b == 0 {
            return BlockOutcome::Clean;
        }
        // A data error always moves parityA, so only parityB can be wrong.
        block[PARITY_B] = computed_b;
        return BlockOutcome::Corrected { position: PARITY_B };
    }

    let e = sub(0, diff_a);
    let inv_2e = match inv(mul(2, e)) {
        Some(v) => v,
        None => return BlockOutcome::Uncorrectable,
    };
    let r = mul(sub(square(e), diff_b), inv_2e);

    let mut candidates = (0..BLOCK_DATA_DIGITS).filter(|&i| block[i] == r);
    let first = candidates.next();
    let ambiguous = candidates.next().is_some();

    if diff_b == 0 {
        // parityA alone being wrong explains this syndrome. A data digit
        // holding `r` would explain it too.
        if first.is_some() {
            return BlockOutcome::Uncorrectable;
        }
        block[PARITY_A] = computed_a;
        return BlockOutcome::Corrected { position: PARITY_A };
    }

    let position = match (first, ambiguous) {
        (Some(p), false) => p,
        _ => return BlockOutcome::Uncorrectable,
    };

    let original = block[position];
    block[position] = sub(r, e);
    if parities(&block[..BLOCK_DATA_DIGITS]) != (block[PARITY_A], block[PARITY_B]) {
        block[position] = original;
        return BlockOutcome::Uncorrectable;
    }
    BlockOutcome::Corrected { position }
}

fn to_block(digits: &[u8]) -> [u8; BLOCK_DIGITS] {
    let mut block = [0u8; BLOCK_DIGITS];
    block.copy_from_slice(digits);
    block
}
