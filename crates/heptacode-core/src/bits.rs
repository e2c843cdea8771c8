//! Fixed-width bit-field packing into a `u128`.
//!
//! Fields are appended most-significant first, so the first field written
//! ends up in the highest bits.

use crate::error::{HeptaError, Result};

/// Appends fixed-width fields to a wide integer.
#[derive(Debug, Default, Clone, Copy)]
pub struct BitWriter {
    value: u128,
    len: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` as a `width`-bit field.
    ///
    /// `name` only appears in the error when the value does not fit.
    pub fn push(&mut self, name: &str, value: u64, width: u32) -> Result<()> {
        debug_assert!(width > 0 && width <= 64);
        if self.len + width > u128::BITS {
            return Err(HeptaError::FieldOutOfRange(format!(
                "{}: bit-field overflow at {} bits",
                name, self.len
            )));
        }
        if width < 64 && value >> width != 0 {
            return Err(HeptaError::FieldOutOfRange(format!(
                "{} = {} does not fit in {} bits",
                name, value, width
            )));
        }
        self.value = (self.value << width) | u128::from(value);
        self.len += width;
        Ok(())
    }

    /// Number of bits written so far.
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn finish(self) -> u128 {
        self.value
    }
}

/// Reads fields back in the order [`BitWriter`] wrote them.
#[derive(Debug, Clone, Copy)]
pub struct BitReader {
    value: u128,
    remaining: u32,
}

impl BitReader {
    /// Wrap a `total_bits`-wide field set.
    pub fn new(value: u128, total_bits: u32) -> Self {
        Self {
            value,
            remaining: total_bits,
        }
    }

    /// Take the next `width` bits. Reading past the end yields zero bits.
    pub fn take(&mut self, width: u32) -> u64 {
        debug_assert!(width > 0 && width <= 64);
        let width = width.min(self.remaining);
        if width == 0 {
            return 0;
        }
        self.remaining -= width;
        let mask = (1u128 << width) - 1;
        ((self.value >> self.remaining) & mask) as u64
    }
}

/// Mask with the low `width` bits set.
pub fn low_mask(width: u32) -> u128 {
    if width >= u128::BITS {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}
