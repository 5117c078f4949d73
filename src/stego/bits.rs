// Copyright (c) 2026 the echoveil authors
// SPDX-License-Identifier: GPL-3.0-only

//! Bit embedding engine.
//!
//! Writes and reads n-bit groups (n = LSB depth) into carrier units at a
//! given position sequence. Carrier units are either raw bitstream bytes
//! (`u8`) or decoded PCM samples (`i16`); [`CarrierUnit`] abstracts the
//! low-bit masking over both. Bits are consumed LSB-first within each
//! group, matching the framer's packing order.
//!
//! The capacity check runs before any mutation: a rejected embed leaves
//! the carrier byte-for-byte untouched.

use rand::Rng;
use rand_chacha::ChaCha20Rng;
use rand::SeedableRng;

use crate::stego::error::StegoError;

/// A carrier slot that can hold `lsb_depth` payload bits in its low bits.
pub trait CarrierUnit: Copy {
    /// Clear the low `n` bits and OR in `bits` (already masked to `n` bits).
    fn with_low_bits(self, n: u8, bits: u16) -> Self;
    /// Read bit `i` (0 = least significant).
    fn bit(self, i: u8) -> u8;
}

impl CarrierUnit for u8 {
    fn with_low_bits(self, n: u8, bits: u16) -> Self {
        let mask = !(((1u16 << n) - 1) as u8);
        (self & mask) | bits as u8
    }

    fn bit(self, i: u8) -> u8 {
        (self >> i) & 1
    }
}

impl CarrierUnit for i16 {
    fn with_low_bits(self, n: u8, bits: u16) -> Self {
        let mask = !((1i32 << n) - 1);
        ((self as i32 & mask) | bits as i32) as i16
    }

    fn bit(self, i: u8) -> u8 {
        ((self as u16) >> i) as u8 & 1
    }
}

/// Embed a bit vector into the carrier at the given positions.
///
/// Each position receives up to `lsb_depth` consecutive bits; embedding
/// stops early when the bits run out. Positions beyond the carrier length
/// are skipped (the position generator normally never produces them, but
/// a shorter carrier slice must not panic).
///
/// # Errors
/// [`StegoError::PayloadTooLarge`] when
/// `bits.len() > positions.len() * lsb_depth`, checked before any write.
pub fn embed_bits<T: CarrierUnit>(
    carrier: &mut [T],
    positions: &[usize],
    bits: &[u8],
    lsb_depth: u8,
) -> Result<(), StegoError> {
    let capacity_bits = positions.len() * lsb_depth as usize;
    if bits.len() > capacity_bits {
        return Err(StegoError::PayloadTooLarge {
            needed_bits: bits.len(),
            capacity_bits,
        });
    }

    let mut bit_index = 0usize;
    for &pos in positions {
        if bit_index >= bits.len() {
            break;
        }
        if pos >= carrier.len() {
            continue;
        }
        let mut group = 0u16;
        let mut group_len = 0u8;
        while group_len < lsb_depth && bit_index < bits.len() {
            group |= u16::from(bits[bit_index] & 1) << group_len;
            group_len += 1;
            bit_index += 1;
        }
        carrier[pos] = carrier[pos].with_low_bits(lsb_depth, group);
    }

    Ok(())
}

/// Extract up to `byte_count` bytes from the carrier at the given
/// positions, reading `lsb_depth` bits per position. A trailing partial
/// byte is truncated.
pub fn extract_bits<T: CarrierUnit>(
    carrier: &[T],
    positions: &[usize],
    lsb_depth: u8,
    byte_count: usize,
) -> Vec<u8> {
    let wanted_bits = byte_count * 8;
    let mut bits = Vec::with_capacity(wanted_bits.min(positions.len() * lsb_depth as usize));

    'outer: for &pos in positions {
        if pos >= carrier.len() {
            continue;
        }
        for i in 0..lsb_depth {
            bits.push(carrier[pos].bit(i));
            if bits.len() >= wanted_bits {
                break 'outer;
            }
        }
    }

    crate::stego::frame::bits_to_bytes(&bits)
}

/// Deterministic randomized start offset for sample-domain embedding.
///
/// Seeds a ChaCha20 PRNG from the key digest's leading 8 bytes read as a
/// big-endian u64 and draws one index bounded so `bits_needed` still fits
/// in the trailing samples. Uses a `u32` range so native and 32-bit
/// targets draw identically.
pub fn start_offset(
    digest: &[u8; 32],
    sample_count: usize,
    bits_needed: usize,
    lsb_depth: u8,
) -> usize {
    let seed = u64::from_be_bytes(digest[..8].try_into().expect("8-byte slice"));
    let mut rng = ChaCha20Rng::seed_from_u64(seed);

    let span = bits_needed.div_ceil(lsb_depth.max(1) as usize);
    let max_start = sample_count.saturating_sub(span + 1).max(1);
    rng.gen_range(0..max_start as u32) as usize
}
