// Copyright (c) 2026 the echoveil authors
// SPDX-License-Identifier: GPL-3.0-only

//! Codec-aware quantization embedding.
//!
//! The plain LSB embedder does not survive a lossy re-encode: the encoder
//! requantizes every sample and the low bits are noise to it. This variant
//! instead moves each carrier sample within a perceptual quantization
//! bucket whose size tracks the target bitrate and the sample magnitude —
//! a bit `1` parks the sample in the upper quarter of its bucket, a bit
//! `0` in the lower quarter, and the extractor asks which half the
//! remainder landed in. Coarser buckets at lower bitrates trade fidelity
//! for survival.
//!
//! Each eligible sample carries exactly one bit: a bucket can only encode
//! upper-or-lower. Eligibility is restricted to the middle 40% of the
//! sample index range, a stand-in heuristic for a mid/high spectral band
//! that the psychoacoustic model preserves.

use crate::stego::error::StegoError;

/// Lower edge of the eligible band (fraction of the sample index range).
const BAND_LOW: f64 = 0.3;
/// Upper edge of the eligible band.
const BAND_HIGH: f64 = 0.7;

/// Quantization step for a sample at a target bitrate (kbps).
///
/// Base step by bitrate bucket, scaled by magnitude bucket. Higher
/// bitrates quantize finer; louder samples tolerate coarser steps.
pub fn quantization_step(sample: i16, bitrate: u32) -> i32 {
    let base: i32 = match bitrate {
        b if b >= 256 => 4,
        b if b >= 192 => 6,
        b if b >= 128 => 8,
        _ => 12,
    };

    let magnitude = (sample as i32).abs();
    match magnitude {
        m if m < 2_000 => base / 2,
        m if m < 8_000 => base,
        m if m < 20_000 => base * 2,
        _ => base * 3,
    }
}

/// Encode one bit into a sample by steering it within its quantization
/// bucket. Samples already in the target half are left untouched.
pub fn embed_bit(sample: i16, bit: bool, bitrate: u32) -> i16 {
    let step = quantization_step(sample, bitrate);
    let s = sample as i32;
    // Euclidean quantization keeps the remainder in [0, step) for
    // negative samples too; truncating division would decode bit-1
    // samples below zero incorrectly.
    let quantized = s.div_euclid(step) * step;
    let remainder = s - quantized;

    let steered = if bit {
        if remainder < step / 2 {
            quantized + (step * 3) / 4
        } else {
            s
        }
    } else if remainder >= step / 2 {
        quantized + step / 4
    } else {
        s
    };

    steered.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Decode the bit a sample carries: which half of its bucket it sits in.
pub fn extract_bit(sample: i16, bitrate: u32) -> bool {
    let step = quantization_step(sample, bitrate);
    (sample as i32).rem_euclid(step) >= step / 2
}

/// Whether sample index `index` of `total` lies in the eligible band.
pub fn in_band(index: usize, total: usize) -> bool {
    if total == 0 {
        return false;
    }
    let position = index as f64 / total as f64;
    (BAND_LOW..=BAND_HIGH).contains(&position)
}

/// Indices of all band-eligible samples, in order.
pub fn band_indices(total: usize) -> Vec<usize> {
    (0..total).filter(|&i| in_band(i, total)).collect()
}

/// Embed a bit vector into the eligible band, one bit per selected
/// position. `positions` index into `band`, which indexes into `samples`.
///
/// # Errors
/// [`StegoError::PayloadTooLarge`] when more bits than positions,
/// checked before any write.
pub fn embed_bits_quant(
    samples: &mut [i16],
    band: &[usize],
    positions: &[usize],
    bits: &[u8],
    bitrate: u32,
) -> Result<(), StegoError> {
    if bits.len() > positions.len() {
        return Err(StegoError::PayloadTooLarge {
            needed_bits: bits.len(),
            capacity_bits: positions.len(),
        });
    }

    for (&pos, &bit) in positions.iter().zip(bits) {
        let Some(&sample_idx) = band.get(pos) else { continue };
        samples[sample_idx] = embed_bit(samples[sample_idx], bit == 1, bitrate);
    }
    Ok(())
}

/// Extract up to `byte_count` bytes from the eligible band, one bit per
/// position, truncating a trailing partial byte.
pub fn extract_bits_quant(
    samples: &[i16],
    band: &[usize],
    positions: &[usize],
    byte_count: usize,
    bitrate: u32,
) -> Vec<u8> {
    let wanted_bits = byte_count * 8;
    let mut bits = Vec::with_capacity(wanted_bits.min(positions.len()));
    for &pos in positions {
        if bits.len() >= wanted_bits {
            break;
        }
        let Some(&sample_idx) = band.get(pos) else { continue };
        bits.push(u8::from(extract_bit(samples[sample_idx], bitrate)));
    }
    crate::stego::frame::bits_to_bytes(&bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_tracks_bitrate_and_magnitude() {
        assert_eq!(quantization_step(0, 320), 2); // 4 / 2
        assert_eq!(quantization_step(5_000, 320), 4);
        assert_eq!(quantization_step(10_000, 320), 8);
        assert_eq!(quantization_step(25_000, 320), 12);
        assert_eq!(quantization_step(5_000, 192), 6);
        assert_eq!(quantization_step(5_000, 128), 8);
        assert_eq!(quantization_step(5_000, 64), 12);
        assert_eq!(quantization_step(-10_000, 320), 8); // magnitude, not sign
    }

    #[test]
    fn bit_roundtrip_across_magnitudes() {
        for &sample in &[0i16, 150, 2_500, 9_000, 21_000, 30_000, -150, -2_500, -9_000, -30_000] {
            for bit in [false, true] {
                let modified = embed_bit(sample, bit, 320);
                assert_eq!(
                    extract_bit(modified, 320),
                    bit,
                    "sample {sample} bit {bit}"
                );
            }
        }
    }

    #[test]
    fn already_in_half_untouched() {
        // step = 4 at low magnitude/320k; remainder 3 >= step/2 → already a 1.
        let sample = 4_003i16;
        assert_eq!(embed_bit(sample, true, 320), sample);
        // remainder 1 < step/2 → already a 0.
        let sample = 4_001i16;
        assert_eq!(embed_bit(sample, false, 320), sample);
    }

    #[test]
    fn clamped_at_rails() {
        let hi = embed_bit(i16::MAX, true, 64);
        assert!(hi <= i16::MAX);
        let lo = embed_bit(i16::MIN, false, 64);
        assert!(lo >= i16::MIN);
    }

    #[test]
    fn band_is_middle_40_percent() {
        let total = 1_000;
        assert!(!in_band(0, total));
        assert!(!in_band(299, total));
        assert!(in_band(300, total));
        assert!(in_band(500, total));
        assert!(in_band(700, total));
        assert!(!in_band(701, total));
        let band = band_indices(total);
        assert_eq!(band.len(), 401);
    }

    #[test]
    fn quant_embed_extract_roundtrip() {
        let mut samples: Vec<i16> = (0..10_000)
            .map(|i| (((i * 37) % 24_000) - 12_000) as i16)
            .collect();
        let band = band_indices(samples.len());
        let positions: Vec<usize> = (0..band.len()).collect();
        let payload = b"quantized secret";
        let bits = crate::stego::frame::bytes_to_bits(payload);

        embed_bits_quant(&mut samples, &band, &positions, &bits, 320).unwrap();
        let out = extract_bits_quant(&samples, &band, &positions, payload.len(), 320);
        assert_eq!(out, payload.to_vec());
    }

    #[test]
    fn quant_capacity_precondition() {
        let mut samples = vec![0i16; 100];
        let band = band_indices(samples.len());
        let positions: Vec<usize> = (0..band.len()).collect();
        let bits = vec![1u8; positions.len() + 1];
        assert!(matches!(
            embed_bits_quant(&mut samples, &band, &positions, &bits, 320),
            Err(StegoError::PayloadTooLarge { .. })
        ));
    }
}
