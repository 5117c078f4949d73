// Copyright (c) 2026 the echoveil authors
// SPDX-License-Identifier: GPL-3.0-only

//! Peak signal-to-noise ratio between original and stego audio.
//!
//! `psnr = 10 · log10(32767² / mse)`, with identical signals saturating
//! at 100 dB instead of dividing by zero. Ratings follow the usual
//! audio-steganography ladder: anything at or above 30 dB passes.

use core::fmt;

use crate::stego::error::StegoError;

/// Peak amplitude of a 16-bit signal.
const PEAK: f64 = 32_767.0;

/// PSNR value returned for bit-identical signals.
pub const PSNR_IDENTICAL: f64 = 100.0;

/// Minimum PSNR considered acceptable.
pub const ACCEPTABLE_DB: f64 = 30.0;

/// Compute the PSNR (in dB) between an original and a stego signal.
///
/// # Errors
/// - [`StegoError::LengthMismatch`] when the lengths differ.
/// - [`StegoError::EmptySignal`] when either signal is empty.
pub fn psnr(original: &[i16], stego: &[i16]) -> Result<f64, StegoError> {
    if original.len() != stego.len() {
        return Err(StegoError::LengthMismatch);
    }
    if original.is_empty() {
        return Err(StegoError::EmptySignal);
    }

    let mse = mean_squared_error(original, stego);
    if mse == 0.0 {
        return Ok(PSNR_IDENTICAL);
    }
    Ok(10.0 * ((PEAK * PEAK) / mse).log10())
}

fn mean_squared_error(original: &[i16], stego: &[i16]) -> f64 {
    let sum: f64 = original
        .iter()
        .zip(stego)
        .map(|(&a, &b)| {
            let diff = f64::from(a) - f64::from(b);
            diff * diff
        })
        .sum();
    sum / original.len() as f64
}

/// Perceptual rating of a PSNR value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityRating {
    Excellent,
    Good,
    Acceptable,
    Poor,
    VeryPoor,
}

impl QualityRating {
    /// Classify a PSNR value in dB.
    pub fn classify(psnr_db: f64) -> Self {
        match psnr_db {
            p if p >= 50.0 => Self::Excellent,
            p if p >= 40.0 => Self::Good,
            p if p >= 30.0 => Self::Acceptable,
            p if p >= 20.0 => Self::Poor,
            _ => Self::VeryPoor,
        }
    }
}

impl fmt::Display for QualityRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Excellent => "excellent quality",
            Self::Good => "good quality",
            Self::Acceptable => "acceptable quality",
            Self::Poor => "poor quality",
            Self::VeryPoor => "very poor quality",
        };
        f.write_str(s)
    }
}

/// Whether a PSNR value meets the 30 dB acceptance floor.
pub fn is_acceptable(psnr_db: f64) -> bool {
    psnr_db >= ACCEPTABLE_DB
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_signals_saturate() {
        let signal = vec![0i16, 100, -200, 32_000];
        assert_eq!(psnr(&signal, &signal).unwrap(), PSNR_IDENTICAL);
    }

    #[test]
    fn length_mismatch_rejected() {
        assert!(matches!(
            psnr(&[1, 2, 3], &[1, 2]),
            Err(StegoError::LengthMismatch)
        ));
    }

    #[test]
    fn empty_signals_rejected() {
        assert!(matches!(psnr(&[], &[]), Err(StegoError::EmptySignal)));
    }

    #[test]
    fn larger_differences_strictly_decrease_psnr() {
        let original = vec![1_000i16; 1_000];
        let off_by_1: Vec<i16> = original.iter().map(|&s| s + 1).collect();
        let off_by_4: Vec<i16> = original.iter().map(|&s| s + 4).collect();
        let off_by_64: Vec<i16> = original.iter().map(|&s| s + 64).collect();

        let p1 = psnr(&original, &off_by_1).unwrap();
        let p4 = psnr(&original, &off_by_4).unwrap();
        let p64 = psnr(&original, &off_by_64).unwrap();
        assert!(p1 > p4 && p4 > p64);
    }

    #[test]
    fn known_value_off_by_one() {
        // mse = 1 → psnr = 10·log10(32767²) ≈ 90.31 dB.
        let original = vec![0i16; 100];
        let stego = vec![1i16; 100];
        let p = psnr(&original, &stego).unwrap();
        assert!((p - 90.308_998).abs() < 1e-3, "got {p}");
    }

    #[test]
    fn extreme_difference_handles_i16_range() {
        // Max-to-min swing must not overflow the difference arithmetic.
        let original = vec![i16::MAX; 10];
        let stego = vec![i16::MIN; 10];
        let p = psnr(&original, &stego).unwrap();
        assert!(p < 0.0, "65535² error should push PSNR below 0, got {p}");
    }

    #[test]
    fn rating_ladder() {
        assert_eq!(QualityRating::classify(55.0), QualityRating::Excellent);
        assert_eq!(QualityRating::classify(50.0), QualityRating::Excellent);
        assert_eq!(QualityRating::classify(45.0), QualityRating::Good);
        assert_eq!(QualityRating::classify(35.0), QualityRating::Acceptable);
        assert_eq!(QualityRating::classify(25.0), QualityRating::Poor);
        assert_eq!(QualityRating::classify(5.0), QualityRating::VeryPoor);
        assert!(is_acceptable(30.0));
        assert!(!is_acceptable(29.999));
    }

    #[test]
    fn rating_display() {
        assert_eq!(QualityRating::Excellent.to_string(), "excellent quality");
        assert_eq!(QualityRating::VeryPoor.to_string(), "very poor quality");
    }
}
