// Copyright (c) 2026 the echoveil authors
// SPDX-License-Identifier: GPL-3.0-only

//! Key and parameter validation, plus key-derived values.
//!
//! The stego key does triple duty: it seeds pseudo-random position
//! generation (via its SHA-256 digest), it is the keystream for the
//! optional Vigenère transform, and its byte-sum is the parameter-header
//! checksum. All derivations here are pure functions of the key so the
//! embed and extract sides agree without shared state.

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::stego::error::StegoError;

/// Maximum stego key length in bytes.
pub const MAX_KEY_LEN: usize = 25;

/// Minimum supported LSB depth.
pub const MIN_LSB_DEPTH: u8 = 1;
/// Maximum supported LSB depth.
pub const MAX_LSB_DEPTH: u8 = 4;

/// Validate a stego key: non-empty, at most [`MAX_KEY_LEN`] bytes.
pub fn validate_key(key: &str) -> Result<(), StegoError> {
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(StegoError::InvalidKey);
    }
    Ok(())
}

/// Validate an LSB depth: must be within 1..=4.
pub fn validate_depth(lsb_depth: u8) -> Result<(), StegoError> {
    if !(MIN_LSB_DEPTH..=MAX_LSB_DEPTH).contains(&lsb_depth) {
        return Err(StegoError::InvalidDepth(lsb_depth));
    }
    Ok(())
}

/// SHA-256 digest of the key bytes.
///
/// This digest is the single source of keyed determinism: the random
/// position walk reads it as a rolling 16-bit window, and the sample-mode
/// start offset seeds a PRNG from its leading 8 bytes.
pub fn key_digest(key: &str) -> Zeroizing<[u8; 32]> {
    let mut digest = Zeroizing::new([0u8; 32]);
    digest.copy_from_slice(&Sha256::digest(key.as_bytes()));
    digest
}

/// Byte-sum checksum of the key, as stored in the parameter header.
///
/// Intentionally weak: downstream validation depends on its exact
/// collision behavior so the brute-force fallback triggers correctly.
pub fn key_checksum(key: &str) -> u32 {
    key.bytes().map(u32::from).sum()
}
