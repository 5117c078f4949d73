// Copyright (c) 2026 the echoveil authors
// SPDX-License-Identifier: GPL-3.0-only

//! In-band parameter header (bitstream mode).
//!
//! An 8-byte record declaring the embedding parameters so extraction can
//! skip the brute-force grid:
//!
//! ```text
//! [2 bytes] magic 0xAB 0xCD
//! [1 byte ] LSB depth (1-4)
//! [1 byte ] random positions flag (0|1)
//! [4 bytes] key checksum (u32 LE, byte-sum of the key)
//! ```
//!
//! Always embedded 1 bit per carrier byte across the first 64 eligible
//! positions, independent of the main position sequence and of the
//! configured depth. The checksum is a byte-sum on purpose; see DESIGN.md.

use crate::stego::bits::{embed_bits, extract_bits};
use crate::stego::error::StegoError;
use crate::stego::frame::bytes_to_bits;
use crate::stego::key::{key_checksum, validate_depth};

/// First magic byte.
pub const MAGIC_0: u8 = 0xAB;
/// Second magic byte.
pub const MAGIC_1: u8 = 0xCD;

/// Header size in bytes.
pub const HEADER_LEN: usize = 8;
/// Carrier positions the header occupies (1 bit per position).
pub const HEADER_POSITIONS: usize = HEADER_LEN * 8;

/// Declared embedding parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterHeader {
    pub lsb_depth: u8,
    pub use_random_positions: bool,
}

impl ParameterHeader {
    /// Serialize to the 8-byte wire layout, binding the header to `key`
    /// via the byte-sum checksum.
    pub fn to_bytes(self, key: &str) -> [u8; HEADER_LEN] {
        let mut header = [0u8; HEADER_LEN];
        header[0] = MAGIC_0;
        header[1] = MAGIC_1;
        header[2] = self.lsb_depth;
        header[3] = u8::from(self.use_random_positions);
        header[4..8].copy_from_slice(&key_checksum(key).to_le_bytes());
        header
    }

    /// Parse and validate an 8-byte header against `key`.
    ///
    /// Rejects wrong magic, out-of-range depth, and checksum mismatch —
    /// all as [`StegoError::FormatError`], which the caller treats as
    /// "fall back to the grid".
    pub fn parse(header: &[u8], key: &str) -> Result<Self, StegoError> {
        if header.len() != HEADER_LEN {
            return Err(StegoError::FormatError);
        }
        if header[0] != MAGIC_0 || header[1] != MAGIC_1 {
            return Err(StegoError::FormatError);
        }
        let lsb_depth = header[2];
        validate_depth(lsb_depth).map_err(|_| StegoError::FormatError)?;
        let use_random_positions = header[3] == 1;

        let stored = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        if stored != key_checksum(key) {
            return Err(StegoError::FormatError);
        }

        Ok(Self { lsb_depth, use_random_positions })
    }

    /// Embed the header 1 bit per byte into `positions` (the first 64
    /// eligible carrier positions).
    pub fn embed_into(
        self,
        carrier: &mut [u8],
        positions: &[usize],
        key: &str,
    ) -> Result<(), StegoError> {
        if positions.len() < HEADER_POSITIONS {
            return Err(StegoError::InsufficientCarrier);
        }
        let bits = bytes_to_bits(&self.to_bytes(key));
        embed_bits(carrier, &positions[..HEADER_POSITIONS], &bits, 1)
    }

    /// Read back the 8 header bytes from the first 64 positions.
    pub fn extract_from(carrier: &[u8], positions: &[usize]) -> Result<Vec<u8>, StegoError> {
        if positions.len() < HEADER_POSITIONS {
            return Err(StegoError::InsufficientCarrier);
        }
        Ok(extract_bits(carrier, &positions[..HEADER_POSITIONS], 1, HEADER_LEN))
    }
}
