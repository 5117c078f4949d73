// Copyright (c) 2026 the echoveil authors
// SPDX-License-Identifier: GPL-3.0-only

//! Payload framing and bit-level packing.
//!
//! The frame is the self-describing byte stream that carries metadata and
//! secret through the bit embedding engine:
//!
//! ```text
//! [4 bytes] metadata length (little-endian u32)
//! [N bytes] metadata record
//! [4 bytes] secret length (little-endian u32)
//! [M bytes] secret bytes
//! ```
//!
//! In sample mode the bit-packed frame is additionally wrapped in a
//! depth-specific start/end bit signature. The four depths use distinct
//! patterns so a brute-force extractor can disambiguate the depth by
//! scanning for the start signature.
//!
//! All bit packing is LSB-first within each byte — the opposite of common
//! network order, but both sides of this codec agree and the order is part
//! of the wire format.

use crate::stego::error::StegoError;

/// Upper bound on a plausible metadata record, used by the recovery
/// oracle to reject wrong-parameter candidates.
pub const MAX_METADATA_LEN: usize = 10_000;

/// Build a frame from a serialized metadata record and the secret bytes.
pub fn frame_payload(metadata: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(4 + metadata.len() + 4 + secret.len());
    frame.extend_from_slice(&(metadata.len() as u32).to_le_bytes());
    frame.extend_from_slice(metadata);
    frame.extend_from_slice(&(secret.len() as u32).to_le_bytes());
    frame.extend_from_slice(secret);
    frame
}

/// A parsed frame: borrowed views into the extracted byte run.
#[derive(Debug, PartialEq, Eq)]
pub struct FramedPayload<'a> {
    pub metadata: &'a [u8],
    pub secret: &'a [u8],
}

/// Offsets of a structurally valid frame within a byte run.
#[derive(Debug, Clone, Copy)]
pub struct FrameLengths {
    pub metadata_len: usize,
    pub secret_len: usize,
}

impl FrameLengths {
    /// Total frame size in bytes.
    pub fn total(&self) -> usize {
        4 + self.metadata_len + 4 + self.secret_len
    }
}

/// Validate the two length prefixes against the available data.
///
/// This is the integrity oracle the brute-force grid runs per parameter
/// candidate: it accepts iff the metadata length is plausible
/// (`<= MAX_METADATA_LEN`), the declared total fits inside `data`, and the
/// secret is non-empty. It is an approximate check — random bits can in
/// principle decode to plausible lengths — and is kept that way.
pub fn validate_lengths(data: &[u8]) -> Result<FrameLengths, StegoError> {
    if data.len() < 8 {
        return Err(StegoError::FormatError);
    }
    let metadata_len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if metadata_len > MAX_METADATA_LEN || 4 + metadata_len + 4 > data.len() {
        return Err(StegoError::FormatError);
    }
    let at = 4 + metadata_len;
    let secret_len = u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]) as usize;
    let lengths = FrameLengths { metadata_len, secret_len };
    if secret_len == 0 || lengths.total() > data.len() {
        return Err(StegoError::FormatError);
    }
    Ok(lengths)
}

/// Parse a frame, returning views of the metadata record and the secret.
pub fn unframe_payload(data: &[u8]) -> Result<FramedPayload<'_>, StegoError> {
    let lengths = validate_lengths(data)?;
    let meta_start = 4;
    let secret_start = 4 + lengths.metadata_len + 4;
    Ok(FramedPayload {
        metadata: &data[meta_start..meta_start + lengths.metadata_len],
        secret: &data[secret_start..secret_start + lengths.secret_len],
    })
}

// --- depth signatures ---

/// Start/end bit signature pair for one LSB depth.
pub struct Signature {
    pub start: &'static [u8],
    pub end: &'static [u8],
}

const SIG_DEPTH_1: Signature = Signature {
    start: &[1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0],
    end: &[1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0],
};
const SIG_DEPTH_2: Signature = Signature {
    start: &[0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1],
    end: &[0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1],
};
const SIG_DEPTH_3: Signature = Signature {
    start: &[1, 0, 1, 0, 1, 0, 1, 0, 0, 1, 0, 1, 0, 1, 0, 1],
    end: &[0, 1, 0, 1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, 1, 0],
};
const SIG_DEPTH_4: Signature = Signature {
    start: &[0, 1, 0, 1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, 1, 0],
    end: &[1, 0, 1, 0, 1, 0, 1, 0, 0, 1, 0, 1, 0, 1, 0, 1],
};

/// The signature pair defined for an LSB depth (1..=4).
pub fn signature_for_depth(lsb_depth: u8) -> Result<&'static Signature, StegoError> {
    match lsb_depth {
        1 => Ok(&SIG_DEPTH_1),
        2 => Ok(&SIG_DEPTH_2),
        3 => Ok(&SIG_DEPTH_3),
        4 => Ok(&SIG_DEPTH_4),
        n => Err(StegoError::InvalidDepth(n)),
    }
}

/// Wrap a payload bit vector in the start/end signature for `lsb_depth`.
pub fn wrap_with_signature(payload_bits: &[u8], lsb_depth: u8) -> Result<Vec<u8>, StegoError> {
    let sig = signature_for_depth(lsb_depth)?;
    let mut bits = Vec::with_capacity(sig.start.len() + payload_bits.len() + sig.end.len());
    bits.extend_from_slice(sig.start);
    bits.extend_from_slice(payload_bits);
    bits.extend_from_slice(sig.end);
    Ok(bits)
}

/// Check the start signature and strip it, returning the trailing bits
/// (payload plus whatever follows it, end signature included).
pub fn strip_start_signature(bits: &[u8], lsb_depth: u8) -> Result<&[u8], StegoError> {
    let sig = signature_for_depth(lsb_depth)?;
    if bits.len() < sig.start.len() || &bits[..sig.start.len()] != sig.start {
        return Err(StegoError::FormatError);
    }
    Ok(&bits[sig.start.len()..])
}

// --- bit packing ---

/// Convert bytes to a bit vector, LSB-first within each byte.
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for bit_pos in 0..8 {
            bits.push((byte >> bit_pos) & 1);
        }
    }
    bits
}

/// Convert a bit vector (LSB-first) back to bytes, truncating any
/// trailing partial byte.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(bits.len() / 8);
    for chunk in bits.chunks_exact(8) {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            byte |= (bit & 1) << i;
        }
        bytes.push(byte);
    }
    bytes
}
