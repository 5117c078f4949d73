// Copyright (c) 2026 the echoveil authors
// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the steganography pipeline.
//!
//! [`StegoError`] covers all failure modes from parameter validation through
//! bit embedding, payload framing, and brute-force recovery.

use core::fmt;

/// Errors that can occur during steganographic embedding or extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StegoError {
    /// The stego key is empty or longer than 25 characters.
    InvalidKey,
    /// The LSB depth is outside the supported 1..=4 range.
    InvalidDepth(u8),
    /// The carrier has no usable positions (or too few for the header).
    InsufficientCarrier,
    /// The payload does not fit the carrier's embedding capacity.
    PayloadTooLarge {
        /// Bits the payload requires.
        needed_bits: usize,
        /// Bits the selected positions can hold.
        capacity_bits: usize,
    },
    /// Length-prefix framing is inconsistent with the available data.
    ///
    /// Soft during brute-force recovery: the grid treats it as "try the
    /// next parameter candidate", not as a fatal condition.
    FormatError,
    /// The parameter grid was exhausted without an accepting candidate.
    ExtractionFailed,
    /// The two signals handed to the quality assessor differ in length.
    LengthMismatch,
    /// A signal handed to the quality assessor is empty.
    EmptySignal,
}

impl fmt::Display for StegoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey => write!(f, "stego key must be 1-25 characters"),
            Self::InvalidDepth(n) => write!(f, "LSB depth must be between 1 and 4, got {n}"),
            Self::InsufficientCarrier => write!(f, "not enough embeddable carrier positions"),
            Self::PayloadTooLarge { needed_bits, capacity_bits } => write!(
                f,
                "payload too large: need {needed_bits} bits, capacity is {capacity_bits} bits"
            ),
            Self::FormatError => write!(f, "payload framing is inconsistent"),
            Self::ExtractionFailed => write!(f, "no valid embedding found for any parameter set"),
            Self::LengthMismatch => write!(f, "signals must have the same length"),
            Self::EmptySignal => write!(f, "signals cannot be empty"),
        }
    }
}

impl std::error::Error for StegoError {}
