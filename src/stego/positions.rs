// Copyright (c) 2026 the echoveil authors
// SPDX-License-Identifier: GPL-3.0-only

//! Carrier position selection.
//!
//! Turns a key digest, a mode, and a carrier size into a reproducible
//! ordered sequence of carrier indices. Both embed and extract call the
//! same function with the same arguments, which is the entire symmetry
//! contract — there is no cached state.
//!
//! The sequence length follows the scheme's capacity formula
//! `ceil(carrier_count * lsb_depth / 8)`. The formula couples capacity to
//! depth through a byte-oriented division; it is preserved verbatim as the
//! dual embed/extract contract (changing it breaks round-tripping with
//! existing stego files).

use crate::stego::error::StegoError;

/// Number of positions (and therefore capacity in bytes) for a carrier of
/// `carrier_count` units at `lsb_depth` bits per unit.
pub fn capacity_bytes(carrier_count: usize, lsb_depth: u8) -> usize {
    (carrier_count * lsb_depth as usize).div_ceil(8)
}

/// Generate the ordered position sequence for a carrier.
///
/// - Sequential mode: `positions[i] = i % carrier_count`, repeating when
///   more positions are needed than carrier units exist.
/// - Random mode: indices derived from the key digest; see
///   [`generate_random`].
///
/// # Errors
/// [`StegoError::InsufficientCarrier`] when `carrier_count` is 0.
pub fn generate_positions(
    digest: &[u8; 32],
    use_random: bool,
    carrier_count: usize,
    lsb_depth: u8,
) -> Result<Vec<usize>, StegoError> {
    if carrier_count == 0 {
        return Err(StegoError::InsufficientCarrier);
    }
    let needed = capacity_bytes(carrier_count, lsb_depth);
    if use_random {
        Ok(generate_random(digest, carrier_count, needed))
    } else {
        Ok(generate_sequential(carrier_count, needed))
    }
}

fn generate_sequential(carrier_count: usize, needed: usize) -> Vec<usize> {
    (0..needed).map(|i| i % carrier_count).collect()
}

/// Derive positions from the digest with a rolling two-byte window.
///
/// Each step reads a 16-bit little-endian value from `digest[i % 32]` and
/// `digest[(i + 1) % 32]`, reduces it modulo `carrier_count`, and keeps it
/// if unseen. Attempts are capped at `2 * needed`; any shortfall is filled
/// by a linear scan over still-unused indices, so no index repeats while
/// an unused one remains.
fn generate_random(digest: &[u8; 32], carrier_count: usize, needed: usize) -> Vec<usize> {
    let mut positions = Vec::with_capacity(needed);
    let mut used = vec![false; carrier_count];

    let max_attempts = needed * 2;
    let mut window = 0usize;
    for _ in 0..max_attempts {
        if positions.len() >= needed {
            break;
        }
        let lo = digest[window % 32] as usize;
        let hi = digest[(window + 1) % 32] as usize;
        let pos = (lo + hi * 256) % carrier_count;
        if !used[pos] {
            used[pos] = true;
            positions.push(pos);
        }
        window += 1;
    }

    // The digest stream exhausted its attempt budget; sweep the carrier
    // for unused indices in order.
    let mut next = 0usize;
    while positions.len() < needed && next < carrier_count {
        if !used[next] {
            used[next] = true;
            positions.push(next);
        }
        next += 1;
    }

    // Every index is used but the sequence is still short (cannot happen
    // for depths 1..=4, where needed <= carrier_count). Cycle like the
    // sequential mode does.
    while positions.len() < needed {
        positions.push(positions.len() % carrier_count);
    }

    positions
}
