// Copyright (c) 2026 the echoveil authors
// SPDX-License-Identifier: GPL-3.0-only

//! MP3 bitstream carrier scanning.
//!
//! Bitstream-mode embedding flips low bits of the compressed file itself,
//! so it must never touch the 4-byte frame headers (11-bit sync pattern
//! `0xFF` followed by a byte with its top three bits set) — corrupting a
//! sync word desynchronizes every decoder. This module selects the byte
//! offsets that are safe to modify.
//!
//! Decoding the bitstream to PCM and re-encoding are external collaborator
//! concerns; see [`crate::stego::codec`].

/// Bytes at the start of the file that are never touched (ID3v2 tags and
/// encoder info frames commonly live here).
pub const SKIP_START: usize = 512;

/// Start offset for the conservative fallback scan.
const FALLBACK_START: usize = 2000;

/// If the primary scan yields fewer positions than this, the fallback
/// scan re-derives the set with stricter sync avoidance.
const MIN_PRIMARY_POSITIONS: usize = 10_000;

/// Return true when `data[i]` begins an MP3 frame-sync pattern.
fn is_sync_start(data: &[u8], i: usize) -> bool {
    data[i] == 0xFF && i + 1 < data.len() && data[i + 1] & 0xE0 == 0xE0
}

/// Scan an MP3 bitstream for byte offsets that are safe to modify.
///
/// The primary pass skips the first [`SKIP_START`] bytes and every byte of
/// each 4-byte frame header. When that yields too few positions (small or
/// unusual files), a fallback pass starts at byte 2000 and additionally
/// refuses any `0xFF` byte and any byte directly preceding one, so no
/// modification can create a spurious sync pattern.
pub fn find_embeddable_positions(data: &[u8]) -> Vec<usize> {
    let mut in_header = vec![false; data.len()];
    for i in 0..data.len().saturating_sub(1) {
        if is_sync_start(data, i) {
            for j in i..(i + 4).min(data.len()) {
                in_header[j] = true;
            }
        }
    }

    let mut positions = Vec::new();
    for i in SKIP_START..data.len() {
        if in_header[i] || is_sync_start(data, i) {
            continue;
        }
        positions.push(i);
    }

    if positions.len() < MIN_PRIMARY_POSITIONS && data.len() > FALLBACK_START {
        positions.clear();
        for i in FALLBACK_START..data.len() {
            if data[i] == 0xFF {
                continue;
            }
            if i > 0 && data[i - 1] == 0xFF && data[i] & 0xE0 == 0xE0 {
                continue;
            }
            if i + 1 < data.len() && data[i + 1] == 0xFF {
                continue;
            }
            positions.push(i);
        }
    }

    positions
}
