// Copyright (c) 2026 the echoveil authors
// SPDX-License-Identifier: GPL-3.0-only

//! Brute-force parameter recovery.
//!
//! When a stego file carries no (valid) parameter header, the embedding
//! parameters must be recovered by search. The space is tiny — LSB depth
//! 1..=4 crossed with sequential/random positions — so the grid is an
//! explicit ordered candidate list tried in a fixed priority order, each
//! validated by a pure predicate supplied by the caller (the framing
//! length-sanity oracle). The first accepting candidate wins.
//!
//! The predicate is an approximate integrity oracle: wrong-parameter bits
//! can in principle decode to plausible length fields. That approximation
//! is part of the scheme and is deliberately not strengthened here.
//!
//! With the `parallel` feature the candidates are probed concurrently
//! (the carrier is read-only); `find_map_first` keeps the serial priority
//! order authoritative.

use crate::stego::error::StegoError;
use crate::stego::header::ParameterHeader;

/// The full parameter grid in priority order: increasing depth, and for
/// each depth the sequential walk before the random one.
pub const CANDIDATES: [ParameterHeader; 8] = [
    ParameterHeader { lsb_depth: 1, use_random_positions: false },
    ParameterHeader { lsb_depth: 1, use_random_positions: true },
    ParameterHeader { lsb_depth: 2, use_random_positions: false },
    ParameterHeader { lsb_depth: 2, use_random_positions: true },
    ParameterHeader { lsb_depth: 3, use_random_positions: false },
    ParameterHeader { lsb_depth: 3, use_random_positions: true },
    ParameterHeader { lsb_depth: 4, use_random_positions: false },
    ParameterHeader { lsb_depth: 4, use_random_positions: true },
];

/// Probe every candidate in priority order; return the first acceptance.
///
/// # Errors
/// [`StegoError::ExtractionFailed`] when no candidate accepts.
#[cfg(not(feature = "parallel"))]
pub fn search_grid<R, F>(probe: F) -> Result<R, StegoError>
where
    F: Fn(ParameterHeader) -> Option<R>,
{
    CANDIDATES
        .iter()
        .find_map(|&candidate| probe(candidate))
        .ok_or(StegoError::ExtractionFailed)
}

/// Probe candidates concurrently, keeping the serial priority order for
/// the returned result.
#[cfg(feature = "parallel")]
pub fn search_grid<R, F>(probe: F) -> Result<R, StegoError>
where
    R: Send,
    F: Fn(ParameterHeader) -> Option<R> + Sync,
{
    use rayon::prelude::*;

    CANDIDATES
        .par_iter()
        .find_map_first(|&candidate| probe(candidate))
        .ok_or(StegoError::ExtractionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_order_is_depth_major_sequential_first() {
        let depths: Vec<u8> = CANDIDATES.iter().map(|c| c.lsb_depth).collect();
        assert_eq!(depths, vec![1, 1, 2, 2, 3, 3, 4, 4]);
        for pair in CANDIDATES.chunks(2) {
            assert!(!pair[0].use_random_positions);
            assert!(pair[1].use_random_positions);
        }
    }

    #[test]
    fn first_acceptance_wins() {
        let hit = search_grid(|c| {
            (c.lsb_depth >= 2).then_some((c.lsb_depth, c.use_random_positions))
        })
        .unwrap();
        assert_eq!(hit, (2, false));
    }

    #[test]
    fn exhaustion_is_extraction_failed() {
        let result: Result<(), _> = search_grid(|_| None);
        assert_eq!(result, Err(StegoError::ExtractionFailed));
    }

    #[test]
    fn probe_sees_all_eight_cells() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let probes = AtomicUsize::new(0);
        let result: Result<(), _> = search_grid(|_| {
            probes.fetch_add(1, Ordering::Relaxed);
            None
        });
        assert!(result.is_err());
        assert_eq!(probes.load(Ordering::Relaxed), 8);
    }
}
