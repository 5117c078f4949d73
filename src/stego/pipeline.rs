// Copyright (c) 2026 the echoveil authors
// SPDX-License-Identifier: GPL-3.0-only

//! Embedding and extraction pipelines.
//!
//! Three embedding modes over in-memory carriers:
//!
//! - **Bitstream**: low bits of raw MP3 bytes, frame headers avoided. An
//!   in-band parameter header in the first 64 eligible positions lets the
//!   extractor skip the brute-force grid.
//! - **Sample**: low bits of decoded PCM samples, payload wrapped in a
//!   depth-specific bit signature so grid recovery can lock onto the
//!   correct depth and start position.
//! - **Quant**: codec-aware quantization steering, the only mode expected
//!   to survive a lossy re-encode.
//!
//! Extraction without stored parameters runs the ordered candidate grid
//! from [`crate::stego::recover`]; `smart_extract` chains all three modes.

use crate::mp3;
use crate::stego::bits::{embed_bits, extract_bits, start_offset, CarrierUnit};
use crate::stego::cipher;
use crate::stego::error::StegoError;
use crate::stego::frame::{
    bits_to_bytes, bytes_to_bits, frame_payload, signature_for_depth, strip_start_signature,
    unframe_payload, validate_lengths, wrap_with_signature, MAX_METADATA_LEN,
};
use crate::stego::header::{ParameterHeader, HEADER_POSITIONS};
use crate::stego::key::{key_digest, validate_depth, validate_key};
use crate::stego::payload::FileMetadata;
use crate::stego::positions::generate_positions;
use crate::stego::psnr::psnr;
use crate::stego::quant::{band_indices, embed_bits_quant, extract_bits_quant};
use crate::stego::recover::search_grid;

/// First-stage extraction probe, in bytes.
const PROBE_BYTES: usize = 1024;

/// Slack read past the metadata record to cover the secret length prefix.
const META_SLACK: usize = 100;

/// Position count above which the bitstream pipelines restrict themselves
/// to a fixed segment of the carrier.
const SEGMENT_THRESHOLD: usize = 100_000;

/// Segment size used once [`SEGMENT_THRESHOLD`] is exceeded.
const SEGMENT_CAP: usize = 50_000;

/// Embedding parameters supplied by the caller.
#[derive(Debug, Clone)]
pub struct EmbedConfig {
    pub key: String,
    pub lsb_depth: u8,
    pub use_random_positions: bool,
    pub use_encryption: bool,
}

impl EmbedConfig {
    /// Validate key and depth before any carrier work.
    pub fn validate(&self) -> Result<(), StegoError> {
        validate_key(&self.key)?;
        validate_depth(self.lsb_depth)
    }

    fn params(&self) -> ParameterHeader {
        ParameterHeader {
            lsb_depth: self.lsb_depth,
            use_random_positions: self.use_random_positions,
        }
    }
}

/// A recovered secret with its metadata record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub metadata: FileMetadata,
    pub secret: Vec<u8>,
}

/// Result of a sample-domain embed: the stego samples and the measured
/// distortion against the input.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleStego {
    pub samples: Vec<i16>,
    pub psnr_db: f64,
}

// --- bitstream mode ---

/// Embed a secret into the low bits of an MP3 bitstream.
pub fn embed_bitstream(
    mp3_bytes: &[u8],
    secret: &[u8],
    metadata: &FileMetadata,
    config: &EmbedConfig,
) -> Result<Vec<u8>, StegoError> {
    config.validate()?;
    if secret.is_empty() {
        return Err(StegoError::FormatError);
    }

    // 1. Scan the carrier and reserve the header region.
    let eligible = mp3::find_embeddable_positions(mp3_bytes);
    if eligible.len() <= HEADER_POSITIONS {
        return Err(StegoError::InsufficientCarrier);
    }
    let (header_region, data_region) = eligible.split_at(HEADER_POSITIONS);
    let data_region = cap_segment(data_region);

    // 2. Declare the parameters in-band.
    let mut stego = mp3_bytes.to_vec();
    config.params().embed_into(&mut stego, header_region, &config.key)?;

    // 3. Frame the payload (cipher first when configured).
    let payload = seal_payload(secret, config);
    let record = stamped_metadata(metadata, config, payload.len()).serialize();
    let bits = bytes_to_bits(&frame_payload(&record, &payload));

    // 4. Embed at the generated positions over the data region.
    let digest = key_digest(&config.key);
    let order = generate_positions(
        &digest,
        config.use_random_positions,
        data_region.len(),
        config.lsb_depth,
    )?;
    let mapped: Vec<usize> = order.iter().map(|&i| data_region[i]).collect();
    embed_bits(&mut stego, &mapped, &bits, config.lsb_depth)?;

    Ok(stego)
}

/// Extract a secret from an MP3 bitstream.
///
/// Header-directed when the in-band parameter header validates against
/// `key`; otherwise falls back to the brute-force grid.
pub fn extract_bitstream(mp3_bytes: &[u8], key: &str) -> Result<Extracted, StegoError> {
    validate_key(key)?;

    let eligible = mp3::find_embeddable_positions(mp3_bytes);
    if eligible.len() <= HEADER_POSITIONS {
        return Err(StegoError::InsufficientCarrier);
    }
    let (header_region, data_region) = eligible.split_at(HEADER_POSITIONS);
    let data_region = cap_segment(data_region);

    if let Ok(bytes) = ParameterHeader::extract_from(mp3_bytes, header_region) {
        if let Ok(params) = ParameterHeader::parse(&bytes, key) {
            if let Some(found) = try_bitstream_candidate(mp3_bytes, data_region, params, key) {
                return Ok(found);
            }
        }
    }

    search_grid(|candidate| try_bitstream_candidate(mp3_bytes, data_region, candidate, key))
}

fn try_bitstream_candidate(
    carrier: &[u8],
    data_region: &[usize],
    params: ParameterHeader,
    key: &str,
) -> Option<Extracted> {
    let digest = key_digest(key);
    let order = generate_positions(
        &digest,
        params.use_random_positions,
        data_region.len(),
        params.lsb_depth,
    )
    .ok()?;
    let mapped: Vec<usize> = order.iter().map(|&i| data_region[i]).collect();

    let max_bytes = mapped.len() * params.lsb_depth as usize / 8;
    let run = staged_run(max_bytes, |n| {
        extract_bits(carrier, &mapped, params.lsb_depth, n)
    })?;
    finish_extract(&run, key)
}

// --- sample mode ---

/// Embed a secret into the low bits of decoded PCM samples.
///
/// The framed payload is wrapped in the depth signature. Sequential mode
/// starts at a keyed offset; random mode uses the digest-derived position
/// walk (the offset would be redundant there).
pub fn embed_samples(
    samples: &[i16],
    secret: &[u8],
    metadata: &FileMetadata,
    config: &EmbedConfig,
) -> Result<SampleStego, StegoError> {
    config.validate()?;
    if samples.is_empty() {
        return Err(StegoError::EmptySignal);
    }
    if secret.is_empty() {
        return Err(StegoError::FormatError);
    }

    // 1. Frame and wrap.
    let payload = seal_payload(secret, config);
    let record = stamped_metadata(metadata, config, payload.len()).serialize();
    let bits = bytes_to_bits(&frame_payload(&record, &payload));
    let wrapped = wrap_with_signature(&bits, config.lsb_depth)?;

    // 2. Embed.
    let digest = key_digest(&config.key);
    let mut stego = samples.to_vec();
    if config.use_random_positions {
        let positions = generate_positions(&digest, true, samples.len(), config.lsb_depth)?;
        embed_bits(&mut stego, &positions, &wrapped, config.lsb_depth)?;
    } else {
        let offset = start_offset(&digest, samples.len(), wrapped.len(), config.lsb_depth);
        let capacity_bits = samples.len().saturating_sub(offset) * config.lsb_depth as usize;
        if wrapped.len() > capacity_bits {
            return Err(StegoError::PayloadTooLarge {
                needed_bits: wrapped.len(),
                capacity_bits,
            });
        }
        let span = wrapped.len().div_ceil(config.lsb_depth as usize);
        let positions: Vec<usize> = (offset..offset + span).collect();
        embed_bits(&mut stego, &positions, &wrapped, config.lsb_depth)?;
    }

    // 3. Measure distortion.
    let psnr_db = psnr(samples, &stego)?;
    Ok(SampleStego { samples: stego, psnr_db })
}

/// Extract a secret from PCM samples via the brute-force grid, using the
/// depth signatures to validate each candidate.
pub fn extract_samples(samples: &[i16], key: &str) -> Result<Extracted, StegoError> {
    validate_key(key)?;
    if samples.is_empty() {
        return Err(StegoError::EmptySignal);
    }

    let digest = key_digest(key);
    search_grid(|candidate| try_sample_candidate(samples, &digest, candidate, key))
}

fn try_sample_candidate(
    samples: &[i16],
    digest: &[u8; 32],
    params: ParameterHeader,
    key: &str,
) -> Option<Extracted> {
    let depth = params.lsb_depth;
    if params.use_random_positions {
        let positions = generate_positions(digest, true, samples.len(), depth).ok()?;
        let bits = collect_bits(samples, &positions, depth);
        parse_signed_bits(&bits, depth, key)
    } else {
        // Scan the sequential bit stream for the start signature. Embedding
        // begins on a sample boundary, so only group-aligned offsets match.
        let stream = collect_stream(samples, depth);
        let sig = signature_for_depth(depth).ok()?;
        let mut at = 0usize;
        while at + sig.start.len() <= stream.len() {
            if stream[at..at + sig.start.len()] == *sig.start {
                if let Some(found) = parse_signed_bits(&stream[at..], depth, key) {
                    return Some(found);
                }
            }
            at += depth as usize;
        }
        None
    }
}

fn parse_signed_bits(bits: &[u8], lsb_depth: u8, key: &str) -> Option<Extracted> {
    let rest = strip_start_signature(bits, lsb_depth).ok()?;

    // Cheap plausibility check on the length prefix before converting the
    // whole run; the sequential scan calls this per candidate offset.
    if rest.len() < 64 {
        return None;
    }
    let head = bits_to_bytes(&rest[..64]);
    let metadata_len = u32::from_le_bytes(head[..4].try_into().ok()?) as usize;
    if metadata_len > MAX_METADATA_LEN || (4 + metadata_len + 4) * 8 > rest.len() {
        return None;
    }

    let bytes = bits_to_bytes(rest);
    let lengths = validate_lengths(&bytes).ok()?;

    // Verify the end signature when enough bits follow the frame.
    let sig = signature_for_depth(lsb_depth).ok()?;
    let end_at = lengths.total() * 8;
    if rest.len() >= end_at + sig.end.len() && rest[end_at..end_at + sig.end.len()] != *sig.end {
        return None;
    }

    finish_extract(&bytes, key)
}

// --- quant mode ---

/// Embed a secret by quantization steering in the eligible sample band.
pub fn embed_quant(
    samples: &[i16],
    secret: &[u8],
    metadata: &FileMetadata,
    config: &EmbedConfig,
    bitrate: u32,
) -> Result<SampleStego, StegoError> {
    config.validate()?;
    if samples.is_empty() {
        return Err(StegoError::EmptySignal);
    }
    if secret.is_empty() {
        return Err(StegoError::FormatError);
    }

    let band = band_indices(samples.len());
    if band.is_empty() {
        return Err(StegoError::InsufficientCarrier);
    }

    let payload = seal_payload(secret, config);
    let record = stamped_metadata(metadata, config, payload.len()).serialize();
    let bits = bytes_to_bits(&frame_payload(&record, &payload));

    let digest = key_digest(&config.key);
    let positions = generate_positions(
        &digest,
        config.use_random_positions,
        band.len(),
        config.lsb_depth,
    )?;

    let mut stego = samples.to_vec();
    embed_bits_quant(&mut stego, &band, &positions, &bits, bitrate)?;

    let psnr_db = psnr(samples, &stego)?;
    Ok(SampleStego { samples: stego, psnr_db })
}

/// Extract a quantization-steered secret via the brute-force grid.
pub fn extract_quant(samples: &[i16], key: &str, bitrate: u32) -> Result<Extracted, StegoError> {
    validate_key(key)?;
    if samples.is_empty() {
        return Err(StegoError::EmptySignal);
    }

    let band = band_indices(samples.len());
    if band.is_empty() {
        return Err(StegoError::InsufficientCarrier);
    }

    let digest = key_digest(key);
    search_grid(|candidate| {
        let positions = generate_positions(
            &digest,
            candidate.use_random_positions,
            band.len(),
            candidate.lsb_depth,
        )
        .ok()?;
        // One bit per position regardless of candidate depth.
        let max_bytes = positions.len() / 8;
        let run = staged_run(max_bytes, |n| {
            extract_bits_quant(samples, &band, &positions, n, bitrate)
        })?;
        finish_extract(&run, key)
    })
}

// --- smart extraction ---

/// Try all three modes in order of likelihood.
///
/// Bitstream embedding is the default mode; the quantization variant is
/// next because it is what survives a re-encode; plain sample LSB last.
pub fn smart_extract(
    mp3_bytes: &[u8],
    samples: &[i16],
    key: &str,
    bitrate: u32,
) -> Result<Extracted, StegoError> {
    if let Ok(found) = extract_bitstream(mp3_bytes, key) {
        return Ok(found);
    }
    if let Ok(found) = extract_quant(samples, key, bitrate) {
        return Ok(found);
    }
    extract_samples(samples, key)
}

// --- shared helpers ---

fn cap_segment(positions: &[usize]) -> &[usize] {
    if positions.len() > SEGMENT_THRESHOLD {
        &positions[..SEGMENT_CAP]
    } else {
        positions
    }
}

fn seal_payload(secret: &[u8], config: &EmbedConfig) -> Vec<u8> {
    if config.use_encryption {
        cipher::encrypt(secret, &config.key)
    } else {
        secret.to_vec()
    }
}

/// Stamp the caller's metadata with the parameters actually used, so the
/// extracted record describes the embedding it arrived in.
fn stamped_metadata(metadata: &FileMetadata, config: &EmbedConfig, data_size: usize) -> FileMetadata {
    FileMetadata {
        use_encryption: config.use_encryption,
        use_random_positions: config.use_random_positions,
        lsb_depth: config.lsb_depth,
        data_size: data_size as u64,
        ..metadata.clone()
    }
}

/// Progressive frame read: a bounded probe for the metadata length, a
/// second read up to the secret length prefix, then the exact total.
/// `read(n)` extracts the first `n` bytes of the candidate's byte run.
fn staged_run(max_bytes: usize, read: impl Fn(usize) -> Vec<u8>) -> Option<Vec<u8>> {
    // 1. Probe.
    let probe = read(PROBE_BYTES.min(max_bytes));
    if probe.len() < 8 {
        return None;
    }
    let metadata_len = u32::from_le_bytes(probe[..4].try_into().ok()?) as usize;
    if metadata_len > MAX_METADATA_LEN {
        return None;
    }

    // 2. Widen until the secret length prefix is visible.
    let prefix_end = 4 + metadata_len + 4;
    if prefix_end > max_bytes {
        return None;
    }
    let run = if probe.len() >= prefix_end {
        probe
    } else {
        read((prefix_end + META_SLACK).min(max_bytes))
    };
    if run.len() < prefix_end {
        return None;
    }
    let at = 4 + metadata_len;
    let secret_len = u32::from_le_bytes(run[at..at + 4].try_into().ok()?) as usize;
    let total = prefix_end + secret_len;
    if secret_len == 0 || total > max_bytes {
        return None;
    }

    // 3. Exact frame.
    let full = if run.len() >= total { run } else { read(total) };
    (full.len() >= total).then_some(full)
}

/// Unframe a byte run, parse the metadata record and apply the cipher per
/// its encryption flag.
fn finish_extract(run: &[u8], key: &str) -> Option<Extracted> {
    let frame = unframe_payload(run).ok()?;
    let metadata = FileMetadata::parse(frame.metadata).ok()?;
    let secret = if metadata.use_encryption {
        cipher::decrypt(frame.secret, key)
    } else {
        frame.secret.to_vec()
    };
    Some(Extracted { metadata, secret })
}

/// Read the low `depth` bits of every positioned unit, in order.
fn collect_bits<T: CarrierUnit>(carrier: &[T], positions: &[usize], depth: u8) -> Vec<u8> {
    let mut bits = Vec::with_capacity(positions.len() * depth as usize);
    for &pos in positions {
        if pos >= carrier.len() {
            continue;
        }
        for i in 0..depth {
            bits.push(carrier[pos].bit(i));
        }
    }
    bits
}

/// Read the low `depth` bits of every unit of the carrier, in order.
fn collect_stream<T: CarrierUnit>(carrier: &[T], depth: u8) -> Vec<u8> {
    let mut bits = Vec::with_capacity(carrier.len() * depth as usize);
    for &unit in carrier {
        for i in 0..depth {
            bits.push(unit.bit(i));
        }
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_mp3(len: usize) -> Vec<u8> {
        let mut data = vec![0x40u8; len];
        let mut i = mp3::SKIP_START;
        while i + 4 < len {
            data[i] = 0xFF;
            data[i + 1] = 0xFB;
            data[i + 2] = 0x90;
            data[i + 3] = 0x00;
            i += 418;
        }
        data
    }

    fn synthetic_samples(len: usize) -> Vec<i16> {
        (0..len).map(|i| (((i * 37) % 24_000) as i32 - 12_000) as i16).collect()
    }

    fn config(depth: u8, random: bool, encrypt: bool) -> EmbedConfig {
        EmbedConfig {
            key: "test-key-123".into(),
            lsb_depth: depth,
            use_random_positions: random,
            use_encryption: encrypt,
        }
    }

    fn metadata() -> FileMetadata {
        FileMetadata {
            original_filename: "notes.txt".into(),
            file_extension: ".txt".into(),
            file_size: 20,
            use_encryption: false,
            use_random_positions: false,
            lsb_depth: 1,
            data_size: 0,
        }
    }

    #[test]
    fn bitstream_roundtrip_all_parameter_cells() {
        let carrier = synthetic_mp3(80_000);
        let secret = b"attack at dawn. bring coffee.";
        for depth in 1..=4u8 {
            for random in [false, true] {
                let cfg = config(depth, random, false);
                let stego = embed_bitstream(&carrier, secret, &metadata(), &cfg).unwrap();
                let found = extract_bitstream(&stego, &cfg.key).unwrap();
                assert_eq!(found.secret, secret.to_vec(), "depth {depth} random {random}");
                assert_eq!(found.metadata.lsb_depth, depth);
                assert_eq!(found.metadata.use_random_positions, random);
                assert_eq!(found.metadata.original_filename, "notes.txt");
            }
        }
    }

    #[test]
    fn bitstream_roundtrip_encrypted() {
        let carrier = synthetic_mp3(80_000);
        let secret = b"ciphered payload";
        let cfg = config(2, true, true);
        let stego = embed_bitstream(&carrier, secret, &metadata(), &cfg).unwrap();
        let found = extract_bitstream(&stego, &cfg.key).unwrap();
        assert!(found.metadata.use_encryption);
        assert_eq!(found.secret, secret.to_vec());
    }

    #[test]
    fn bitstream_wrong_key_does_not_recover_secret() {
        let carrier = synthetic_mp3(80_000);
        let secret = b"for the right key only";
        let cfg = config(2, true, true);
        let stego = embed_bitstream(&carrier, secret, &metadata(), &cfg).unwrap();
        let result = extract_bitstream(&stego, "not-the-key");
        assert_ne!(result.map(|e| e.secret), Ok(secret.to_vec()));
    }

    #[test]
    fn bitstream_grid_fallback_when_header_destroyed() {
        let carrier = synthetic_mp3(80_000);
        let secret = b"recoverable without header";
        let cfg = config(2, false, false);
        let mut stego = embed_bitstream(&carrier, secret, &metadata(), &cfg).unwrap();

        // Wipe the header bits; extraction must fall back to the grid.
        let eligible = mp3::find_embeddable_positions(&stego);
        for &p in &eligible[..HEADER_POSITIONS] {
            stego[p] &= !1;
        }

        let found = extract_bitstream(&stego, &cfg.key).unwrap();
        assert_eq!(found.secret, secret.to_vec());
    }

    #[test]
    fn bitstream_carrier_untouched_outside_positions() {
        let carrier = synthetic_mp3(80_000);
        let cfg = config(1, false, false);
        let stego = embed_bitstream(&carrier, b"x", &metadata(), &cfg).unwrap();
        assert_eq!(stego.len(), carrier.len());
        // Only low bits may differ.
        for (a, b) in carrier.iter().zip(&stego) {
            assert_eq!(a & 0xFE, b & 0xFE);
        }
        // The skipped prefix is byte-identical.
        assert_eq!(&stego[..mp3::SKIP_START], &carrier[..mp3::SKIP_START]);
    }

    #[test]
    fn bitstream_tiny_carrier_rejected() {
        let cfg = config(1, false, false);
        assert!(matches!(
            embed_bitstream(&[0u8; 64], b"s", &metadata(), &cfg),
            Err(StegoError::InsufficientCarrier)
        ));
    }

    #[test]
    fn sample_roundtrip_sequential_and_random() {
        let samples = synthetic_samples(60_000);
        let secret = b"pcm domain secret";
        for depth in 1..=4u8 {
            for random in [false, true] {
                let cfg = config(depth, random, false);
                let out = embed_samples(&samples, secret, &metadata(), &cfg).unwrap();
                assert!(out.psnr_db > 30.0, "depth {depth}: psnr {}", out.psnr_db);
                let found = extract_samples(&out.samples, &cfg.key).unwrap();
                assert_eq!(found.secret, secret.to_vec(), "depth {depth} random {random}");
                assert_eq!(found.metadata.lsb_depth, depth);
            }
        }
    }

    #[test]
    fn sample_roundtrip_encrypted() {
        let samples = synthetic_samples(60_000);
        let secret = b"binary \x00\x01\xFF bytes";
        let cfg = config(2, false, true);
        let out = embed_samples(&samples, secret, &metadata(), &cfg).unwrap();
        let found = extract_samples(&out.samples, &cfg.key).unwrap();
        assert_eq!(found.secret, secret.to_vec());
    }

    #[test]
    fn sample_capacity_error_leaves_no_output() {
        let samples = synthetic_samples(100);
        let secret = vec![0xA5u8; 1_000];
        let cfg = config(1, false, false);
        assert!(matches!(
            embed_samples(&samples, &secret, &metadata(), &cfg),
            Err(StegoError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn quant_roundtrip() {
        let samples = synthetic_samples(80_000);
        let secret = b"survives the re-encode";
        for random in [false, true] {
            let cfg = config(2, random, false);
            let out = embed_quant(&samples, secret, &metadata(), &cfg, 320).unwrap();
            let found = extract_quant(&out.samples, &cfg.key, 320).unwrap();
            assert_eq!(found.secret, secret.to_vec(), "random {random}");
        }
    }

    #[test]
    fn smart_extract_falls_through_to_samples() {
        let carrier = synthetic_mp3(80_000);
        let samples = synthetic_samples(60_000);
        let secret = b"third mode lucky";
        let cfg = config(1, false, false);
        let out = embed_samples(&samples, secret, &metadata(), &cfg).unwrap();

        let found = smart_extract(&carrier, &out.samples, &cfg.key, 192).unwrap();
        assert_eq!(found.secret, secret.to_vec());
    }

    #[test]
    fn smart_extract_prefers_bitstream() {
        let carrier = synthetic_mp3(80_000);
        let secret = b"first mode";
        let cfg = config(1, false, false);
        let stego = embed_bitstream(&carrier, secret, &metadata(), &cfg).unwrap();

        let found = smart_extract(&stego, &[], &cfg.key, 192).unwrap();
        assert_eq!(found.secret, secret.to_vec());
    }

    #[test]
    fn config_validation_precedes_carrier_work() {
        let bad_key = EmbedConfig { key: String::new(), ..config(1, false, false) };
        assert!(matches!(
            embed_bitstream(&[], b"s", &metadata(), &bad_key),
            Err(StegoError::InvalidKey)
        ));
        let bad_depth = config(5, false, false);
        assert!(matches!(
            embed_samples(&[0i16; 10], b"s", &metadata(), &bad_depth),
            Err(StegoError::InvalidDepth(5))
        ));
    }

    #[test]
    fn clean_carrier_extraction_fails() {
        let carrier = synthetic_mp3(80_000);
        assert!(extract_bitstream(&carrier, "some-key").is_err());
        let samples = synthetic_samples(20_000);
        assert!(extract_samples(&samples, "some-key").is_err());
    }
}
