// Copyright (c) 2026 the echoveil authors
// SPDX-License-Identifier: GPL-3.0-only

//! # echoveil
//!
//! Steganography engine for hiding arbitrary files in MP3 audio. Provides
//! three embedding modes:
//!
//! - **Bitstream**: LSB manipulation of the compressed MP3 bytes with
//!   frame-sync avoidance. Highest capacity.
//! - **Sample**: LSB manipulation of decoded PCM samples with bit
//!   signatures for blind parameter recovery.
//! - **Quant**: codec-aware quantization steering, built to survive a
//!   lossy re-encode.
//!
//! All processing operates on in-memory buffers; MP3 decode/encode and
//! ID3 tag storage are collaborator traits (`stego::codec`). Extraction
//! needs only the stego file and the shared key: embedding parameters are
//! either read from an in-band header or brute-forced over the small
//! parameter grid.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use echoveil::{embed_bitstream, extract_bitstream, EmbedConfig, FileMetadata};
//!
//! let carrier = std::fs::read("song.mp3").unwrap();
//! let config = EmbedConfig {
//!     key: "shared-key".into(),
//!     lsb_depth: 2,
//!     use_random_positions: true,
//!     use_encryption: true,
//! };
//! let metadata = FileMetadata {
//!     original_filename: "notes.txt".into(),
//!     file_extension: ".txt".into(),
//!     file_size: 10,
//!     use_encryption: true,
//!     use_random_positions: true,
//!     lsb_depth: 2,
//!     data_size: 0,
//! };
//! let stego = embed_bitstream(&carrier, b"the secret", &metadata, &config).unwrap();
//! let found = extract_bitstream(&stego, "shared-key").unwrap();
//! assert_eq!(found.secret, b"the secret");
//! ```

pub mod mp3;
pub mod stego;

pub use stego::{
    embed_bitstream, embed_quant, embed_samples, extract_bitstream, extract_quant,
    extract_samples, smart_extract, EmbedConfig, Extracted, FileMetadata, ParameterHeader,
    SampleStego, StegoError,
};
pub use stego::{is_acceptable, psnr, QualityRating};
