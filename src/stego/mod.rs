// Copyright (c) 2026 the echoveil authors
// SPDX-License-Identifier: GPL-3.0-only

//! Steganographic embedding and extraction for MP3 carriers.
//!
//! Three embedding modes share one payload frame format, key handling and
//! position generation:
//!
//! - **Bitstream** (`embed_bitstream` / `extract_bitstream`): low bits of
//!   the compressed MP3 bytes, frame-sync headers avoided, parameters
//!   declared in an in-band header. Highest capacity; does not survive
//!   re-encoding.
//! - **Sample** (`embed_samples` / `extract_samples`): low bits of decoded
//!   PCM samples, payload wrapped in depth-specific bit signatures for
//!   blind recovery.
//! - **Quant** (`embed_quant` / `extract_quant`): codec-aware quantization
//!   steering in a mid-band of samples. Lowest capacity; designed to
//!   survive a lossy re-encode.
//!
//! `smart_extract` chains all three. When no valid parameter header is
//! present, extraction brute-forces the 4x2 parameter grid ([`recover`]).

pub mod bits;
pub mod cipher;
pub mod codec;
pub mod error;
pub mod frame;
pub mod header;
pub mod key;
pub mod payload;
mod pipeline;
pub mod positions;
pub mod psnr;
pub mod quant;
pub mod recover;

pub use error::StegoError;
pub use header::ParameterHeader;
pub use payload::FileMetadata;
pub use pipeline::{
    embed_bitstream, embed_quant, embed_samples, extract_bitstream, extract_quant,
    extract_samples, smart_extract, EmbedConfig, Extracted, SampleStego,
};
pub use psnr::{is_acceptable, psnr, QualityRating};
