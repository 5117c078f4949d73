// Copyright (c) 2026 the echoveil authors
// SPDX-License-Identifier: GPL-3.0-only

//! External codec and tag-store contracts.
//!
//! Decoding MP3 to PCM, re-encoding, and ID3 tag manipulation are the
//! caller's concern (typically a LAME/minimp3 binding or an external
//! process). The pipelines only need the two seams defined here, plus the
//! JSON metadata marshalling that the tag side-channel variant stores
//! under a `TXXX` user-text frame.

use crate::stego::payload::FileMetadata;

/// Tag field name the metadata side-channel record is stored under.
pub const METADATA_FIELD: &str = "STEGO_METADATA";

/// Errors from external codec and tag collaborators.
pub type CodecError = Box<dyn std::error::Error + Send + Sync>;

/// Decoded PCM audio as the sample-domain pipelines consume it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAudio {
    /// Interleaved 16-bit samples.
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
    /// Target bitrate in kbps, drives the quantization step.
    pub bitrate: u32,
}

/// An MP3 decoder/encoder pair.
pub trait AudioCodec {
    fn decode(&self, mp3_bytes: &[u8]) -> Result<DecodedAudio, CodecError>;
    fn encode(&self, audio: &DecodedAudio) -> Result<Vec<u8>, CodecError>;
}

/// User-text tag storage on an MP3 file.
///
/// `store_field` returns the rewritten file; tag frames change the byte
/// layout, so the result replaces the input rather than patching it.
pub trait TagStore {
    fn store_field(
        &mut self,
        mp3_bytes: &[u8],
        field: &str,
        value: &str,
    ) -> Result<Vec<u8>, CodecError>;

    fn retrieve_field(&self, mp3_bytes: &[u8], field: &str) -> Result<Option<String>, CodecError>;
}

/// Store the JSON metadata record under [`METADATA_FIELD`].
pub fn store_metadata<S: TagStore + ?Sized>(
    store: &mut S,
    mp3_bytes: &[u8],
    metadata: &FileMetadata,
) -> Result<Vec<u8>, CodecError> {
    store.store_field(mp3_bytes, METADATA_FIELD, &metadata.to_json())
}

/// Retrieve and parse the JSON metadata record, `None` when the field is
/// absent.
pub fn retrieve_metadata<S: TagStore + ?Sized>(
    store: &S,
    mp3_bytes: &[u8],
) -> Result<Option<FileMetadata>, CodecError> {
    match store.retrieve_field(mp3_bytes, METADATA_FIELD)? {
        Some(json) => Ok(Some(FileMetadata::from_json(&json)?)),
        None => Ok(None),
    }
}
