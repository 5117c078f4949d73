// Copyright (c) 2026 the echoveil authors
// SPDX-License-Identifier: GPL-3.0-only

//! File metadata record.
//!
//! Describes the secret file so extraction can restore its name, extension
//! and exact size. Two serializations exist:
//!
//! - the compact in-band record embedded ahead of the secret:
//!
//! ```text
//! [1 byte ] filename length
//! [N bytes] filename (UTF-8)
//! [1 byte ] extension length
//! [M bytes] extension (UTF-8)
//! [8 bytes] original file size (u64 LE)
//! [1 byte ] flags: bit0 = encryption, bit1 = random positions
//! [1 byte ] LSB depth
//! [8 bytes] embedded payload size (u64 LE)
//! ```
//!
//! - a JSON document for the ID3 tag side-channel variant, stored under a
//!   `TXXX` user-text frame by a [`TagStore`](crate::stego::codec::TagStore)
//!   collaborator.

use serde::{Deserialize, Serialize};

use crate::stego::error::StegoError;

const FLAG_ENCRYPTION: u8 = 1;
const FLAG_RANDOM: u8 = 2;

/// Metadata describing an embedded secret file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub original_filename: String,
    pub file_extension: String,
    pub file_size: u64,
    pub use_encryption: bool,
    #[serde(rename = "use_random_seed")]
    pub use_random_positions: bool,
    #[serde(rename = "n_lsb")]
    pub lsb_depth: u8,
    /// Size of the payload as embedded (after optional encryption).
    #[serde(rename = "data_size", default)]
    pub data_size: u64,
}

impl FileMetadata {
    /// Serialize to the compact in-band record.
    ///
    /// Filename and extension are truncated to 255 bytes (the length
    /// prefix is one byte).
    pub fn serialize(&self) -> Vec<u8> {
        let name = clip(self.original_filename.as_bytes());
        let ext = clip(self.file_extension.as_bytes());

        let mut out = Vec::with_capacity(1 + name.len() + 1 + ext.len() + 19);
        out.push(name.len() as u8);
        out.extend_from_slice(name);
        out.push(ext.len() as u8);
        out.extend_from_slice(ext);
        out.extend_from_slice(&self.file_size.to_le_bytes());

        let mut flags = 0u8;
        if self.use_encryption {
            flags |= FLAG_ENCRYPTION;
        }
        if self.use_random_positions {
            flags |= FLAG_RANDOM;
        }
        out.push(flags);
        out.push(self.lsb_depth);
        out.extend_from_slice(&self.data_size.to_le_bytes());
        out
    }

    /// Parse the compact in-band record.
    pub fn parse(data: &[u8]) -> Result<Self, StegoError> {
        let mut cursor = Cursor { data, at: 0 };

        let name_len = cursor.byte()? as usize;
        let name = cursor.take(name_len)?;
        let ext_len = cursor.byte()? as usize;
        let ext = cursor.take(ext_len)?;
        let file_size = u64::from_le_bytes(cursor.take(8)?.try_into().expect("8-byte slice"));
        let flags = cursor.byte()?;
        let lsb_depth = cursor.byte()?;
        let data_size = u64::from_le_bytes(cursor.take(8)?.try_into().expect("8-byte slice"));

        Ok(Self {
            original_filename: String::from_utf8(name.to_vec()).map_err(|_| StegoError::FormatError)?,
            file_extension: String::from_utf8(ext.to_vec()).map_err(|_| StegoError::FormatError)?,
            file_size,
            use_encryption: flags & FLAG_ENCRYPTION != 0,
            use_random_positions: flags & FLAG_RANDOM != 0,
            lsb_depth,
            data_size,
        })
    }

    /// Serialize to the JSON record used by the tag side-channel variant.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("metadata serializes to JSON")
    }

    /// Parse the JSON record from the tag side-channel variant.
    pub fn from_json(json: &str) -> Result<Self, StegoError> {
        serde_json::from_str(json).map_err(|_| StegoError::FormatError)
    }
}

/// Truncate a byte string to the 255-byte prefix limit, respecting the
/// original byte content (no UTF-8 boundary adjustment: the record stores
/// raw bytes and parse re-validates).
fn clip(bytes: &[u8]) -> &[u8] {
    &bytes[..bytes.len().min(255)]
}

struct Cursor<'a> {
    data: &'a [u8],
    at: usize,
}

impl<'a> Cursor<'a> {
    fn byte(&mut self) -> Result<u8, StegoError> {
        let b = *self.data.get(self.at).ok_or(StegoError::FormatError)?;
        self.at += 1;
        Ok(b)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], StegoError> {
        if self.at + n > self.data.len() {
            return Err(StegoError::FormatError);
        }
        let slice = &self.data[self.at..self.at + n];
        self.at += n;
        Ok(slice)
    }
}
