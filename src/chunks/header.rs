// Copyright 2024
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Common definitions for chunk headers.
//!
//! Every chunk starts with a 4 byte header: a 1 byte tag followed by the
//! payload length as a 3 byte little-endian integer.

use crate::constants::{
    RESERVED_SKIPPABLE_END, RESERVED_SKIPPABLE_START, RESERVED_UNSKIPPABLE_END,
    RESERVED_UNSKIPPABLE_START, TAG_COMPRESSED, TAG_PADDING, TAG_STREAM_IDENTIFIER,
    TAG_UNCOMPRESSED,
};

pub use crate::constants::CHUNK_HEADER_SIZE;

/// Enumeration of chunk types.
///
/// Every possible tag byte maps to exactly one variant, so dispatch on a
/// parsed header never needs to look at raw tag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkType {
    /// Stream identifier chunk (0xff)
    StreamIdentifier,
    /// Compressed data chunk (0x00)
    Compressed,
    /// Uncompressed data chunk (0x01)
    Uncompressed,
    /// Padding chunk (0xfe)
    Padding,
    /// Reserved chunk a decoder may skip (0x80-0xfd)
    ReservedSkippable(u8),
    /// Reserved chunk a decoder must reject (0x02-0x7f)
    ReservedUnskippable(u8),
}

impl ChunkType {
    /// Convert a tag byte to its ChunkType.
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            TAG_COMPRESSED => ChunkType::Compressed,
            TAG_UNCOMPRESSED => ChunkType::Uncompressed,
            TAG_PADDING => ChunkType::Padding,
            TAG_STREAM_IDENTIFIER => ChunkType::StreamIdentifier,
            RESERVED_SKIPPABLE_START..=RESERVED_SKIPPABLE_END => ChunkType::ReservedSkippable(tag),
            RESERVED_UNSKIPPABLE_START..=RESERVED_UNSKIPPABLE_END => {
                ChunkType::ReservedUnskippable(tag)
            }
        }
    }

    /// Convert the ChunkType to its tag byte.
    pub fn tag(&self) -> u8 {
        match *self {
            ChunkType::StreamIdentifier => TAG_STREAM_IDENTIFIER,
            ChunkType::Compressed => TAG_COMPRESSED,
            ChunkType::Uncompressed => TAG_UNCOMPRESSED,
            ChunkType::Padding => TAG_PADDING,
            ChunkType::ReservedSkippable(tag) | ChunkType::ReservedUnskippable(tag) => tag,
        }
    }

    /// Whether the chunk carries a checksummed data block.
    pub fn is_data(&self) -> bool {
        matches!(self, ChunkType::Compressed | ChunkType::Uncompressed)
    }

    /// Whether a decoder should read past the chunk without interpreting it.
    pub fn is_skippable(&self) -> bool {
        matches!(self, ChunkType::Padding | ChunkType::ReservedSkippable(_))
    }
}

/// A parsed chunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Type of the chunk
    pub chunk_type: ChunkType,
    /// Number of payload bytes following the header
    pub length: usize,
}

impl ChunkHeader {
    /// Creates a new ChunkHeader.
    pub fn new(chunk_type: ChunkType, length: usize) -> Self {
        ChunkHeader { chunk_type, length }
    }
}
