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

//! Parser for chunk headers.

use byteorder::{ByteOrder, LittleEndian};

use crate::chunks::header::{ChunkHeader, ChunkType, CHUNK_HEADER_SIZE};

/// Parses a 4 byte chunk header.
///
/// Every tag maps to some [`ChunkType`] and every 24-bit length is
/// representable, so parsing itself cannot fail. Deciding whether the
/// declared length is acceptable is left to the caller, which knows the
/// chunk type.
///
/// # Example
///
/// ```
/// use snapframe::chunks::{parse_chunk_header, ChunkType};
///
/// let header = parse_chunk_header(&[0x01, 0x08, 0x00, 0x00]);
/// assert_eq!(header.chunk_type, ChunkType::Uncompressed);
/// assert_eq!(header.length, 8);
/// ```
pub fn parse_chunk_header(bytes: &[u8; CHUNK_HEADER_SIZE]) -> ChunkHeader {
    let chunk_type = ChunkType::from_tag(bytes[0]);
    let length = LittleEndian::read_u24(&bytes[1..]) as usize;
    ChunkHeader::new(chunk_type, length)
}
