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

//! Constants used in the Snappy framing format.

/// Maximum number of decoded bytes a single data chunk may carry (64 KiB).
pub const MAX_BLOCK_SIZE: usize = 1 << 16;

/// Worst-case size of a Snappy-compressed block of `MAX_BLOCK_SIZE` bytes.
///
/// Matches `32 + n + n / 6`, the bound Snappy gives for compressing `n` bytes.
pub const MAX_ENCODED_BLOCK_SIZE: usize = 32 + MAX_BLOCK_SIZE + MAX_BLOCK_SIZE / 6;

/// Size of the masked checksum prefixed to every data chunk payload.
pub const CHECKSUM_SIZE: usize = 4;

/// Largest payload length accepted for a compressed or uncompressed chunk.
pub const MAX_DATA_CHUNK_LENGTH: usize = MAX_ENCODED_BLOCK_SIZE + CHECKSUM_SIZE;

/// Size of a chunk header in bytes: 1 byte tag + 3 byte little-endian length.
pub const CHUNK_HEADER_SIZE: usize = 4;

/// Largest value the 24-bit length field can hold.
pub const MAX_CHUNK_LENGTH: usize = (1 << 24) - 1;

/// Chunk tag for compressed data.
pub const TAG_COMPRESSED: u8 = 0x00;

/// Chunk tag for uncompressed (literal) data.
pub const TAG_UNCOMPRESSED: u8 = 0x01;

/// Chunk tag for padding.
pub const TAG_PADDING: u8 = 0xfe;

/// Chunk tag for the stream identifier.
pub const TAG_STREAM_IDENTIFIER: u8 = 0xff;

/// First tag of the reserved unskippable range.
pub const RESERVED_UNSKIPPABLE_START: u8 = 0x02;

/// Last tag of the reserved unskippable range.
pub const RESERVED_UNSKIPPABLE_END: u8 = 0x7f;

/// First tag of the reserved skippable range.
pub const RESERVED_SKIPPABLE_START: u8 = 0x80;

/// Last tag of the reserved skippable range.
pub const RESERVED_SKIPPABLE_END: u8 = 0xfd;

/// Payload of the stream identifier chunk.
pub const STREAM_IDENTIFIER_PAYLOAD: [u8; 6] = *b"sNaPpY";

/// The complete stream identifier chunk (header followed by payload).
///
/// Every stream starts with these 10 bytes.
pub const STREAM_IDENTIFIER: [u8; CHUNK_HEADER_SIZE + 6] = [
    TAG_STREAM_IDENTIFIER, 0x06, 0x00, 0x00, b's', b'N', b'a', b'P', b'p', b'Y',
];

/// Constant added to the rotated CRC when masking a checksum.
pub const CHECKSUM_MASK_DELTA: u32 = 0xa282_ead8;

/// Media type identifying a framed Snappy stream, for content negotiation.
pub const MEDIA_TYPE: &str = "application/x-snappy-framed";
