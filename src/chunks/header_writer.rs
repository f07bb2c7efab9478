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

//! Writer for chunk headers.
//!
//! Data chunks are written as an 8 byte prefix (the 4 byte chunk header plus
//! the 4 byte masked checksum) followed by the block bytes.

use byteorder::{ByteOrder, LittleEndian};

use crate::chunks::header::{ChunkHeader, ChunkType, CHUNK_HEADER_SIZE};
use crate::constants::{CHECKSUM_SIZE, MAX_CHUNK_LENGTH};
use crate::error::{FramedError, Result};

/// Size of the header plus checksum that precedes every data block.
pub const DATA_CHUNK_PREFIX_SIZE: usize = CHUNK_HEADER_SIZE + CHECKSUM_SIZE;

/// Serializes a chunk header into `dst`.
///
/// # Errors
///
/// Returns an error if the length does not fit the 24-bit length field.
pub fn write_chunk_header(header: &ChunkHeader, dst: &mut [u8; CHUNK_HEADER_SIZE]) -> Result<()> {
    if header.length > MAX_CHUNK_LENGTH {
        return Err(FramedError::InvalidChunkHeader(format!(
            "chunk length {} does not fit in 24 bits",
            header.length
        )));
    }

    dst[0] = header.chunk_type.tag();
    LittleEndian::write_u24(&mut dst[1..], header.length as u32);
    Ok(())
}

/// Serializes the header and masked checksum of a data chunk into `dst`.
///
/// `block_len` is the number of block bytes (compressed or literal) that will
/// follow the prefix; the header's length field also counts the checksum.
pub fn write_data_chunk_prefix(
    chunk_type: ChunkType,
    block_len: usize,
    masked_checksum: u32,
    dst: &mut [u8; DATA_CHUNK_PREFIX_SIZE],
) -> Result<()> {
    debug_assert!(chunk_type.is_data());

    let header = ChunkHeader::new(chunk_type, block_len + CHECKSUM_SIZE);
    let mut header_bytes = [0u8; CHUNK_HEADER_SIZE];
    write_chunk_header(&header, &mut header_bytes)?;

    dst[..CHUNK_HEADER_SIZE].copy_from_slice(&header_bytes);
    LittleEndian::write_u32(&mut dst[CHUNK_HEADER_SIZE..], masked_checksum);
    Ok(())
}
