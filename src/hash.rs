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

//! Checksum functionality for framed Snappy streams.
//!
//! Every data chunk carries a masked CRC-32C (Castagnoli) of its decoded bytes.
//! The lookup table is built at compile time and shared read-only.

use crc::{Crc, CRC_32_ISCSI};

use crate::constants::CHECKSUM_MASK_DELTA;

/// CRC-32C (Castagnoli) engine used for chunk checksums.
const CASTAGNOLI: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

/// Calculate the unmasked CRC-32C of a block of decoded bytes.
pub fn crc32c(data: &[u8]) -> u32 {
    CASTAGNOLI.checksum(data)
}

/// Mask a CRC so that checksums of data containing embedded CRCs stay well distributed.
///
/// This is a fixed transform required for interoperability, not a security measure.
pub fn mask_checksum(crc: u32) -> u32 {
    crc.rotate_right(15).wrapping_add(CHECKSUM_MASK_DELTA)
}

/// Exact inverse of [`mask_checksum`].
pub fn unmask_checksum(masked: u32) -> u32 {
    masked.wrapping_sub(CHECKSUM_MASK_DELTA).rotate_left(15)
}

/// Masked CRC-32C of `data`, the value stored in a data chunk.
pub fn block_checksum(data: &[u8]) -> u32 {
    mask_checksum(crc32c(data))
}
