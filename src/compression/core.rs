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

//! The block codec contract consumed by the encoder and decoder.

use crate::error::Result;

/// A block-level compression primitive.
///
/// The framing layer never compresses anything itself; it hands each block
/// (at most `MAX_BLOCK_SIZE` bytes) to a codec and decides from the result
/// whether to store the block compressed or literal.
///
/// Implementations keep whatever internal state they need between calls; the
/// output buffers are owned by the caller so that they can be reused.
pub trait BlockCodec {
    /// Compresses `raw`, replacing the contents of `dst` with the encoded bytes.
    ///
    /// Returning an encoded length that is not smaller than `raw.len()` is
    /// allowed and simply means the block will be stored uncompressed.
    fn compress(&mut self, raw: &[u8], dst: &mut Vec<u8>) -> Result<usize>;

    /// Reports the decoded length of `encoded` without decoding it.
    ///
    /// Fails if the encoded header is malformed.
    fn decompressed_len(&self, encoded: &[u8]) -> Result<usize>;

    /// Decodes `encoded`, replacing the contents of `dst` with the raw bytes.
    ///
    /// Fails on malformed input.
    fn decompress(&mut self, encoded: &[u8], dst: &mut Vec<u8>) -> Result<usize>;
}

impl<C: BlockCodec + ?Sized> BlockCodec for Box<C> {
    fn compress(&mut self, raw: &[u8], dst: &mut Vec<u8>) -> Result<usize> {
        (**self).compress(raw, dst)
    }

    fn decompressed_len(&self, encoded: &[u8]) -> Result<usize> {
        (**self).decompressed_len(encoded)
    }

    fn decompress(&mut self, encoded: &[u8], dst: &mut Vec<u8>) -> Result<usize> {
        (**self).decompress(encoded, dst)
    }
}
