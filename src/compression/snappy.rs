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

//! Snappy block codec backed by the `snap` crate.
//!
//! Uses the raw (unframed) Snappy block format; framing is done by this crate.

use std::fmt;

use snap::raw::{decompress_len, max_compress_len, Decoder, Encoder};

use crate::compression::core::BlockCodec;
use crate::error::{FramedError, Result};

/// Snappy block codec.
///
/// Holds the `snap` encoder and decoder so their internal tables are reused
/// across blocks.
pub struct SnappyCodec {
    encoder: Encoder,
    decoder: Decoder,
}

impl SnappyCodec {
    /// Create a new SnappyCodec.
    pub fn new() -> Self {
        Self {
            encoder: Encoder::new(),
            decoder: Decoder::new(),
        }
    }
}

impl Default for SnappyCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SnappyCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnappyCodec").finish_non_exhaustive()
    }
}

impl BlockCodec for SnappyCodec {
    fn compress(&mut self, raw: &[u8], dst: &mut Vec<u8>) -> Result<usize> {
        let bound = max_compress_len(raw.len());
        if bound == 0 {
            return Err(FramedError::BlockEncode(format!(
                "input of {} bytes is too large for snappy",
                raw.len()
            )));
        }

        // Reuse the existing allocation; only grow when the bound requires it.
        dst.resize(bound, 0);
        match self.encoder.compress(raw, dst) {
            Ok(written) => {
                dst.truncate(written);
                Ok(written)
            }
            Err(e) => {
                dst.clear();
                Err(FramedError::BlockEncode(e.to_string()))
            }
        }
    }

    fn decompressed_len(&self, encoded: &[u8]) -> Result<usize> {
        decompress_len(encoded).map_err(|e| FramedError::BlockDecode(e.to_string()))
    }

    fn decompress(&mut self, encoded: &[u8], dst: &mut Vec<u8>) -> Result<usize> {
        let expected = self.decompressed_len(encoded)?;
        dst.resize(expected, 0);

        match self.decoder.decompress(encoded, dst) {
            Ok(actual) if actual == expected => Ok(actual),
            Ok(actual) => {
                dst.clear();
                Err(FramedError::BlockDecode(format!(
                    "decompressed size mismatch: expected {}, got {}",
                    expected, actual
                )))
            }
            Err(e) => {
                dst.clear();
                Err(FramedError::BlockDecode(e.to_string()))
            }
        }
    }
}
