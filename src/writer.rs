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

//! Buffered writer for framed Snappy streams.
//!
//! Small writes compress poorly when each one becomes its own chunk.
//! [`FramedWriter`] collects input until a full block is available and only
//! then hands it to the [`ChunkEncoder`].

use std::io::{self, Read, Write};

use log::{debug, warn};

use crate::compression::{BlockCodec, SnappyCodec};
use crate::encoder::{ChunkEncoder, FramedWriterConfig};
use crate::error::{FramedError, Result};

/// Buffering writer for framed Snappy streams.
///
/// Data is accumulated in a block-sized buffer and encoded when the buffer
/// fills, on [`flush`](Self::flush), and on [`close`](Self::close). Callers
/// must flush or close once all data is written; dropping an open writer
/// makes a best-effort attempt to flush.
///
/// # Example
///
/// ```
/// use std::io::Write;
/// use snapframe::writer::FramedWriter;
///
/// let mut writer = FramedWriter::new(Vec::new());
/// writer.write_all(b"first line\n").unwrap();
/// writer.write_all(b"second line\n").unwrap();
/// writer.close().unwrap();
///
/// assert!(!writer.get_ref().is_empty());
/// ```
pub struct FramedWriter<Sink: Write, C: BlockCodec = SnappyCodec> {
    /// The encoder producing chunks.
    encoder: ChunkEncoder<Sink, C>,

    /// Raw bytes not yet encoded; never holds a full block between calls.
    buffer: Vec<u8>,
}

impl<Sink: Write> FramedWriter<Sink> {
    /// Creates a new FramedWriter with the Snappy codec and default configuration.
    pub fn new(sink: Sink) -> Self {
        Self::from_encoder(ChunkEncoder::new(sink))
    }

    /// Creates a new FramedWriter with the Snappy codec and custom configuration.
    pub fn with_config(sink: Sink, config: FramedWriterConfig) -> Result<Self> {
        Ok(Self::from_encoder(ChunkEncoder::with_config(sink, config)?))
    }
}

impl<Sink: Write, C: BlockCodec> FramedWriter<Sink, C> {
    /// Creates a new FramedWriter using the given block codec.
    pub fn with_codec(sink: Sink, codec: C, config: FramedWriterConfig) -> Result<Self> {
        Ok(Self::from_encoder(ChunkEncoder::with_codec(
            sink, codec, config,
        )?))
    }

    fn from_encoder(encoder: ChunkEncoder<Sink, C>) -> Self {
        let buffer = Vec::with_capacity(encoder.config().block_size);
        Self { encoder, buffer }
    }

    fn block_size(&self) -> usize {
        self.encoder.config().block_size
    }

    /// Returns the writer configuration.
    pub fn config(&self) -> &FramedWriterConfig {
        self.encoder.config()
    }

    /// Number of bytes buffered and not yet encoded.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Encodes and clears the internal buffer.
    fn encode_buffer(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let result = self.encoder.write_data(&self.buffer);
        self.buffer.clear();
        result.map(|_| ())
    }

    /// Buffers `data`, encoding every block that fills up.
    ///
    /// Returns `data.len()` on success. Errors are latched by the encoder
    /// and returned by every later call until [`reset`](Self::reset).
    pub fn write_data(&mut self, data: &[u8]) -> Result<usize> {
        self.encoder.check_open()?;

        let block_size = self.block_size();
        let mut rest = data;

        // Top up a partially filled buffer first.
        if !self.buffer.is_empty() {
            let take = rest.len().min(block_size - self.buffer.len());
            self.buffer.extend_from_slice(&rest[..take]);
            rest = &rest[take..];

            if self.buffer.len() < block_size {
                return Ok(data.len());
            }
            self.encode_buffer()?;
        }

        // Whole blocks skip the buffer.
        let direct = rest.len() - rest.len() % block_size;
        if direct > 0 {
            self.encoder.write_data(&rest[..direct])?;
            rest = &rest[direct..];
        }

        self.buffer.extend_from_slice(rest);
        Ok(data.len())
    }

    /// Reads `reader` to the end, encoding everything it yields.
    ///
    /// Returns the number of bytes read. Errors from `reader` are returned
    /// without latching; bytes read before the error stay buffered.
    pub fn read_from<R: Read + ?Sized>(&mut self, reader: &mut R) -> Result<u64> {
        self.encoder.check_open()?;

        let block_size = self.block_size();
        let mut total = 0u64;

        loop {
            if self.buffer.len() == block_size {
                self.encode_buffer()?;
            }

            // Read straight into the buffer, at most up to a full block.
            let filled = self.buffer.len();
            let limit = (block_size - filled) as u64;
            let result = (&mut *reader).take(limit).read_to_end(&mut self.buffer);
            total += (self.buffer.len() - filled) as u64;

            match result {
                Ok(0) => return Ok(total),
                Ok(_) => {}
                Err(e) => return Err(FramedError::from_io(e)),
            }
        }
    }

    /// Encodes any buffered bytes and flushes the sink.
    pub fn flush(&mut self) -> Result<()> {
        self.encoder.check_open()?;
        self.encode_buffer()?;
        self.encoder.flush()
    }

    /// Flushes all buffered data and closes the writer.
    ///
    /// After closing, every call fails with
    /// [`FramedError::WritingClosedStream`] until [`reset`](Self::reset).
    /// The sink itself is not closed.
    pub fn close(&mut self) -> Result<()> {
        self.encoder.check_open()?;
        self.encode_buffer()?;
        self.encoder.close()
    }

    /// Discards buffered data and any latched error and starts a new stream
    /// on `sink`.
    ///
    /// Allocated buffers are kept. Returns the previous sink.
    pub fn reset(&mut self, sink: Sink) -> Sink {
        if !self.buffer.is_empty() {
            debug!("Discarding {} buffered bytes on reset", self.buffer.len());
        }
        self.buffer.clear();
        self.encoder.reset(sink)
    }

    /// Returns a reference to the underlying sink.
    pub fn get_ref(&self) -> &Sink {
        self.encoder.get_ref()
    }

    /// Returns a mutable reference to the underlying sink.
    ///
    /// Writing to the sink directly will corrupt the stream.
    pub fn get_mut(&mut self) -> &mut Sink {
        self.encoder.get_mut()
    }
}

impl<Sink: Write, C: BlockCodec> Write for FramedWriter<Sink, C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_data(buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        FramedWriter::flush(self).map_err(io::Error::from)
    }
}

impl<Sink: Write, C: BlockCodec> Drop for FramedWriter<Sink, C> {
    fn drop(&mut self) {
        // Errors cannot be reported from drop.
        if !self.buffer.is_empty() && self.encoder.check_open().is_ok() {
            if let Err(e) = self.flush() {
                warn!("Failed to flush framed writer on drop: {}", e);
            }
        }
    }
}

// Methods for testing only
#[cfg(test)]
impl<Sink: Write, C: BlockCodec> FramedWriter<Sink, C> {
    /// Get a reference to the encoder (testing only)
    pub(crate) fn get_encoder(&self) -> &ChunkEncoder<Sink, C> {
        &self.encoder
    }

    /// Capacity of the input buffer (testing only)
    pub(crate) fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }
}
